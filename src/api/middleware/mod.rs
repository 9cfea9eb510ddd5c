//! API 中间件

pub mod auth;
pub mod trace_id;

pub use auth::auth_middleware;
pub use trace_id::trace_id_middleware;
