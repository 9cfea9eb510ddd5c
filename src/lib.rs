//! PayForge - 多链批量薪酬支付后端
//!
//! 非托管模式：后端负责校验、归一化与交易组装，签名始终由前端钱包完成；
//! 仅Stellar USDC代付路径使用服务账户签名。

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod service;
pub mod utils;

// 重新导出常用类型
pub use app_state::AppState;
pub use error::{AppError, AppErrorCode};

// 企业级标准：统一模块导出
pub mod prelude {
    pub use crate::{
        app_state::AppState,
        domain::{Chain, ChainFamily, ChainRegistry, Recipient, Token, TransferRequest},
        error::{AppError, AppErrorCode},
    };
}
