//! 基础设施模块

pub mod log_redact;
