//! 通用工具模块

pub mod address_validator;
pub mod strkey;
