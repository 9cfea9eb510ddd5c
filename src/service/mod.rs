//! 业务服务层

pub mod allowance_gate;
pub mod amount_normalizer;
pub mod broadcaster;
pub mod employee_service;
pub mod notification_service;
pub mod payroll_service;
pub mod recipient_parser;
pub mod stellar;
pub mod transfer_assembler;
