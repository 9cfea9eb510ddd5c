//! 领域模型

pub mod chain;
pub mod transfer;

pub use chain::{
    Chain, ChainFamily, ChainRegistry, NetworkRef, Token, NATIVE_TOKEN_ADDRESS,
    STELLAR_BULK_WASM_HASH,
};
pub use transfer::{
    Recipient, TransferRequest, ValidationField, ValidationIssue, ValidationReport,
};
