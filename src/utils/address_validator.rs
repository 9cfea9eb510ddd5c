//! 地址验证模块
//!
//! 统一的按链家族地址验证逻辑，收款人解析与员工录入共用同一份实现

use crate::{domain::chain::ChainFamily, utils::strkey};

/// 地址验证器
pub struct AddressValidator;

impl AddressValidator {
    /// 按链家族验证地址格式
    pub fn validate(family: ChainFamily, address: &str) -> bool {
        match family {
            ChainFamily::Evm => Self::validate_evm_address(address),
            ChainFamily::Aptos => Self::validate_aptos_address(address),
            ChainFamily::Stellar => Self::validate_stellar_address(address),
        }
    }

    /// 验证EVM地址（支持EIP-55 Checksum）
    fn validate_evm_address(address: &str) -> bool {
        // 1. 基本格式检查
        if !address.starts_with("0x") {
            return false;
        }
        if address.len() != 42 {
            return false;
        }

        // 2. 验证hex字符
        let hex_part = &address[2..];
        if !hex_part.chars().all(|c| c.is_ascii_hexdigit()) {
            return false;
        }

        // 3. EIP-55 Checksum验证（仅当地址混用大小写时）
        let has_upper = hex_part.chars().any(|c| c.is_ascii_uppercase());
        let has_lower = hex_part.chars().any(|c| c.is_ascii_lowercase());
        if has_upper && has_lower {
            return Self::verify_eip55_checksum(address);
        }

        true
    }

    /// 验证EIP-55 Checksum
    /// https://eips.ethereum.org/EIPS/eip-55
    fn verify_eip55_checksum(address: &str) -> bool {
        use sha3::{Digest, Keccak256};

        let addr_lower = address[2..].to_lowercase();
        let mut hasher = Keccak256::new();
        hasher.update(addr_lower.as_bytes());
        let hash = hasher.finalize();

        for (i, ch) in address[2..].chars().enumerate() {
            if ch.is_alphabetic() {
                let hash_byte = hash[i / 2];
                let hash_nibble = if i % 2 == 0 {
                    hash_byte >> 4
                } else {
                    hash_byte & 0x0f
                };

                let should_be_uppercase = hash_nibble >= 8;
                if ch.is_uppercase() != should_be_uppercase {
                    return false;
                }
            }
        }

        true
    }

    /// 验证Aptos地址（0x前缀的hex，最长32字节。短地址按规范左侧补零）
    fn validate_aptos_address(address: &str) -> bool {
        let Some(hex_part) = address.strip_prefix("0x") else {
            return false;
        };
        if hex_part.is_empty() || hex_part.len() > 64 {
            return false;
        }
        hex_part.chars().all(|c| c.is_ascii_hexdigit())
    }

    /// 验证Stellar账户地址（'G'开头的ed25519公钥strkey，带checksum）
    fn validate_stellar_address(address: &str) -> bool {
        strkey::is_valid_account(address)
    }
}
