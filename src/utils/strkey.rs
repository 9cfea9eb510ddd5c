//! Stellar strkey编解码
//!
//! strkey = 版本字节 + 32字节负载 + CRC16-XModem校验，整体RFC4648 base32编码
//! （无填充，固定56字符）。G=账户公钥，S=密钥种子，C=Soroban合约。

use anyhow::{anyhow, bail, Result};

const BASE32_ALPHABET: &[u8; 32] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ234567";

/// strkey版本字节
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrkeyVersion {
    /// 'G' - ed25519账户公钥
    PublicKey,
    /// 'S' - ed25519密钥种子
    SecretSeed,
    /// 'C' - Soroban合约ID
    Contract,
}

impl StrkeyVersion {
    fn byte(self) -> u8 {
        match self {
            StrkeyVersion::PublicKey => 6 << 3,  // 'G'
            StrkeyVersion::SecretSeed => 18 << 3, // 'S'
            StrkeyVersion::Contract => 2 << 3,    // 'C'
        }
    }
}

/// CRC16-XModem（多项式0x1021，初始值0）
fn crc16_xmodem(data: &[u8]) -> u16 {
    let mut crc: u16 = 0;
    for &byte in data {
        crc ^= (byte as u16) << 8;
        for _ in 0..8 {
            if crc & 0x8000 != 0 {
                crc = (crc << 1) ^ 0x1021;
            } else {
                crc <<= 1;
            }
        }
    }
    crc
}

fn base32_encode(data: &[u8]) -> String {
    let mut out = String::with_capacity((data.len() * 8 + 4) / 5);
    let mut buffer: u32 = 0;
    let mut bits = 0u32;
    for &byte in data {
        buffer = (buffer << 8) | byte as u32;
        bits += 8;
        while bits >= 5 {
            bits -= 5;
            out.push(BASE32_ALPHABET[((buffer >> bits) & 0x1f) as usize] as char);
        }
    }
    if bits > 0 {
        out.push(BASE32_ALPHABET[((buffer << (5 - bits)) & 0x1f) as usize] as char);
    }
    out
}

fn base32_decode(s: &str) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(s.len() * 5 / 8);
    let mut buffer: u32 = 0;
    let mut bits = 0u32;
    for c in s.bytes() {
        let value = BASE32_ALPHABET
            .iter()
            .position(|&a| a == c)
            .ok_or_else(|| anyhow!("Invalid base32 character: {}", c as char))?;
        buffer = (buffer << 5) | value as u32;
        bits += 5;
        if bits >= 8 {
            bits -= 8;
            out.push(((buffer >> bits) & 0xff) as u8);
        }
    }
    // 残余bit必须为0，否则不是规范编码
    if bits > 0 && (buffer & ((1 << bits) - 1)) != 0 {
        bail!("Non-canonical base32 trailing bits");
    }
    Ok(out)
}

/// 编码32字节负载为strkey
pub fn encode(version: StrkeyVersion, payload: &[u8; 32]) -> String {
    let mut data = Vec::with_capacity(35);
    data.push(version.byte());
    data.extend_from_slice(payload);
    let crc = crc16_xmodem(&data);
    data.push((crc & 0xff) as u8);
    data.push((crc >> 8) as u8);
    base32_encode(&data)
}

/// 解码strkey，校验版本字节与checksum，返回32字节负载
pub fn decode(version: StrkeyVersion, s: &str) -> Result<[u8; 32]> {
    if s.len() != 56 {
        bail!("Invalid strkey length: {}", s.len());
    }
    let data = base32_decode(s)?;
    if data.len() != 35 {
        bail!("Invalid strkey payload length: {}", data.len());
    }
    if data[0] != version.byte() {
        bail!("Unexpected strkey version byte: {:#04x}", data[0]);
    }
    let expected = crc16_xmodem(&data[..33]);
    let actual = (data[33] as u16) | ((data[34] as u16) << 8);
    if expected != actual {
        bail!("Strkey checksum mismatch");
    }
    let mut payload = [0u8; 32];
    payload.copy_from_slice(&data[1..33]);
    Ok(payload)
}

/// 是否为合法的'G'账户地址
pub fn is_valid_account(s: &str) -> bool {
    decode(StrkeyVersion::PublicKey, s).is_ok()
}

/// 是否为合法的'C'合约ID
pub fn is_valid_contract(s: &str) -> bool {
    decode(StrkeyVersion::Contract, s).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_all_versions() {
        let payload: [u8; 32] = core::array::from_fn(|i| i as u8);
        for version in [
            StrkeyVersion::PublicKey,
            StrkeyVersion::SecretSeed,
            StrkeyVersion::Contract,
        ] {
            let encoded = encode(version, &payload);
            assert_eq!(encoded.len(), 56);
            assert_eq!(decode(version, &encoded).unwrap(), payload);
        }
    }

    #[test]
    fn test_version_prefix_characters() {
        let payload = [0u8; 32];
        assert!(encode(StrkeyVersion::PublicKey, &payload).starts_with('G'));
        assert!(encode(StrkeyVersion::SecretSeed, &payload).starts_with('S'));
        assert!(encode(StrkeyVersion::Contract, &payload).starts_with('C'));
    }

    #[test]
    fn test_checksum_detects_corruption() {
        let encoded = encode(StrkeyVersion::PublicKey, &[7u8; 32]);
        // 翻转中间一个字符
        let mut corrupted: Vec<char> = encoded.chars().collect();
        corrupted[30] = if corrupted[30] == 'A' { 'B' } else { 'A' };
        let corrupted: String = corrupted.into_iter().collect();
        assert!(decode(StrkeyVersion::PublicKey, &corrupted).is_err());
    }

    #[test]
    fn test_wrong_version_rejected() {
        let encoded = encode(StrkeyVersion::SecretSeed, &[1u8; 32]);
        assert!(decode(StrkeyVersion::PublicKey, &encoded).is_err());
    }

    #[test]
    fn test_invalid_inputs_rejected() {
        assert!(!is_valid_account(""));
        assert!(!is_valid_account("GABC"));
        // 含非base32字符（'1'不在字母表中）
        assert!(!is_valid_account(&"1".repeat(56)));
    }

    #[test]
    fn test_production_contract_ids_decode() {
        // 部署目录里的真实Soroban合约ID
        assert!(is_valid_contract(
            "CAAX52OHYPSYCUFTEO4FHQL345SYQD6D7JAGSPOFNMXXQJXO6DAHN3QR"
        ));
        assert!(is_valid_contract(
            "CBIELTK6YBZJU5UP2WWQEUCYKLPU6AUNZ2BQ4WWFEIE3USCIHMXQDAMA"
        ));
    }

    #[test]
    fn test_crc16_xmodem_vector() {
        // 标准CRC16/XMODEM测试向量："123456789" -> 0x31C3
        assert_eq!(crc16_xmodem(b"123456789"), 0x31c3);
    }
}
