//! 最小XDR编码
//!
//! 服务端代付只需要一种交易形态：单个Payment操作的TransactionV1Envelope。
//! 这里手写该子集的XDR编码（RFC 4506：定长大端整数，opaque按4字节对齐补零），
//! 不引入完整的Stellar SDK。

use sha2::{Digest, Sha256};

/// XDR写入器
pub struct XdrWriter {
    buf: Vec<u8>,
}

impl XdrWriter {
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    pub fn u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    pub fn u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    pub fn i64(&mut self, v: i64) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    /// 定长opaque（XDR规定定长数据本身已对齐时不补零；此处仅用于4/32字节字段）
    pub fn bytes_fixed(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    /// 变长opaque：长度前缀 + 数据 + 补零对齐到4字节
    pub fn var_opaque(&mut self, data: &[u8]) {
        self.u32(data.len() as u32);
        self.buf.extend_from_slice(data);
        let pad = (4 - data.len() % 4) % 4;
        self.buf.extend_from_slice(&[0u8; 3][..pad]);
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

impl Default for XdrWriter {
    fn default() -> Self {
        Self::new()
    }
}

// XDR联合体判别值（仅本交易形态用到的子集）
const KEY_TYPE_ED25519: u32 = 0;
const PUBLIC_KEY_TYPE_ED25519: u32 = 0;
const PRECOND_TIME: u32 = 1;
const MEMO_NONE: u32 = 0;
const OPERATION_PAYMENT: u32 = 1;
const ASSET_TYPE_NATIVE: u32 = 0;
const ASSET_TYPE_CREDIT_ALPHANUM4: u32 = 1;
const ENVELOPE_TYPE_TX: u32 = 2;

/// 支付资产
#[derive(Debug, Clone)]
pub enum Asset {
    Native,
    /// 四字符内的信用资产（USDC等），code右侧补零
    AlphaNum4 { code: [u8; 4], issuer: [u8; 32] },
}

impl Asset {
    /// 由符号与发行方构造（符号最长4字符）
    pub fn alphanum4(code: &str, issuer: [u8; 32]) -> Option<Self> {
        if code.is_empty() || code.len() > 4 {
            return None;
        }
        let mut buf = [0u8; 4];
        buf[..code.len()].copy_from_slice(code.as_bytes());
        Some(Asset::AlphaNum4 { code: buf, issuer })
    }

    fn encode(&self, w: &mut XdrWriter) {
        match self {
            Asset::Native => w.u32(ASSET_TYPE_NATIVE),
            Asset::AlphaNum4 { code, issuer } => {
                w.u32(ASSET_TYPE_CREDIT_ALPHANUM4);
                w.bytes_fixed(code);
                w.u32(PUBLIC_KEY_TYPE_ED25519);
                w.bytes_fixed(issuer);
            }
        }
    }
}

/// 单Payment操作的交易
#[derive(Debug, Clone)]
pub struct PaymentTransaction {
    pub source: [u8; 32],
    /// 网络基础费（stroops）
    pub fee: u32,
    pub sequence: i64,
    /// 时间窗下界（unix秒，0表示不限）
    pub min_time: u64,
    /// 时间窗上界
    pub max_time: u64,
    pub destination: [u8; 32],
    pub asset: Asset,
    /// 金额（stroops，7位小数基础单位）
    pub amount: i64,
}

impl PaymentTransaction {
    fn encode_muxed_account(w: &mut XdrWriter, key: &[u8; 32]) {
        w.u32(KEY_TYPE_ED25519);
        w.bytes_fixed(key);
    }

    /// 交易体XDR（不含envelope外壳）
    pub fn encode(&self) -> Vec<u8> {
        let mut w = XdrWriter::new();

        Self::encode_muxed_account(&mut w, &self.source);
        w.u32(self.fee);
        w.i64(self.sequence);

        // Preconditions: 仅时间窗
        w.u32(PRECOND_TIME);
        w.u64(self.min_time);
        w.u64(self.max_time);

        w.u32(MEMO_NONE);

        // operations<>
        w.u32(1);
        w.u32(0); // operation sourceAccount: 缺省（沿用交易source）
        w.u32(OPERATION_PAYMENT);
        Self::encode_muxed_account(&mut w, &self.destination);
        self.asset.encode(&mut w);
        w.i64(self.amount);

        // ext
        w.u32(0);

        w.into_bytes()
    }

    /// 签名载荷哈希：sha256(networkId ‖ ENVELOPE_TYPE_TX ‖ 交易XDR)
    pub fn signature_hash(&self, network_passphrase: &str) -> [u8; 32] {
        let network_id = Sha256::digest(network_passphrase.as_bytes());

        let mut payload = Vec::new();
        payload.extend_from_slice(&network_id);
        payload.extend_from_slice(&ENVELOPE_TYPE_TX.to_be_bytes());
        payload.extend_from_slice(&self.encode());

        Sha256::digest(&payload).into()
    }

    /// 带签名的envelope XDR
    ///
    /// hint为签名公钥的末4字节，signature为64字节ed25519签名
    pub fn envelope(&self, hint: [u8; 4], signature: &[u8; 64]) -> Vec<u8> {
        let mut w = XdrWriter::new();
        w.u32(ENVELOPE_TYPE_TX);
        w.bytes_fixed(&self.encode());

        // signatures<20>
        w.u32(1);
        w.bytes_fixed(&hint);
        w.var_opaque(signature);

        w.into_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tx() -> PaymentTransaction {
        PaymentTransaction {
            source: [1u8; 32],
            fee: 100,
            sequence: 42,
            min_time: 0,
            max_time: 1_700_000_030,
            destination: [2u8; 32],
            asset: Asset::alphanum4("USDC", [3u8; 32]).unwrap(),
            amount: 105_000_000,
        }
    }

    #[test]
    fn test_var_opaque_padding() {
        let mut w = XdrWriter::new();
        w.var_opaque(&[0xaa, 0xbb, 0xcc]);
        // 长度4字节 + 数据3字节 + 补零1字节
        assert_eq!(w.into_bytes(), vec![0, 0, 0, 3, 0xaa, 0xbb, 0xcc, 0]);
    }

    #[test]
    fn test_var_opaque_aligned_input_has_no_padding() {
        let mut w = XdrWriter::new();
        w.var_opaque(&[1, 2, 3, 4]);
        assert_eq!(w.into_bytes().len(), 8);
    }

    #[test]
    fn test_transaction_layout() {
        let encoded = sample_tx().encode();

        // source: key type + 32字节公钥
        assert_eq!(&encoded[..4], &[0, 0, 0, 0]);
        assert_eq!(&encoded[4..36], &[1u8; 32]);
        // fee
        assert_eq!(&encoded[36..40], &100u32.to_be_bytes());
        // sequence
        assert_eq!(&encoded[40..48], &42i64.to_be_bytes());
        // preconditions: PRECOND_TIME + timebounds
        assert_eq!(&encoded[48..52], &1u32.to_be_bytes());
        assert_eq!(&encoded[52..60], &0u64.to_be_bytes());
        assert_eq!(&encoded[60..68], &1_700_000_030u64.to_be_bytes());
        // memo none
        assert_eq!(&encoded[68..72], &0u32.to_be_bytes());
        // 一个操作
        assert_eq!(&encoded[72..76], &1u32.to_be_bytes());

        // 尾部：金额 + ext
        let n = encoded.len();
        assert_eq!(&encoded[n - 4..], &0u32.to_be_bytes());
        assert_eq!(&encoded[n - 12..n - 4], &105_000_000i64.to_be_bytes());
    }

    #[test]
    fn test_asset_code_padding() {
        let Asset::AlphaNum4 { code, .. } = Asset::alphanum4("XL", [0u8; 32]).unwrap() else {
            panic!("expected alphanum4");
        };
        assert_eq!(&code, b"XL\0\0");
        assert!(Asset::alphanum4("TOOLONG", [0u8; 32]).is_none());
        assert!(Asset::alphanum4("", [0u8; 32]).is_none());
    }

    #[test]
    fn test_signature_hash_depends_on_network() {
        let tx = sample_tx();
        let testnet = tx.signature_hash("Test SDF Network ; September 2015");
        let mainnet = tx.signature_hash("Public Global Stellar Network ; September 2015");
        assert_ne!(testnet, mainnet);
    }

    #[test]
    fn test_envelope_contains_signature() {
        let tx = sample_tx();
        let envelope = tx.envelope([9, 9, 9, 9], &[7u8; 64]);

        // 外壳：ENVELOPE_TYPE_TX
        assert_eq!(&envelope[..4], &2u32.to_be_bytes());
        // 交易体原样内嵌
        let tx_xdr = tx.encode();
        assert_eq!(&envelope[4..4 + tx_xdr.len()], &tx_xdr[..]);
        // 签名区：count=1, hint, len=64, signature
        let sig_region = &envelope[4 + tx_xdr.len()..];
        assert_eq!(&sig_region[..4], &1u32.to_be_bytes());
        assert_eq!(&sig_region[4..8], &[9, 9, 9, 9]);
        assert_eq!(&sig_region[8..12], &64u32.to_be_bytes());
        assert_eq!(&sig_region[12..], &[7u8; 64]);
    }
}
