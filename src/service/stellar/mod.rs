//! Stellar服务端代付
//!
//! 唯一由服务账户签名的特权路径：经典Payment操作发放USDC。
//! 服务账户密钥只存在于进程环境中，日志全程脱敏。

pub mod horizon;
pub mod xdr;

use chrono::Utc;
use ed25519_dalek::{Signer, SigningKey};
use ethers::types::U256;
use serde::Serialize;

use crate::{
    config::StellarConfig,
    error::AppError,
    infrastructure::log_redact,
    service::{
        amount_normalizer::AmountNormalizer,
        stellar::{
            horizon::HorizonClient,
            xdr::{Asset, PaymentTransaction},
        },
    },
    utils::strkey::{self, StrkeyVersion},
};

/// Stellar金额固定7位小数（stroops）
const STELLAR_DECIMALS: u32 = 7;
/// 交易时间窗（秒），超时未上账则失效
const TX_TIMEOUT_SECS: u64 = 30;

/// 代付结果
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct UsdcPayout {
    pub hash: String,
    pub ledger: i64,
}

/// Stellar代付服务
pub struct StellarPayoutService {
    config: StellarConfig,
    horizon: HorizonClient,
}

impl StellarPayoutService {
    pub fn new(config: StellarConfig) -> Self {
        let horizon = HorizonClient::new(&config.horizon_url);
        Self { config, horizon }
    }

    /// 服务账户签名密钥；公钥必须与配置的服务地址一致
    fn service_keypair(&self) -> Result<SigningKey, AppError> {
        if self.config.service_secret.is_empty()
            || self.config.service_address.is_empty()
            || self.config.usdc_issuer.is_empty()
        {
            return Err(AppError::internal(
                "Missing required Stellar configuration (service secret/address/issuer)",
            ));
        }

        let seed = strkey::decode(StrkeyVersion::SecretSeed, &self.config.service_secret)
            .map_err(|_| AppError::internal("Malformed Stellar service secret seed"))?;
        let signing_key = SigningKey::from_bytes(&seed);

        let derived =
            strkey::encode(StrkeyVersion::PublicKey, &signing_key.verifying_key().to_bytes());
        if derived != self.config.service_address {
            return Err(AppError::internal(
                "Stellar service secret does not match configured service address",
            ));
        }
        Ok(signing_key)
    }

    /// 发送服务端签名的USDC支付
    pub async fn send_usdc(&self, recipient: &str, amount: &str) -> Result<UsdcPayout, AppError> {
        tracing::info!(
            recipient = %log_redact::redact_address(recipient),
            "Starting USDC transfer"
        );

        // 1. 凭据与输入
        let signing_key = self.service_keypair()?;
        let destination = strkey::decode(StrkeyVersion::PublicKey, recipient).map_err(|_| {
            AppError::invalid_address(format!("Invalid Stellar recipient: {}", recipient))
        })?;
        let issuer = strkey::decode(StrkeyVersion::PublicKey, &self.config.usdc_issuer)
            .map_err(|_| AppError::internal("Malformed USDC issuer account"))?;

        let units = AmountNormalizer::to_base_units(amount, STELLAR_DECIMALS)?;
        if units > U256::from(i64::MAX as u64) {
            return Err(AppError::amount_overflow(
                "Amount exceeds the i64 stroop range of a classic payment",
            ));
        }
        let stroops = units.as_u64() as i64;

        // 2. 账户序列号与网络基础费
        let sequence = self
            .horizon
            .load_sequence(&self.config.service_address)
            .await
            .map_err(|e| AppError::rpc_error(format!("Failed to load service account: {}", e)))?;
        let fee = self.horizon.fetch_base_fee().await;
        tracing::debug!(sequence, fee, "Service account loaded");

        // 3. 构建Payment交易（30秒时间窗）
        let asset = Asset::alphanum4("USDC", issuer)
            .ok_or_else(|| AppError::internal("Failed to build USDC asset"))?;
        let now = Utc::now().timestamp() as u64;
        let tx = PaymentTransaction {
            source: signing_key.verifying_key().to_bytes(),
            fee,
            sequence: sequence + 1,
            min_time: 0,
            max_time: now + TX_TIMEOUT_SECS,
            destination,
            asset,
            amount: stroops,
        };

        // 4. 签名并提交
        let hash = tx.signature_hash(&self.config.network_passphrase);
        let signature = signing_key.sign(&hash);
        let public = signing_key.verifying_key().to_bytes();
        let hint = [public[28], public[29], public[30], public[31]];
        let envelope = tx.envelope(hint, &signature.to_bytes());

        use base64::Engine as _;
        let envelope_b64 = base64::engine::general_purpose::STANDARD.encode(envelope);

        let outcome = self
            .horizon
            .submit(&envelope_b64)
            .await
            .map_err(|e| AppError::broadcast_failed(format!("Transfer failed: {}", e)))?;

        tracing::info!(
            hash = %outcome.hash,
            ledger = outcome.ledger,
            "USDC transfer succeeded"
        );
        Ok(UsdcPayout {
            hash: outcome.hash,
            ledger: outcome.ledger,
        })
    }
}
