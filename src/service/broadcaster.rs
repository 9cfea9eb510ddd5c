//! 已签名交易广播（EVM路径）
//!
//! 钱包签名后的原始交易经此单次提交到链上RPC。
//! 不做自动重试：广播失败原样上报，由用户决定是否重新提交。
//! Aptos/Stellar路径由钱包自行提交，不经过这里。

use std::time::Duration;

use serde_json::json;

use crate::{domain::chain::Chain, error::AppError, infrastructure::log_redact};

/// 交易广播器
pub struct Broadcaster {
    http_client: reqwest::Client,
}

impl Broadcaster {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            http_client: client,
        }
    }

    /// 广播0x前缀的已签名EVM交易，返回交易哈希
    pub async fn broadcast_evm(
        &self,
        chain: &Chain,
        signed_raw_tx: &str,
    ) -> Result<String, AppError> {
        if chain.evm_chain_id().is_none() {
            return Err(AppError::internal("EVM broadcast invoked for non-EVM chain"));
        }
        let trimmed = signed_raw_tx.trim();
        if !trimmed.starts_with("0x")
            || trimmed.len() <= 2
            || !trimmed[2..].chars().all(|c| c.is_ascii_hexdigit())
        {
            return Err(AppError::bad_request(
                "signed_raw_tx must be a 0x-prefixed hex string",
            ));
        }

        tracing::info!(
            chain = %chain.key,
            raw_tx = %log_redact::redact_signed_tx(trimmed),
            "Broadcasting signed transaction"
        );

        let body = json!({
            "jsonrpc": "2.0",
            "method": "eth_sendRawTransaction",
            "params": [trimmed],
            "id": 1,
        });

        let response = self
            .http_client
            .post(&chain.rpc_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::broadcast_failed(format!("RPC request failed: {}", e)))?;

        let payload: serde_json::Value = response
            .json()
            .await
            .map_err(|e| AppError::broadcast_failed(format!("Malformed RPC response: {}", e)))?;

        if let Some(error) = payload.get("error") {
            let message = error
                .get("message")
                .and_then(|m| m.as_str())
                .unwrap_or("unknown RPC error");
            return Err(AppError::broadcast_failed(format!(
                "Transaction rejected: {}",
                message
            )));
        }

        payload
            .get("result")
            .and_then(|r| r.as_str())
            .map(str::to_string)
            .ok_or_else(|| AppError::broadcast_failed("RPC response missing transaction hash"))
    }
}

impl Default for Broadcaster {
    fn default() -> Self {
        Self::new()
    }
}
