//! Horizon REST客户端
//!
//! 服务端代付路径需要的三个调用：账户序列号、网络基础费、提交envelope

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;

/// 提交结果
#[derive(Debug, Clone)]
pub struct SubmitOutcome {
    pub hash: String,
    pub ledger: i64,
}

/// Horizon客户端
pub struct HorizonClient {
    base_url: String,
    http_client: reqwest::Client,
}

#[derive(Deserialize)]
struct AccountResponse {
    sequence: String,
}

#[derive(Deserialize)]
struct FeeStatsResponse {
    last_ledger_base_fee: String,
}

#[derive(Deserialize)]
struct SubmitResponse {
    hash: String,
    ledger: i64,
}

impl HorizonClient {
    pub fn new(base_url: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http_client: client,
        }
    }

    /// 查询账户当前序列号
    pub async fn load_sequence(&self, account_id: &str) -> Result<i64> {
        let url = format!("{}/accounts/{}", self.base_url, account_id);
        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .context("Horizon account request failed")?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "Horizon account lookup returned {}",
                response.status()
            ));
        }

        let account: AccountResponse = response
            .json()
            .await
            .context("Malformed Horizon account response")?;
        account
            .sequence
            .parse::<i64>()
            .context("Non-numeric account sequence")
    }

    /// 当前网络基础费（stroops）。查询失败时回退到协议最小值100
    pub async fn fetch_base_fee(&self) -> u32 {
        let url = format!("{}/fee_stats", self.base_url);
        let result = async {
            let response = self.http_client.get(&url).send().await?;
            let stats: FeeStatsResponse = response.json().await?;
            stats.last_ledger_base_fee.parse::<u32>().map_err(|e| anyhow!(e))
        }
        .await;

        match result {
            Ok(fee) => fee,
            Err(e) => {
                tracing::warn!(error = %e, "Falling back to minimum base fee");
                100
            }
        }
    }

    /// 提交base64编码的已签名envelope
    pub async fn submit(&self, envelope_b64: &str) -> Result<SubmitOutcome> {
        let url = format!("{}/transactions", self.base_url);
        let response = self
            .http_client
            .post(&url)
            .form(&[("tx", envelope_b64)])
            .send()
            .await
            .context("Horizon submit request failed")?;

        let status = response.status();
        let body: serde_json::Value = response
            .json()
            .await
            .context("Malformed Horizon submit response")?;

        if !status.is_success() {
            // Horizon把失败原因放在extras.result_codes里
            let codes = body
                .pointer("/extras/result_codes")
                .map(|c| c.to_string())
                .unwrap_or_else(|| "no result codes".to_string());
            return Err(anyhow!("Transaction submission failed: {}", codes));
        }

        let submitted: SubmitResponse =
            serde_json::from_value(body).context("Malformed Horizon submit response")?;
        Ok(SubmitOutcome {
            hash: submitted.hash,
            ledger: submitted.ledger,
        })
    }
}
