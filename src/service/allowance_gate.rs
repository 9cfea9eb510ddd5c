//! ERC20授权闸门（仅EVM路径）
//!
//! 批量转账前先核对链上余额与授权额度。后端不持有EVM私钥，
//! 授权交易只组装不签名，由付款方钱包签名后回传等待确认。
//! 原生币转账完全跳过本组件，合计金额直接挂到交易value。

use std::{str::FromStr, sync::Arc, time::Duration};

use ethers::{
    prelude::abigen,
    providers::{Http, Middleware, Provider},
    types::{Address, H256, U256},
    utils::to_checksum,
};
use serde::Serialize;

use crate::{
    domain::chain::Chain,
    error::AppError,
    infrastructure::log_redact,
    service::{notification_service::NotificationCenter, transfer_assembler::PreparedEvmTransaction},
};

abigen!(
    Erc20,
    r#"[
        function balanceOf(address account) view returns (uint256)
        function allowance(address owner, address spender) view returns (uint256)
        function approve(address spender, uint256 amount) returns (bool)
        function decimals() view returns (uint8)
    ]"#
);

/// 授权确认轮询间隔与上限
const RECEIPT_POLL_INTERVAL_MS: u64 = 2000;
const RECEIPT_POLL_ATTEMPTS: u32 = 60;

/// 余额与授权额度的判定，与RPC拉取解耦
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// 余额与授权均覆盖合计，可直接组装转账
    Proceed,
    /// 余额足够但授权不足，需要先提交approve
    ApprovalNeeded,
    /// 余额不足，终止流程
    InsufficientBalance,
}

/// 余额不足优先于授权不足，余额不够时绝不继续
pub fn gate_decision(balance: U256, allowance: U256, required_total: U256) -> GateDecision {
    if balance < required_total {
        GateDecision::InsufficientBalance
    } else if allowance < required_total {
        GateDecision::ApprovalNeeded
    } else {
        GateDecision::Proceed
    }
}

/// 授权检查结果
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct AllowanceCheck {
    /// 是否需要先提交授权交易
    pub approval_needed: bool,
    /// 当前链上余额（基础单位，十进制字符串）
    pub balance: String,
    /// 当前授权额度（基础单位，十进制字符串）
    pub allowance: String,
    /// 待签名的approve交易（approval_needed时给出）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approval_tx: Option<PreparedEvmTransaction>,
}

/// 授权闸门
pub struct AllowanceGate {
    notifications: Arc<NotificationCenter>,
}

impl AllowanceGate {
    pub fn new(notifications: Arc<NotificationCenter>) -> Self {
        Self { notifications }
    }

    /// 核对余额与授权额度
    ///
    /// `balance < required_total` → InsufficientBalance，绝不继续组装转账；
    /// `allowance < required_total` → 返回待签名的approve(spender, required_total)。
    /// 各阶段状态经NotificationState上报（checking → approving → approved）。
    pub async fn check(
        &self,
        chain: &Chain,
        owner: &str,
        token_address: &str,
        required_total: U256,
    ) -> Result<AllowanceCheck, AppError> {
        let chain_id = chain
            .evm_chain_id()
            .ok_or_else(|| AppError::internal("Allowance gate invoked for non-EVM chain"))?;
        let owner_addr = Address::from_str(owner)
            .map_err(|_| AppError::bad_request(format!("Invalid payer address: {}", owner)))?;
        let token_addr = Address::from_str(token_address).map_err(|_| {
            AppError::bad_request(format!("Invalid token address: {}", token_address))
        })?;
        let spender = Address::from_str(&chain.settlement_contract).map_err(|_| {
            AppError::internal(format!(
                "Malformed settlement contract address on chain {}",
                chain.key
            ))
        })?;

        self.notifications
            .info("Checking balance and allowance...")
            .await;

        let provider = Provider::<Http>::try_from(chain.rpc_url.as_str())
            .map_err(|e| AppError::rpc_error(format!("Invalid RPC endpoint: {}", e)))?;
        let erc20 = Erc20::new(token_addr, Arc::new(provider));

        let balance = erc20
            .balance_of(owner_addr)
            .call()
            .await
            .map_err(|e| AppError::rpc_error(format!("balanceOf query failed: {}", e)))?;

        let allowance = erc20
            .allowance(owner_addr, spender)
            .call()
            .await
            .map_err(|e| AppError::rpc_error(format!("allowance query failed: {}", e)))?;

        match gate_decision(balance, allowance, required_total) {
            GateDecision::InsufficientBalance => {
                let message = format!(
                    "Insufficient balance: have {}, need {}",
                    balance, required_total
                );
                self.notifications.error(message.clone()).await;
                return Err(AppError::insufficient_balance(message));
            }
            GateDecision::Proceed => {
                tracing::debug!(
                    owner = %log_redact::redact_address(owner),
                    %allowance,
                    %required_total,
                    "Existing allowance is sufficient"
                );
                return Ok(AllowanceCheck {
                    approval_needed: false,
                    balance: balance.to_string(),
                    allowance: allowance.to_string(),
                    approval_tx: None,
                });
            }
            GateDecision::ApprovalNeeded => {}
        }

        // 组装待签名的approve调用
        let call = erc20.approve(spender, required_total);
        let data = call
            .calldata()
            .ok_or_else(|| AppError::internal("Failed to encode approve calldata"))?;

        self.notifications
            .info(format!(
                "Approval required for {} base units, waiting for wallet signature",
                required_total
            ))
            .await;

        Ok(AllowanceCheck {
            approval_needed: true,
            balance: balance.to_string(),
            allowance: allowance.to_string(),
            approval_tx: Some(PreparedEvmTransaction {
                to: to_checksum(&token_addr, None),
                data: format!("0x{}", hex::encode(data.as_ref())),
                value: "0".to_string(),
                gas_limit: None,
                chain_id,
            }),
        })
    }

    /// 阻塞等待已签名的授权交易确认，随后复核授权额度
    ///
    /// 确认超时→Timeout；交易revert→BroadcastFailed；
    /// 复核仍不足→InsufficientAllowance
    pub async fn await_approval(
        &self,
        chain: &Chain,
        tx_hash: &str,
        owner: &str,
        token_address: &str,
        required_total: U256,
    ) -> Result<(), AppError> {
        let hash = H256::from_str(tx_hash)
            .map_err(|_| AppError::bad_request(format!("Invalid transaction hash: {}", tx_hash)))?;
        let provider = Provider::<Http>::try_from(chain.rpc_url.as_str())
            .map_err(|e| AppError::rpc_error(format!("Invalid RPC endpoint: {}", e)))?;

        self.notifications
            .info("Waiting for approval confirmation...")
            .await;

        let mut confirmed = false;
        for _ in 0..RECEIPT_POLL_ATTEMPTS {
            match provider.get_transaction_receipt(hash).await {
                Ok(Some(receipt)) => {
                    if receipt.status == Some(1u64.into()) {
                        confirmed = true;
                        break;
                    }
                    let message = "Approval transaction reverted on-chain".to_string();
                    self.notifications.error(message.clone()).await;
                    return Err(AppError::broadcast_failed(message));
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(error = %e, "Receipt poll failed, retrying");
                }
            }
            tokio::time::sleep(Duration::from_millis(RECEIPT_POLL_INTERVAL_MS)).await;
        }

        if !confirmed {
            let message = "Timed out waiting for approval confirmation".to_string();
            self.notifications.error(message.clone()).await;
            return Err(AppError::timeout(message));
        }

        // 复核：授权额度必须已覆盖所需合计
        let check = self.check(chain, owner, token_address, required_total).await?;
        if check.approval_needed {
            return Err(AppError::insufficient_allowance(format!(
                "Allowance still insufficient after approval: {} < {}",
                check.allowance, required_total
            )));
        }

        self.notifications
            .success("Token allowance approved")
            .await;
        Ok(())
    }
}
