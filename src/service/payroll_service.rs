//! 批量发薪编排服务
//!
//! 串起完整管线：链解析 → 收款人解析校验 → 金额归一化 →
//! 授权闸门（仅EVM ERC20路径）→ 交易组装 → gas估算。
//! 产出的待签名交易交给外部钱包签名，本服务不触碰任何私钥。

use std::sync::Arc;

use ethers::types::U256;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    domain::{
        chain::{Chain, ChainFamily, ChainRegistry, Token},
        transfer::TransferRequest,
    },
    error::AppError,
    service::{
        allowance_gate::{AllowanceCheck, AllowanceGate},
        amount_normalizer::AmountNormalizer,
        broadcaster::Broadcaster,
        employee_service::EmployeeStore,
        notification_service::NotificationCenter,
        recipient_parser::RecipientListParser,
        transfer_assembler::{AssembleContext, SignableTransaction, TransferAssembler},
    },
};

/// 收款人来源：自由文本或员工选择，二选一
#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
#[serde(untagged)]
pub enum RecipientSource {
    /// 两个逗号分隔列表，按位置配对
    FreeText {
        recipients_text: String,
        amounts_text: String,
    },
    /// 员工ID列表，地址与薪资取自员工档案
    Employees { employee_ids: Vec<Uuid> },
}

/// 发薪准备输入
#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
pub struct PrepareInput {
    /// 注册表链键
    pub chain_key: String,
    /// 代币符号；缺省用该链的默认代币
    #[serde(default)]
    pub token_symbol: Option<String>,
    /// 付款方地址
    pub sender: String,
    /// 钱包上报的网络名（Aptos路径校验用）
    #[serde(default)]
    pub wallet_network: Option<String>,
    #[serde(flatten)]
    pub source: RecipientSource,
}

/// 发薪准备结果
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct PrepareOutcome {
    pub chain_key: String,
    pub token_symbol: String,
    /// 收款人数
    pub recipient_count: usize,
    /// 基础单位合计（十进制字符串）
    pub aggregate: String,
    /// 授权检查结果（仅EVM ERC20路径）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowance: Option<AllowanceCheck>,
    /// 待签名交易；需要先授权时缺省
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction: Option<SignableTransaction>,
}

/// 发薪编排服务
pub struct PayrollService {
    registry: Arc<ChainRegistry>,
    notifications: Arc<NotificationCenter>,
    employees: Arc<EmployeeStore>,
    allowance_gate: AllowanceGate,
    broadcaster: Broadcaster,
}

impl PayrollService {
    pub fn new(
        registry: Arc<ChainRegistry>,
        notifications: Arc<NotificationCenter>,
        employees: Arc<EmployeeStore>,
    ) -> Self {
        let allowance_gate = AllowanceGate::new(Arc::clone(&notifications));
        Self {
            registry,
            notifications,
            employees,
            allowance_gate,
            broadcaster: Broadcaster::new(),
        }
    }

    fn resolve_token<'a>(
        &self,
        chain: &'a Chain,
        symbol: &Option<String>,
    ) -> Result<&'a Token, AppError> {
        match symbol {
            Some(s) => chain.token(s),
            None => Ok(self.registry.default_token(chain)),
        }
    }

    /// 构建不可变的转账请求（解析 → 校验 → 归一化）
    async fn build_request(
        &self,
        chain: &Chain,
        token: &Token,
        source: &RecipientSource,
    ) -> Result<TransferRequest, AppError> {
        let recipients = match source {
            RecipientSource::FreeText {
                recipients_text,
                amounts_text,
            } => RecipientListParser::parse_free_text(chain, recipients_text, amounts_text)?,
            RecipientSource::Employees { employee_ids } => {
                let selected = self.employees.select(employee_ids).await?;
                RecipientListParser::from_employees(chain, selected)?
            }
        };

        let amounts: Vec<String> = recipients.iter().map(|r| r.amount.clone()).collect();
        let (normalized_amounts, aggregate) =
            AmountNormalizer::normalize_all(&amounts, token.decimals)?;

        Ok(TransferRequest {
            chain_key: chain.key.clone(),
            token: token.clone(),
            recipients,
            normalized_amounts,
            aggregate,
        })
    }

    /// 准备一次批量转账
    ///
    /// 失败时输入原样保留在调用方，重试即重新提交同一份输入。
    /// EVM ERC20路径若授权不足，返回待签名的approve交易并止步；
    /// 调用方在approve确认后（`await_approval`）重新prepare。
    pub async fn prepare(&self, input: PrepareInput) -> Result<PrepareOutcome, AppError> {
        let chain = self.registry.get(&input.chain_key)?;
        let token = self.resolve_token(chain, &input.token_symbol)?;

        let result = self.prepare_inner(chain, token, &input).await;
        if let Err(e) = &result {
            self.notifications.error(e.message.clone()).await;
        }
        result
    }

    async fn prepare_inner(
        &self,
        chain: &Chain,
        token: &Token,
        input: &PrepareInput,
    ) -> Result<PrepareOutcome, AppError> {
        let request = self.build_request(chain, token, &input.source).await?;
        tracing::info!(
            chain = %chain.key,
            token = %token.symbol,
            recipients = request.recipients.len(),
            aggregate = %request.aggregate,
            "Transfer request built"
        );

        // EVM的ERC20路径先过授权闸门；原生币与非EVM家族直接组装
        let mut allowance = None;
        if chain.family == ChainFamily::Evm && !request.is_native(chain) {
            let check = self
                .allowance_gate
                .check(chain, &input.sender, &token.address, request.aggregate)
                .await?;
            if check.approval_needed {
                self.notifications
                    .info("Token approval required before transfer")
                    .await;
                return Ok(PrepareOutcome {
                    chain_key: chain.key.clone(),
                    token_symbol: token.symbol.clone(),
                    recipient_count: request.recipients.len(),
                    aggregate: request.aggregate.to_string(),
                    allowance: Some(check),
                    transaction: None,
                });
            }
            allowance = Some(check);
        }

        let ctx = AssembleContext {
            sender: input.sender.clone(),
            wallet_network: input.wallet_network.clone(),
        };
        let mut transaction = TransferAssembler::assemble(chain, &request, &ctx)?;

        // EVM交易补上gas上限（估算值翻倍）
        if let SignableTransaction::Evm(tx) = &mut transaction {
            let gas = TransferAssembler::estimate_gas(chain, tx, &input.sender).await?;
            tx.gas_limit = Some(gas.to_string());
        }

        self.notifications
            .success(format!(
                "Transaction ready: {} recipient(s) on {}",
                request.recipients.len(),
                chain.name
            ))
            .await;

        Ok(PrepareOutcome {
            chain_key: chain.key.clone(),
            token_symbol: token.symbol.clone(),
            recipient_count: request.recipients.len(),
            aggregate: request.aggregate.to_string(),
            allowance,
            transaction: Some(transaction),
        })
    }

    /// 等待approve交易确认并复核授权额度
    pub async fn await_approval(
        &self,
        chain_key: &str,
        tx_hash: &str,
        owner: &str,
        token_symbol: &Option<String>,
        required_total: &str,
    ) -> Result<(), AppError> {
        let chain = self.registry.get(chain_key)?;
        let token = self.resolve_token(chain, token_symbol)?;
        let required = U256::from_dec_str(required_total)
            .map_err(|_| AppError::invalid_amount("Malformed required total"))?;
        self.allowance_gate
            .await_approval(chain, tx_hash, owner, &token.address, required)
            .await
    }

    /// 广播外部签名完成的EVM裸交易
    pub async fn broadcast(&self, chain_key: &str, signed_raw_tx: &str) -> Result<String, AppError> {
        let chain = self.registry.get(chain_key)?;
        let result = self.broadcaster.broadcast_evm(chain, signed_raw_tx).await;
        match &result {
            Ok(hash) => {
                self.notifications
                    .success(format!("Transaction broadcast: {}", hash))
                    .await;
            }
            Err(e) => {
                self.notifications.error(e.message.clone()).await;
            }
        }
        result
    }
}
