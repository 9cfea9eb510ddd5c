//! 统一交易组装器
//!
//! 三条互斥的链家族路径共享同一个概念上的批量结算合约：
//! EVM `bulkTransfer`、Aptos `bulk_payroll::bulk_transfer`、
//! Soroban `bulk_transfer`。按Chain声明的family做标签分发，
//! 不在上层堆链条件分支。组装产物交由外部签名方（浏览器钱包）签名。

use std::{str::FromStr, sync::Arc};

use ethers::{
    prelude::abigen,
    providers::{Http, Middleware, Provider},
    types::{transaction::eip2718::TypedTransaction, Address, TransactionRequest, U256},
    utils::to_checksum,
};
use serde::Serialize;
use serde_json::json;

use crate::{
    domain::{
        chain::{Chain, ChainFamily, NetworkRef, STELLAR_BULK_WASM_HASH},
        transfer::TransferRequest,
    },
    error::AppError,
    service::amount_normalizer::AmountNormalizer,
    utils::strkey,
};

abigen!(
    BulkSettlement,
    r#"[
        function bulkTransfer(address token, address[] recipients, uint256[] amounts) payable
    ]"#
);

/// Gas估算安全系数：估算值直接翻倍
///
/// 占位性质的保守余量，并非精确计算；未用完的gas会退回
pub const GAS_SAFETY_MULTIPLIER: u64 = 2;

/// 待签名的EVM交易
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct PreparedEvmTransaction {
    /// 目标合约（结算合约或ERC20合约）
    pub to: String,
    /// 0x前缀的calldata
    pub data: String,
    /// 原生币转账时为合计金额，否则为0（十进制字符串）
    pub value: String,
    /// 翻倍后的gas上限（十进制字符串；授权未完成时缺省）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas_limit: Option<String>,
    /// EIP-155链ID
    pub chain_id: u64,
}

/// Aptos Move入口函数载荷
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct AptosEntryFunction {
    /// `<module>::bulk_payroll::bulk_transfer`
    pub function: String,
    pub type_arguments: Vec<String>,
    pub recipients: Vec<String>,
    /// 8位小数基础单位（Octas），u64十进制字符串
    pub amounts: Vec<String>,
}

impl AptosEntryFunction {
    /// 钱包`signAndSubmitTransaction`期望的载荷形态
    pub fn wallet_payload(&self) -> serde_json::Value {
        json!({
            "function": self.function,
            "type_arguments": self.type_arguments,
            "arguments": [self.recipients, self.amounts],
        })
    }
}

/// Soroban合约调用描述
///
/// 前端据此实例化合约客户端（固定contract id与WASM哈希）并调用
/// `bulk_transfer`，签名回调交给浏览器扩展
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct SorobanInvocation {
    pub contract_id: String,
    pub wasm_hash: String,
    pub rpc_url: String,
    pub network_passphrase: String,
    pub function: String,
    pub sender: String,
    pub token_id: String,
    pub recipients: Vec<String>,
    /// 7位小数基础单位，i128十进制字符串
    pub amounts: Vec<String>,
}

/// 待签名交易（按链家族分发的标签联合）
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(tag = "family", rename_all = "lowercase")]
pub enum SignableTransaction {
    Evm(PreparedEvmTransaction),
    Aptos(AptosEntryFunction),
    Stellar(SorobanInvocation),
}

/// 组装上下文：付款方与钱包上报的网络
#[derive(Debug, Clone)]
pub struct AssembleContext {
    /// 付款方地址（链特定格式）
    pub sender: String,
    /// 钱包上报的网络名（Aptos路径的WrongNetwork校验依据）
    pub wallet_network: Option<String>,
}

/// 交易组装器
pub struct TransferAssembler;

impl TransferAssembler {
    /// 组装待签名交易
    ///
    /// 纯构建，不访问网络；EVM路径的gas估算单独走`estimate_gas`。
    /// 任一阶段失败都保留TransferRequest供重试，不做自动重试。
    pub fn assemble(
        chain: &Chain,
        request: &TransferRequest,
        ctx: &AssembleContext,
    ) -> Result<SignableTransaction, AppError> {
        match chain.family {
            ChainFamily::Evm => Self::assemble_evm(chain, request).map(SignableTransaction::Evm),
            ChainFamily::Aptos => {
                Self::assemble_aptos(chain, request, ctx).map(SignableTransaction::Aptos)
            }
            ChainFamily::Stellar => {
                Self::assemble_stellar(chain, request, ctx).map(SignableTransaction::Stellar)
            }
        }
    }

    /// EVM：`settlementContract.bulkTransfer(token, recipients, amounts)`
    ///
    /// 原生币转账把合计金额挂到value字段并传哨兵零地址
    fn assemble_evm(
        chain: &Chain,
        request: &TransferRequest,
    ) -> Result<PreparedEvmTransaction, AppError> {
        let chain_id = chain
            .evm_chain_id()
            .ok_or_else(|| AppError::internal("EVM assembly invoked for non-EVM chain"))?;
        let settlement = Address::from_str(&chain.settlement_contract).map_err(|_| {
            AppError::internal(format!(
                "Malformed settlement contract address on chain {}",
                chain.key
            ))
        })?;

        let is_native = request.is_native(chain);
        let token_address = if is_native {
            Address::zero()
        } else {
            Address::from_str(&request.token.address).map_err(|_| {
                AppError::internal(format!(
                    "Malformed token contract address: {}",
                    request.token.address
                ))
            })?
        };

        let recipients = request
            .recipients
            .iter()
            .map(|r| {
                Address::from_str(&r.address).map_err(|_| {
                    AppError::bad_request(format!("Invalid EVM address: {}", r.address))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let amounts = request.normalized_amounts.clone();

        // 仅用于calldata编码，不发起网络请求
        let provider = Provider::<Http>::try_from(chain.rpc_url.as_str())
            .map_err(|e| AppError::rpc_error(format!("Invalid RPC endpoint: {}", e)))?;
        let contract = BulkSettlement::new(settlement, Arc::new(provider));
        let call = contract.bulk_transfer(token_address, recipients, amounts);
        let data = call
            .calldata()
            .ok_or_else(|| AppError::internal("Failed to encode bulkTransfer calldata"))?;

        let value = if is_native {
            request.aggregate
        } else {
            U256::zero()
        };

        Ok(PreparedEvmTransaction {
            to: to_checksum(&settlement, None),
            data: format!("0x{}", hex::encode(data.as_ref())),
            value: value.to_string(),
            gas_limit: None,
            chain_id,
        })
    }

    /// EVM gas估算：estimateGas后按安全系数翻倍
    ///
    /// 估算抛错时透传provider原始错误文本：
    /// 合约revert → SimulationFailed，其余 → GasEstimationFailed
    pub async fn estimate_gas(
        chain: &Chain,
        tx: &PreparedEvmTransaction,
        from: &str,
    ) -> Result<U256, AppError> {
        let provider = Provider::<Http>::try_from(chain.rpc_url.as_str())
            .map_err(|e| AppError::rpc_error(format!("Invalid RPC endpoint: {}", e)))?;
        let from = Address::from_str(from)
            .map_err(|_| AppError::bad_request(format!("Invalid payer address: {}", from)))?;
        let to = Address::from_str(&tx.to)
            .map_err(|_| AppError::internal("Malformed prepared transaction target"))?;
        let data = hex::decode(tx.data.trim_start_matches("0x"))
            .map_err(|_| AppError::internal("Malformed prepared calldata"))?;
        let value = U256::from_dec_str(&tx.value)
            .map_err(|_| AppError::internal("Malformed prepared value"))?;

        let typed: TypedTransaction = TransactionRequest::new()
            .from(from)
            .to(to)
            .data(data)
            .value(value)
            .into();

        let estimate = provider
            .estimate_gas(&typed, None)
            .await
            .map_err(|e| Self::classify_estimate_error(&e.to_string()))?;

        estimate
            .checked_mul(U256::from(GAS_SAFETY_MULTIPLIER))
            .ok_or_else(|| AppError::gas_estimation_failed("Gas estimate overflow"))
    }

    /// 节点在estimateGas阶段模拟执行，revert文本意味着交易本身会失败
    fn classify_estimate_error(text: &str) -> AppError {
        if text.to_ascii_lowercase().contains("revert") {
            AppError::simulation_failed(format!("Transaction simulation reverted: {}", text))
        } else {
            AppError::gas_estimation_failed(format!("Gas estimation failed: {}", text))
        }
    }

    /// Aptos：`<module>::bulk_payroll::bulk_transfer(recipients, amounts)`
    ///
    /// 组装前必须校验钱包上报的网络与链配置一致
    fn assemble_aptos(
        chain: &Chain,
        request: &TransferRequest,
        ctx: &AssembleContext,
    ) -> Result<AptosEntryFunction, AppError> {
        let (module_address, expected_network) = match &chain.network {
            NetworkRef::Aptos {
                module_address,
                network_name,
            } => (module_address, network_name),
            _ => return Err(AppError::internal("Aptos assembly invoked for non-Aptos chain")),
        };

        match ctx.wallet_network.as_deref() {
            Some(reported) if reported.eq_ignore_ascii_case(expected_network) => {}
            Some(reported) => {
                return Err(AppError::wrong_network(format!(
                    "Wallet is on {}, expected {}",
                    reported, expected_network
                )));
            }
            None => {
                return Err(AppError::wrong_network(format!(
                    "Could not verify wallet network, expected {}",
                    expected_network
                )));
            }
        }

        let amounts = request
            .normalized_amounts
            .iter()
            .map(|&units| AmountNormalizer::to_u64(units).map(|v| v.to_string()))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(AptosEntryFunction {
            function: format!("{}::bulk_payroll::bulk_transfer", module_address),
            type_arguments: Vec::new(),
            recipients: request.recipients.iter().map(|r| r.address.clone()).collect(),
            amounts,
        })
    }

    /// Stellar：`bulk_transfer(sender, token_id, recipients, amounts)`
    fn assemble_stellar(
        chain: &Chain,
        request: &TransferRequest,
        ctx: &AssembleContext,
    ) -> Result<SorobanInvocation, AppError> {
        let network_passphrase = match &chain.network {
            NetworkRef::Stellar { network_passphrase } => network_passphrase.clone(),
            _ => {
                return Err(AppError::internal(
                    "Stellar assembly invoked for non-Stellar chain",
                ))
            }
        };

        if !strkey::is_valid_account(&ctx.sender) {
            return Err(AppError::bad_request(format!(
                "Sender is not a valid Stellar account: {}",
                ctx.sender
            )));
        }

        let amounts = request
            .normalized_amounts
            .iter()
            .map(|&units| AmountNormalizer::to_i128(units).map(|v| v.to_string()))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(SorobanInvocation {
            contract_id: chain.settlement_contract.clone(),
            wasm_hash: STELLAR_BULK_WASM_HASH.to_string(),
            rpc_url: chain.rpc_url.clone(),
            network_passphrase,
            function: "bulk_transfer".to_string(),
            sender: ctx.sender.clone(),
            token_id: request.token.address.clone(),
            recipients: request.recipients.iter().map(|r| r.address.clone()).collect(),
            amounts,
        })
    }
}
