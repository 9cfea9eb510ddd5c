//! 批量发薪 API
//!
//! 前端流程：chains拉取链目录 → prepare构建待签名交易 →
//! （ERC20且授权不足时）钱包签approve → approval/await等确认 → 重新prepare →
//! 钱包签名 → broadcast广播（仅EVM裸交易；Aptos/Stellar由钱包直接提交）。

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::{
    api::response::{success_response, ApiResponse},
    app_state::AppState,
    domain::chain::Chain,
    error::AppError,
    service::payroll_service::{PrepareInput, PrepareOutcome},
};

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ChainsResp {
    pub chains: Vec<Chain>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct AwaitApprovalReq {
    pub chain_key: String,
    /// approve交易哈希（钱包签名提交后返回）
    pub tx_hash: String,
    /// 授权方（付款钱包地址）
    pub owner: String,
    #[serde(default)]
    pub token_symbol: Option<String>,
    /// 需要的授权额度（基础单位，十进制字符串）
    pub required_total: String,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct AwaitApprovalResp {
    pub approved: bool,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct BroadcastReq {
    pub chain_key: String,
    /// 0x前缀的已签名裸交易
    pub signed_raw_tx: String,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct BroadcastResp {
    pub tx_hash: String,
}

/// GET /api/v1/payroll/chains
///
/// 链目录：键、家族、RPC、结算合约与代币列表（目录首位为默认代币）
#[utoipa::path(
    get,
    path = "/api/v1/payroll/chains",
    responses(
        (status = 200, description = "Configured chain catalog", body = ApiResponse<ChainsResp>)
    ),
    tag = "Payroll"
)]
pub async fn list_chains(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<ChainsResp>>, AppError> {
    success_response(ChainsResp {
        chains: state.registry.list().to_vec(),
    })
}

/// POST /api/v1/payroll/prepare
///
/// 解析收款人列表、归一化金额并组装待签名交易。
/// ERC20路径授权不足时返回待签名的approve交易，transaction缺省。
#[utoipa::path(
    post,
    path = "/api/v1/payroll/prepare",
    request_body = PrepareInput,
    responses(
        (status = 200, description = "Transaction prepared", body = ApiResponse<PrepareOutcome>),
        (status = 400, description = "Validation failed, mismatched lists or bad amounts"),
        (status = 422, description = "Insufficient balance or wrong wallet network")
    ),
    tag = "Payroll"
)]
pub async fn prepare(
    State(state): State<Arc<AppState>>,
    Json(input): Json<PrepareInput>,
) -> Result<Json<ApiResponse<PrepareOutcome>>, AppError> {
    let outcome = state.payroll.prepare(input).await?;
    success_response(outcome)
}

/// POST /api/v1/payroll/approval/await
///
/// 轮询approve交易回执并复核授权额度
#[utoipa::path(
    post,
    path = "/api/v1/payroll/approval/await",
    request_body = AwaitApprovalReq,
    responses(
        (status = 200, description = "Approval confirmed", body = ApiResponse<AwaitApprovalResp>),
        (status = 408, description = "Approval not confirmed in time"),
        (status = 422, description = "Approval reverted or allowance still insufficient")
    ),
    tag = "Payroll"
)]
pub async fn await_approval(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AwaitApprovalReq>,
) -> Result<Json<ApiResponse<AwaitApprovalResp>>, AppError> {
    state
        .payroll
        .await_approval(
            &req.chain_key,
            &req.tx_hash,
            &req.owner,
            &req.token_symbol,
            &req.required_total,
        )
        .await?;
    success_response(AwaitApprovalResp { approved: true })
}

/// POST /api/v1/payroll/broadcast
///
/// 广播外部签名完成的EVM裸交易（单次尝试，不重试）
#[utoipa::path(
    post,
    path = "/api/v1/payroll/broadcast",
    request_body = BroadcastReq,
    responses(
        (status = 200, description = "Transaction accepted by the RPC node", body = ApiResponse<BroadcastResp>),
        (status = 502, description = "Node rejected the transaction")
    ),
    tag = "Payroll"
)]
pub async fn broadcast(
    State(state): State<Arc<AppState>>,
    Json(req): Json<BroadcastReq>,
) -> Result<Json<ApiResponse<BroadcastResp>>, AppError> {
    let tx_hash = state
        .payroll
        .broadcast(&req.chain_key, &req.signed_raw_tx)
        .await?;
    success_response(BroadcastResp { tx_hash })
}
