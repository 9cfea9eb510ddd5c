//! Stellar 服务端代付 API（需认证）

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::{
    api::response::{success_response, ApiResponse},
    app_state::AppState,
    error::AppError,
    service::stellar::UsdcPayout,
};

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct UsdcTransferReq {
    /// 收款账户（G...）
    pub recipient: String,
    /// 十进制金额字符串，最多7位小数
    pub amount: String,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct UsdcTransferResp {
    pub success: bool,
    pub transaction: UsdcPayout,
}

/// POST /api/v1/stellar/transfer/usdc
///
/// 服务账户签名的经典Payment，发放USDC。
/// 唯一的服务端签名路径，其余转账均由前端钱包签名。
#[utoipa::path(
    post,
    path = "/api/v1/stellar/transfer/usdc",
    request_body = UsdcTransferReq,
    responses(
        (status = 200, description = "Payment accepted by Horizon", body = ApiResponse<UsdcTransferResp>),
        (status = 400, description = "Invalid recipient or amount"),
        (status = 401, description = "Missing or invalid token"),
        (status = 502, description = "Horizon rejected the transaction")
    ),
    security(("bearer_auth" = [])),
    tag = "Stellar"
)]
pub async fn transfer_usdc(
    State(state): State<Arc<AppState>>,
    Json(req): Json<UsdcTransferReq>,
) -> Result<Json<ApiResponse<UsdcTransferResp>>, AppError> {
    let payout = state
        .stellar_payout
        .send_usdc(&req.recipient, &req.amount)
        .await?;
    success_response(UsdcTransferResp {
        success: true,
        transaction: payout,
    })
}
