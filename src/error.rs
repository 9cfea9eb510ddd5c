use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::{api::middleware::trace_id::current_trace_id, infrastructure::log_redact};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppErrorCode {
    // HTTP 基础错误码
    BadRequest,
    Unauthorized,
    NotFound,
    Timeout,
    Internal,

    // 业务错误码
    ValidationFailed,
    InvalidAddress,
    InvalidAmount,
    LengthMismatch,
    AmountOverflow,
    InsufficientBalance,
    InsufficientAllowance,
    WrongNetwork,
    GasEstimationFailed,
    SimulationFailed,
    BroadcastFailed,
    ChainNotSupported,
    TokenNotSupported,
    EmployeeNotFound,
    RpcError,
}

impl AppErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppErrorCode::BadRequest => "bad_request",
            AppErrorCode::Unauthorized => "unauthorized",
            AppErrorCode::NotFound => "not_found",
            AppErrorCode::Timeout => "timeout",
            AppErrorCode::Internal => "internal",

            AppErrorCode::ValidationFailed => "validation_failed",
            AppErrorCode::InvalidAddress => "invalid_address",
            AppErrorCode::InvalidAmount => "invalid_amount",
            AppErrorCode::LengthMismatch => "length_mismatch",
            AppErrorCode::AmountOverflow => "amount_overflow",
            AppErrorCode::InsufficientBalance => "insufficient_balance",
            AppErrorCode::InsufficientAllowance => "insufficient_allowance",
            AppErrorCode::WrongNetwork => "wrong_network",
            AppErrorCode::GasEstimationFailed => "gas_estimation_failed",
            AppErrorCode::SimulationFailed => "simulation_failed",
            AppErrorCode::BroadcastFailed => "broadcast_failed",
            AppErrorCode::ChainNotSupported => "chain_not_supported",
            AppErrorCode::TokenNotSupported => "token_not_supported",
            AppErrorCode::EmployeeNotFound => "employee_not_found",
            AppErrorCode::RpcError => "rpc_error",
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppError {
    pub code: AppErrorCode,
    pub message: String,
    pub status: StatusCode,
    pub trace_id: Option<String>,
    /// 结构化错误详情（例如逐条的收款人校验问题）
    pub details: Option<serde_json::Value>,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    code: &'a str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    trace_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<&'a serde_json::Value>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // 错误文本可能透传上游原文，出站前统一脱敏
        let message = log_redact::sanitize(&self.message);
        let trace_id = self.trace_id.or_else(current_trace_id);
        let body = ErrorBody {
            code: self.code.as_str(),
            message: &message,
            trace_id: trace_id.as_deref(),
            details: self.details.as_ref(),
        };
        (self.status, Json(body)).into_response()
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for AppError {}

impl AppError {
    fn new(code: AppErrorCode, status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            status,
            trace_id: None,
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(AppErrorCode::BadRequest, StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(AppErrorCode::Unauthorized, StatusCode::UNAUTHORIZED, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(AppErrorCode::NotFound, StatusCode::NOT_FOUND, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(
            AppErrorCode::Internal,
            StatusCode::INTERNAL_SERVER_ERROR,
            message,
        )
    }

    pub fn validation_failed(message: impl Into<String>) -> Self {
        Self::new(
            AppErrorCode::ValidationFailed,
            StatusCode::BAD_REQUEST,
            message,
        )
    }

    pub fn length_mismatch(message: impl Into<String>) -> Self {
        Self::new(
            AppErrorCode::LengthMismatch,
            StatusCode::BAD_REQUEST,
            message,
        )
    }

    pub fn invalid_address(message: impl Into<String>) -> Self {
        Self::new(
            AppErrorCode::InvalidAddress,
            StatusCode::BAD_REQUEST,
            message,
        )
    }

    pub fn invalid_amount(message: impl Into<String>) -> Self {
        Self::new(
            AppErrorCode::InvalidAmount,
            StatusCode::BAD_REQUEST,
            message,
        )
    }

    pub fn amount_overflow(message: impl Into<String>) -> Self {
        Self::new(
            AppErrorCode::AmountOverflow,
            StatusCode::BAD_REQUEST,
            message,
        )
    }

    pub fn insufficient_balance(message: impl Into<String>) -> Self {
        Self::new(
            AppErrorCode::InsufficientBalance,
            StatusCode::UNPROCESSABLE_ENTITY,
            message,
        )
    }

    pub fn insufficient_allowance(message: impl Into<String>) -> Self {
        Self::new(
            AppErrorCode::InsufficientAllowance,
            StatusCode::UNPROCESSABLE_ENTITY,
            message,
        )
    }

    pub fn wrong_network(message: impl Into<String>) -> Self {
        Self::new(
            AppErrorCode::WrongNetwork,
            StatusCode::UNPROCESSABLE_ENTITY,
            message,
        )
    }

    pub fn gas_estimation_failed(message: impl Into<String>) -> Self {
        Self::new(
            AppErrorCode::GasEstimationFailed,
            StatusCode::UNPROCESSABLE_ENTITY,
            message,
        )
    }

    pub fn simulation_failed(message: impl Into<String>) -> Self {
        Self::new(
            AppErrorCode::SimulationFailed,
            StatusCode::UNPROCESSABLE_ENTITY,
            message,
        )
    }

    pub fn broadcast_failed(message: impl Into<String>) -> Self {
        Self::new(
            AppErrorCode::BroadcastFailed,
            StatusCode::BAD_GATEWAY,
            message,
        )
    }

    pub fn employee_not_found(message: impl Into<String>) -> Self {
        Self::new(AppErrorCode::EmployeeNotFound, StatusCode::NOT_FOUND, message)
    }

    pub fn chain_not_supported(message: impl Into<String>) -> Self {
        Self::new(AppErrorCode::ChainNotSupported, StatusCode::NOT_FOUND, message)
    }

    pub fn token_not_supported(message: impl Into<String>) -> Self {
        Self::new(AppErrorCode::TokenNotSupported, StatusCode::NOT_FOUND, message)
    }

    pub fn rpc_error(message: impl Into<String>) -> Self {
        Self::new(AppErrorCode::RpcError, StatusCode::BAD_GATEWAY, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(AppErrorCode::Timeout, StatusCode::GATEWAY_TIMEOUT, message)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_strings() {
        assert_eq!(AppErrorCode::LengthMismatch.as_str(), "length_mismatch");
        assert_eq!(
            AppErrorCode::GasEstimationFailed.as_str(),
            "gas_estimation_failed"
        );
        assert_eq!(AppErrorCode::WrongNetwork.as_str(), "wrong_network");
    }

    #[tokio::test]
    async fn test_response_body_masks_secret_seed() {
        let seed = crate::utils::strkey::encode(
            crate::utils::strkey::StrkeyVersion::SecretSeed,
            &[7u8; 32],
        );
        let err = AppError::internal(format!("keypair decode failed for {}", seed));

        let response = err.into_response();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(!body.contains(&seed));
        assert!(body.contains("S***REDACTED***"));
    }

    #[test]
    fn test_constructor_status_codes() {
        assert_eq!(
            AppError::insufficient_balance("x").status,
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            AppError::broadcast_failed("x").status,
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(AppError::bad_request("x").status, StatusCode::BAD_REQUEST);
    }
}
