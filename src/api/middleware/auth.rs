//! JWT 认证中间件
//! 管理端路由（员工档案维护、服务端代付）要求Bearer Token

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::{app_state::AppState, error::AppError};

/// JWT Claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// 主体标识
    pub sub: String,
    /// 过期时间戳（秒）
    pub exp: usize,
}

/// 认证上下文，注入request extensions供处理器读取
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub subject: String,
}

/// JWT 认证中间件
/// 从 Authorization 头部提取 Bearer Token，验证HS256签名与过期时间
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    // OPTIONS 预检请求直接放行
    if req.method() == axum::http::Method::OPTIONS {
        return Ok(next.run(req).await);
    }

    let auth_header = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok());
    let claims = verify_bearer(&state.config.auth.jwt_secret, auth_header)?;

    req.extensions_mut().insert(AuthContext {
        subject: claims.sub,
    });
    Ok(next.run(req).await)
}

/// 校验Bearer Token
///
/// 密钥未配置时受保护路由整体拒绝服务，绝不降级为匿名放行
fn verify_bearer(secret: &str, auth_header: Option<&str>) -> Result<Claims, AppError> {
    if secret.is_empty() {
        tracing::error!("JWT secret not configured, refusing protected route");
        return Err(AppError::internal(
            "Authentication is not configured on this server",
        ));
    }

    let header =
        auth_header.ok_or_else(|| AppError::unauthorized("Missing Authorization header"))?;
    let token = header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::unauthorized("Invalid Authorization header format"))?
        .trim();

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| {
        tracing::warn!(error = %e, "JWT verification failed");
        AppError::unauthorized("Invalid or expired token")
    })
}
