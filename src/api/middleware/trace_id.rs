//! Trace ID 中间件
//! 为每个请求生成唯一的 trace_id，用于全链路追踪

use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};
use uuid::Uuid;

tokio::task_local! {
    static TRACE_ID: String;
}

/// 当前请求的trace_id；在中间件作用域之外返回None
pub fn current_trace_id() -> Option<String> {
    TRACE_ID.try_with(|id| id.clone()).ok()
}

/// Trace ID 生成器
pub struct TraceIdGenerator;

impl TraceIdGenerator {
    pub fn generate() -> String {
        Uuid::new_v4().to_string()
    }

    /// 从请求头中提取 trace_id，如果没有则生成新的
    pub fn get_or_generate(req: &Request) -> String {
        if let Some(trace_id_header) = req.headers().get("X-Trace-Id") {
            if let Ok(trace_id) = trace_id_header.to_str() {
                if !trace_id.is_empty() {
                    return trace_id.to_string();
                }
            }
        }
        Self::generate()
    }
}

/// Trace ID 中间件
/// 为每个请求生成或提取 trace_id，并添加到请求扩展和响应头中
pub async fn trace_id_middleware(mut req: Request, next: Next) -> Response {
    let trace_id = TraceIdGenerator::get_or_generate(&req);
    req.extensions_mut().insert(trace_id.clone());

    // handler内（含错误体）通过current_trace_id读取
    let mut response = TRACE_ID.scope(trace_id.clone(), next.run(req)).await;

    if let Ok(header_value) = HeaderValue::from_str(&trace_id) {
        response.headers_mut().insert("X-Trace-Id", header_value);
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    #[test]
    fn test_header_wins_over_generated() {
        let req = axum::http::Request::builder()
            .header("X-Trace-Id", "abc-123")
            .body(Body::empty())
            .unwrap();
        assert_eq!(TraceIdGenerator::get_or_generate(&req), "abc-123");
    }

    #[tokio::test]
    async fn test_current_trace_id_scoped_to_request() {
        assert!(current_trace_id().is_none());
        let seen = TRACE_ID
            .scope("t-1".to_string(), async { current_trace_id() })
            .await;
        assert_eq!(seen.as_deref(), Some("t-1"));
        assert!(current_trace_id().is_none());
    }

    #[test]
    fn test_empty_header_falls_back_to_uuid() {
        let req = axum::http::Request::builder()
            .header("X-Trace-Id", "")
            .body(Body::empty())
            .unwrap();
        let id = TraceIdGenerator::get_or_generate(&req);
        assert!(Uuid::parse_str(&id).is_ok());
    }
}
