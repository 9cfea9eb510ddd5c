//! 通知 API
//!
//! 前端轮询当前活跃通知；过期通知由NotificationCenter按TTL自动清除

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::Serialize;

use crate::{
    api::response::{success_response, ApiResponse},
    app_state::AppState,
    error::AppError,
    service::notification_service::Notification,
};

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct NotificationsResp {
    pub notifications: Vec<Notification>,
}

/// GET /api/v1/notifications
#[utoipa::path(
    get,
    path = "/api/v1/notifications",
    responses(
        (status = 200, description = "Active notifications", body = ApiResponse<NotificationsResp>)
    ),
    tag = "Notifications"
)]
pub async fn list_notifications(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<NotificationsResp>>, AppError> {
    success_response(NotificationsResp {
        notifications: state.notifications.snapshot().await,
    })
}
