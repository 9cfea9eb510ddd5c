//! API 路由与中间件装配

use std::sync::Arc;

use axum::{
    http::{header, Method},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

use crate::app_state::AppState;

pub mod admin_api;
pub mod middleware;
pub mod notification_api;
pub mod payroll_api;
pub mod response;
pub mod stellar_api;

#[derive(OpenApi)]
#[openapi(
    paths(
        payroll_api::list_chains,
        payroll_api::prepare,
        payroll_api::await_approval,
        payroll_api::broadcast,
        admin_api::list_employees,
        admin_api::add_employee,
        stellar_api::transfer_usdc,
        notification_api::list_notifications,
    ),
    components(
        schemas(
            payroll_api::ChainsResp,
            payroll_api::AwaitApprovalReq,
            payroll_api::AwaitApprovalResp,
            payroll_api::BroadcastReq,
            payroll_api::BroadcastResp,
            admin_api::ListEmployeesResp,
            admin_api::AddEmployeeReq,
            stellar_api::UsdcTransferReq,
            stellar_api::UsdcTransferResp,
            notification_api::NotificationsResp,
            crate::domain::chain::Chain,
            crate::domain::chain::ChainFamily,
            crate::domain::chain::NetworkRef,
            crate::domain::chain::Token,
            crate::domain::transfer::Recipient,
            crate::domain::transfer::ValidationIssue,
            crate::domain::transfer::ValidationField,
            crate::domain::transfer::ValidationReport,
            crate::service::payroll_service::PrepareInput,
            crate::service::payroll_service::RecipientSource,
            crate::service::payroll_service::PrepareOutcome,
            crate::service::allowance_gate::AllowanceCheck,
            crate::service::transfer_assembler::SignableTransaction,
            crate::service::transfer_assembler::PreparedEvmTransaction,
            crate::service::transfer_assembler::AptosEntryFunction,
            crate::service::transfer_assembler::SorobanInvocation,
            crate::service::employee_service::Employee,
            crate::service::notification_service::Notification,
            crate::service::notification_service::NotificationKind,
            crate::service::stellar::UsdcPayout,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Payroll", description = "Bulk transfer preparation and broadcast"),
        (name = "Admin", description = "Employee roster management"),
        (name = "Stellar", description = "Service-signed USDC payouts"),
        (name = "Notifications", description = "Transient status notifications")
    )
)]
struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// 组装完整路由
pub fn routes(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state);

    // 公开路由（不需要认证）
    let public_routes = Router::new()
        .route("/api/v1/payroll/chains", get(payroll_api::list_chains))
        .route("/api/v1/payroll/prepare", post(payroll_api::prepare))
        .route(
            "/api/v1/payroll/approval/await",
            post(payroll_api::await_approval),
        )
        .route("/api/v1/payroll/broadcast", post(payroll_api::broadcast))
        .route(
            "/api/v1/notifications",
            get(notification_api::list_notifications),
        )
        .route("/health", get(health))
        .merge(
            utoipa_swagger_ui::SwaggerUi::new("/docs")
                .url("/openapi.json", ApiDoc::openapi()),
        );

    // 需要认证的路由
    let protected_routes = Router::new()
        .route(
            "/api/v1/admin/employees",
            get(admin_api::list_employees).post(admin_api::add_employee),
        )
        .route(
            "/api/v1/stellar/transfer/usdc",
            post(stellar_api::transfer_usdc),
        )
        .layer(from_fn_with_state(
            Arc::clone(&state),
            middleware::auth_middleware,
        ));

    public_routes
        .merge(protected_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(from_fn(middleware::trace_id_middleware)),
        )
        .with_state(state)
}

/// CORS：配置了前端地址时只放行该来源，否则放行所有（开发模式）
fn cors_layer(state: &AppState) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    match state
        .config
        .server
        .frontend_url
        .as_deref()
        .and_then(|u| u.parse::<axum::http::HeaderValue>().ok())
    {
        Some(origin) => cors.allow_origin(origin),
        None => cors.allow_origin(Any),
    }
}

async fn health() -> &'static str {
    "ok"
}
