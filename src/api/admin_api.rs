//! 员工档案管理 API（需认证）

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::{
    api::response::{success_response, ApiResponse},
    app_state::AppState,
    domain::chain::ChainFamily,
    error::AppError,
    service::employee_service::Employee,
};

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ListEmployeesResp {
    pub employees: Vec<Employee>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct AddEmployeeReq {
    pub name: String,
    /// 收款地址（按chain_family的格式校验）
    pub account_id: String,
    pub chain_family: ChainFamily,
    /// 薪资金额，十进制字符串
    pub salary: String,
}

/// GET /api/v1/admin/employees
#[utoipa::path(
    get,
    path = "/api/v1/admin/employees",
    responses(
        (status = 200, description = "Employee roster", body = ApiResponse<ListEmployeesResp>),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_employees(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<ListEmployeesResp>>, AppError> {
    success_response(ListEmployeesResp {
        employees: state.employees.list().await,
    })
}

/// POST /api/v1/admin/employees
///
/// 地址与薪资在入库前按链家族规则校验
#[utoipa::path(
    post,
    path = "/api/v1/admin/employees",
    request_body = AddEmployeeReq,
    responses(
        (status = 200, description = "Employee added", body = ApiResponse<Employee>),
        (status = 400, description = "Invalid address or salary"),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn add_employee(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AddEmployeeReq>,
) -> Result<Json<ApiResponse<Employee>>, AppError> {
    let employee = state
        .employees
        .add(req.name, req.account_id, req.chain_family, req.salary)
        .await?;
    success_response(employee)
}
