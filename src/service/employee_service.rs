//! 员工目录服务
//!
//! 持久化层不在本服务范围内，目录驻留内存，可从TOML种子文件载入。
//! 薪资始终以十进制字符串承载，避免任何浮点表示。

use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    domain::ChainFamily, error::AppError, service::amount_normalizer::AmountNormalizer,
    utils::address_validator::AddressValidator,
};

/// 员工记录
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Employee {
    pub id: Uuid,
    pub name: String,
    /// 收款地址（链特定格式）
    pub account_id: String,
    /// 地址所属链家族
    pub chain_family: ChainFamily,
    /// 薪资，十进制字符串
    pub salary: String,
}

/// 种子文件格式
#[derive(Debug, Deserialize)]
struct EmployeeSeed {
    #[serde(default)]
    employees: Vec<EmployeeSeedEntry>,
}

#[derive(Debug, Deserialize)]
struct EmployeeSeedEntry {
    name: String,
    account_id: String,
    chain_family: ChainFamily,
    salary: String,
}

/// 员工目录（内存态）
pub struct EmployeeStore {
    employees: RwLock<Vec<Employee>>,
}

impl EmployeeStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            employees: RwLock::new(Vec::new()),
        })
    }

    /// 从TOML种子文件载入
    pub fn from_seed_file(path: &str) -> Result<Arc<Self>> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read employee seed file: {}", path))?;
        let seed: EmployeeSeed =
            toml::from_str(&raw).with_context(|| format!("Failed to parse seed file: {}", path))?;

        let employees = seed
            .employees
            .into_iter()
            .map(|e| Employee {
                id: Uuid::new_v4(),
                name: e.name,
                account_id: e.account_id,
                chain_family: e.chain_family,
                salary: e.salary,
            })
            .collect::<Vec<_>>();

        tracing::info!(count = employees.len(), "Employee catalog seeded");
        Ok(Arc::new(Self {
            employees: RwLock::new(employees),
        }))
    }

    /// 全量列出
    pub async fn list(&self) -> Vec<Employee> {
        self.employees.read().await.clone()
    }

    /// 录入新员工，地址与薪资在入库前校验
    pub async fn add(
        &self,
        name: String,
        account_id: String,
        chain_family: ChainFamily,
        salary: String,
    ) -> Result<Employee, AppError> {
        if !AddressValidator::validate(chain_family, &account_id) {
            return Err(AppError::bad_request(format!(
                "Invalid {:?} address: {}",
                chain_family, account_id
            )));
        }
        AmountNormalizer::validate(&salary)?;

        let employee = Employee {
            id: Uuid::new_v4(),
            name,
            account_id,
            chain_family,
            salary,
        };
        self.employees.write().await.push(employee.clone());
        Ok(employee)
    }

    /// 按选择集解析员工，保持选择顺序；未知ID直接失败
    pub async fn select(&self, ids: &[Uuid]) -> Result<Vec<Employee>, AppError> {
        let employees = self.employees.read().await;
        let mut selected = Vec::with_capacity(ids.len());
        for id in ids {
            let employee = employees.iter().find(|e| e.id == *id).ok_or_else(|| {
                AppError::employee_not_found(format!("Unknown employee id: {}", id))
            })?;
            selected.push(employee.clone());
        }
        Ok(selected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_add_and_select_preserves_order() {
        let store = EmployeeStore::new();
        let a = store
            .add(
                "Ada".into(),
                "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa1".into(),
                ChainFamily::Evm,
                "1000".into(),
            )
            .await
            .unwrap();
        let b = store
            .add(
                "Bob".into(),
                "0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb2".into(),
                ChainFamily::Evm,
                "2000".into(),
            )
            .await
            .unwrap();

        // 选择顺序决定支付顺序
        let selected = store.select(&[b.id, a.id]).await.unwrap();
        assert_eq!(selected[0].name, "Bob");
        assert_eq!(selected[1].name, "Ada");
    }

    #[tokio::test]
    async fn test_add_rejects_bad_address_and_salary() {
        let store = EmployeeStore::new();
        assert!(store
            .add("X".into(), "nothex".into(), ChainFamily::Evm, "1".into())
            .await
            .is_err());
        assert!(store
            .add(
                "X".into(),
                "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa1".into(),
                ChainFamily::Evm,
                "-1".into()
            )
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_select_unknown_id_fails() {
        let store = EmployeeStore::new();
        assert!(store.select(&[Uuid::new_v4()]).await.is_err());
    }

    #[tokio::test]
    async fn test_seed_file_parsing() {
        use std::io::Write;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[[employees]]
name = "Ada"
account_id = "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa1"
chain_family = "evm"
salary = "1250.50"
"#
        )
        .unwrap();

        let store = EmployeeStore::from_seed_file(file.path().to_str().unwrap()).unwrap();
        let employees = store.list().await;
        assert_eq!(employees.len(), 1);
        assert_eq!(employees[0].salary, "1250.50");
    }
}
