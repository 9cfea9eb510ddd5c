//! 应用共享状态

use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};

use crate::{
    config::Config,
    domain::chain::ChainRegistry,
    service::{
        employee_service::EmployeeStore, notification_service::NotificationCenter,
        payroll_service::PayrollService, stellar::StellarPayoutService,
    },
};

/// 应用状态，经Arc在所有请求处理器间共享
pub struct AppState {
    pub config: Config,
    pub registry: Arc<ChainRegistry>,
    pub notifications: Arc<NotificationCenter>,
    pub employees: Arc<EmployeeStore>,
    pub payroll: PayrollService,
    pub stellar_payout: StellarPayoutService,
}

impl AppState {
    pub fn new(config: Config) -> Result<Arc<Self>> {
        let registry = Arc::new(ChainRegistry::new());
        let notifications =
            NotificationCenter::new(Duration::from_secs(config.notifications.ttl_secs));

        let employees = match &config.employees.seed_path {
            Some(path) => EmployeeStore::from_seed_file(path)
                .with_context(|| format!("Failed to load employee seed file: {}", path))?,
            None => EmployeeStore::new(),
        };

        let payroll = PayrollService::new(
            Arc::clone(&registry),
            Arc::clone(&notifications),
            Arc::clone(&employees),
        );
        let stellar_payout = StellarPayoutService::new(config.stellar.clone());

        Ok(Arc::new(Self {
            config,
            registry,
            notifications,
            employees,
            payroll,
            stellar_payout,
        }))
    }
}
