//! 配置管理模块
//! 支持从环境变量和配置文件加载配置

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// 应用配置结构体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub stellar: StellarConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
    #[serde(default)]
    pub employees: EmployeesConfig,
}

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind_addr: String,
    #[serde(default)]
    pub frontend_url: Option<String>,
}

/// JWT配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_expiry_secs: u64,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String, // "json" or "text"
}

/// Stellar服务账户配置（服务端代付USDC路径）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StellarConfig {
    pub horizon_url: String,
    pub network_passphrase: String,
    /// 服务账户公钥（G...）
    pub service_address: String,
    /// 服务账户密钥种子（S...），仅从环境变量读取，不落盘
    #[serde(default, skip_serializing)]
    pub service_secret: String,
    /// USDC发行方账户
    pub usdc_issuer: String,
}

/// 通知配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    /// 通知自动清除延迟（秒）
    pub ttl_secs: u64,
}

/// 员工目录配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmployeesConfig {
    /// 可选的TOML种子文件，启动时载入内存
    #[serde(default)]
    pub seed_path: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            frontend_url: None,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            token_expiry_secs: 86400,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

impl Default for StellarConfig {
    fn default() -> Self {
        Self {
            horizon_url: "https://horizon-testnet.stellar.org".to_string(),
            network_passphrase: "Test SDF Network ; September 2015".to_string(),
            service_address: String::new(),
            service_secret: String::new(),
            usdc_issuer: String::new(),
        }
    }
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self { ttl_secs: 5 }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            auth: AuthConfig::default(),
            logging: LoggingConfig::default(),
            stellar: StellarConfig::default(),
            notifications: NotificationsConfig::default(),
            employees: EmployeesConfig::default(),
        }
    }
}

impl Config {
    /// 从配置文件和环境变量加载配置
    ///
    /// 优先级：环境变量 > 配置文件 > 默认值
    pub fn from_env_and_file(path: Option<&str>) -> Result<Self> {
        let mut config = match path {
            Some(p) if Path::new(p).exists() => {
                let raw = std::fs::read_to_string(p)
                    .with_context(|| format!("Failed to read config file: {}", p))?;
                toml::from_str(&raw)
                    .with_context(|| format!("Failed to parse config file: {}", p))?
            }
            Some(p) => {
                anyhow::bail!("Config file not found: {}", p);
            }
            None => Config::default(),
        };

        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("BIND_ADDR") {
            self.server.bind_addr = v;
        }
        if let Ok(v) = std::env::var("FRONTEND_URL") {
            self.server.frontend_url = Some(v);
        }
        if let Ok(v) = std::env::var("JWT_SECRET") {
            self.auth.jwt_secret = v;
        }
        if let Ok(v) = std::env::var("JWT_TOKEN_EXPIRY_SECS") {
            if let Ok(secs) = v.parse() {
                self.auth.token_expiry_secs = secs;
            }
        }
        if let Ok(v) = std::env::var("LOG_LEVEL") {
            self.logging.level = v;
        }
        if let Ok(v) = std::env::var("HORIZON_URL") {
            self.stellar.horizon_url = v;
        }
        if let Ok(v) = std::env::var("STELLAR_NETWORK_PASSPHRASE") {
            self.stellar.network_passphrase = v;
        }
        if let Ok(v) = std::env::var("SERVICE_CONTRACT_ADDRESS") {
            self.stellar.service_address = v;
        }
        if let Ok(v) = std::env::var("SERVICE_CONTRACT_AUTH") {
            self.stellar.service_secret = v;
        }
        if let Ok(v) = std::env::var("USDC_ISSUER") {
            self.stellar.usdc_issuer = v;
        }
        if let Ok(v) = std::env::var("NOTIFICATION_TTL_SECS") {
            if let Ok(secs) = v.parse() {
                self.notifications.ttl_secs = secs;
            }
        }
        if let Ok(v) = std::env::var("EMPLOYEE_SEED_PATH") {
            self.employees.seed_path = Some(v);
        }
    }
}
