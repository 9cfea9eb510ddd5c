//! 多链配置模块
//!
//! 定义所有支持的区块链、结算合约与代币目录

#[cfg(test)]
#[path = "chain/tests.rs"]
mod tests;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// EVM原生代币哨兵地址（全零地址表示链原生币，而非合约代币）
pub const NATIVE_TOKEN_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

/// 链家族
///
/// 三种互斥的交易组装路径，批量转账在每条路径上调用不同形态的结算合约
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ChainFamily {
    /// EVM系（Polygon, BNB Chain, Educhain, Sonic）
    Evm,
    /// Aptos Move
    Aptos,
    /// Stellar Soroban
    Stellar,
}

/// 家族特定的网络标识
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum NetworkRef {
    /// EIP-155 链ID
    Evm { chain_id: u64 },
    /// Move模块地址 + 钱包上报的网络名（用于WrongNetwork校验）
    Aptos {
        module_address: String,
        network_name: String,
    },
    /// Stellar网络口令
    Stellar { network_passphrase: String },
}

/// 代币配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Token {
    /// 代币符号 (USDT, USDC, MATIC, ...)
    pub symbol: String,
    /// 合约地址或Soroban合约ID；原生币使用哨兵地址
    pub address: String,
    /// 小数位数，选中后在整个请求生命周期内固定
    pub decimals: u32,
    /// 展示名（可选）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl Token {
    pub fn new(symbol: &str, address: &str, decimals: u32) -> Self {
        Self {
            symbol: symbol.to_string(),
            address: address.to_string(),
            decimals,
            display_name: None,
        }
    }

    /// 该代币是否为链原生币
    pub fn is_native(&self, family: ChainFamily) -> bool {
        match family {
            ChainFamily::Evm => {
                self.address.eq_ignore_ascii_case(NATIVE_TOKEN_ADDRESS)
                    // 部分链（如Polygon）用预编译地址标记原生币
                    || self.address.eq_ignore_ascii_case(
                        "0x0000000000000000000000000000000000001010",
                    )
            }
            // Aptos/Stellar路径的结算合约只接受目录里登记的代币，
            // 以目录序首位作为原生标记
            ChainFamily::Aptos => self.address == "0x1::aptos_coin::AptosCoin",
            ChainFamily::Stellar => self.symbol == "XLM",
        }
    }
}

/// 链配置
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Chain {
    /// 注册表键（稳定、可作路由参数）
    pub key: String,
    /// 链名称
    pub name: String,
    /// 链家族（决定组装路径）
    pub family: ChainFamily,
    /// 网络标识
    pub network: NetworkRef,
    /// RPC端点
    pub rpc_url: String,
    /// 结算合约地址（bulkTransfer / bulk_payroll::bulk_transfer / Soroban合约）
    pub settlement_contract: String,
    /// 代币目录（有序，首位为默认代币）
    pub tokens: Vec<Token>,
    /// 区块浏览器
    pub block_explorer_url: String,
}

impl Chain {
    /// EVM链ID（仅EVM家族有效）
    pub fn evm_chain_id(&self) -> Option<u64> {
        match &self.network {
            NetworkRef::Evm { chain_id } => Some(*chain_id),
            _ => None,
        }
    }

    /// 按符号查找代币
    pub fn token(&self, symbol: &str) -> Result<&Token, AppError> {
        self.tokens
            .iter()
            .find(|t| t.symbol.eq_ignore_ascii_case(symbol))
            .ok_or_else(|| {
                AppError::token_not_supported(format!(
                    "Token {} is not configured on chain {}",
                    symbol, self.key
                ))
            })
    }
}

/// 链配置注册表
///
/// 进程启动时构建一次，之后只读。未知链键属于调用方编程错误，
/// 仅令当前操作失败，不做重试。
pub struct ChainRegistry {
    chains: Vec<Chain>,
    index: HashMap<String, usize>,
}

impl ChainRegistry {
    /// 创建预配置的注册表
    pub fn new() -> Self {
        let mut registry = Self {
            chains: Vec::new(),
            index: HashMap::new(),
        };
        registry.register_default_chains();
        registry
    }

    /// 注册一条链
    ///
    /// 不变式：代币目录非空；至多一个原生哨兵代币。违反视为配置错误，
    /// 拒绝注册并记录日志。
    pub fn register(&mut self, chain: Chain) {
        if chain.tokens.is_empty() {
            tracing::error!(chain = %chain.key, "Rejecting chain with empty token catalog");
            return;
        }
        let native_count = chain
            .tokens
            .iter()
            .filter(|t| t.is_native(chain.family))
            .count();
        if native_count > 1 {
            tracing::error!(
                chain = %chain.key,
                native_count,
                "Rejecting chain with more than one native sentinel token"
            );
            return;
        }
        if self.index.contains_key(&chain.key) {
            tracing::error!(chain = %chain.key, "Rejecting duplicate chain key");
            return;
        }

        self.index.insert(chain.key.clone(), self.chains.len());
        self.chains.push(chain);
    }

    /// 有序列出全部链
    pub fn list(&self) -> &[Chain] {
        &self.chains
    }

    /// 按键查找链
    pub fn get(&self, key: &str) -> Result<&Chain, AppError> {
        self.index
            .get(key)
            .map(|&i| &self.chains[i])
            .ok_or_else(|| {
                AppError::chain_not_supported(format!("Unknown chain: {}", key))
            })
    }

    /// 链的默认代币（目录首位）
    ///
    /// 切换链后前端应重置为该代币。注册时已保证目录非空。
    pub fn default_token<'a>(&self, chain: &'a Chain) -> &'a Token {
        &chain.tokens[0]
    }

    fn register_default_chains(&mut self) {
        // ---- EVM ----
        self.register(Chain {
            key: "polygon".into(),
            name: "Polygon Mainnet".into(),
            family: ChainFamily::Evm,
            network: NetworkRef::Evm { chain_id: 137 },
            rpc_url: "https://polygon-rpc.com".into(),
            settlement_contract: "0x0000000000000000000000000000000000000000".into(),
            tokens: vec![
                Token::new("MATIC", "0x0000000000000000000000000000000000001010", 18),
                Token::new("USDT", "0xc2132D05D31c914a87C6611C10748AEb04B58e8F", 6),
                Token::new("USDC", "0x2791Bca1f2de4661ED88A30C99A7a9449Aa84174", 6),
            ],
            block_explorer_url: "https://polygonscan.com".into(),
        });
        self.register(Chain {
            key: "polygon-amoy".into(),
            name: "Polygon Amoy Testnet".into(),
            family: ChainFamily::Evm,
            network: NetworkRef::Evm { chain_id: 80002 },
            rpc_url: "https://rpc-amoy.polygon.technology".into(),
            settlement_contract: "0x0000000000000000000000000000000000000000".into(),
            tokens: vec![
                Token::new("MATIC", "0x0000000000000000000000000000000000001010", 18),
                Token::new("TUSDT", "0x2655783ed6c47Fd312D1204712A804821899E1A3", 6),
                Token::new("USDC", "0x41E94Eb019C0762f9Bfcf9Fb1E58725BfB0e7582", 6),
            ],
            block_explorer_url: "https://amoy.polygonscan.com".into(),
        });
        self.register(Chain {
            key: "bnb".into(),
            name: "BNB Chain Mainnet".into(),
            family: ChainFamily::Evm,
            network: NetworkRef::Evm { chain_id: 56 },
            rpc_url: "https://bsc-dataseed.bnbchain.org".into(),
            settlement_contract: "0x0000000000000000000000000000000000000000".into(),
            tokens: vec![
                Token::new("BNB", NATIVE_TOKEN_ADDRESS, 18),
                Token::new("USDT", "0x55d398326f99059fF775485246999027B3197955", 6),
                Token::new("USDC", "0x8AC76a51cc950d9822D68b83fE1Ad97B32Cd580d", 6),
            ],
            block_explorer_url: "https://bscscan.com".into(),
        });
        self.register(Chain {
            key: "bnb-testnet".into(),
            name: "BNB Chain Testnet".into(),
            family: ChainFamily::Evm,
            network: NetworkRef::Evm { chain_id: 97 },
            rpc_url: "https://data-seed-prebsc-1-s1.binance.org:8545".into(),
            settlement_contract: "0x2c137aC6Bc804A9F798053347802F489F0025768".into(),
            tokens: vec![
                Token::new("BNB", NATIVE_TOKEN_ADDRESS, 18),
                Token::new("USDT", "0x337610d27c682e347c9cd60bd4b3b107c9d34ddd", 18),
                Token::new("USDC", "0x0a385f86059e0b2a048171d78afd1f38558121f3", 18),
            ],
            block_explorer_url: "https://testnet.bscscan.com".into(),
        });
        self.register(Chain {
            key: "educhain".into(),
            name: "Educhain Mainnet".into(),
            family: ChainFamily::Evm,
            network: NetworkRef::Evm { chain_id: 41923 },
            rpc_url: "https://rpc.edu-chain.raas.gelato.cloud".into(),
            settlement_contract: "0x0000000000000000000000000000000000000000".into(),
            tokens: vec![
                Token::new("EDU", NATIVE_TOKEN_ADDRESS, 18),
                Token::new("USDT", "0x7277Cc818e3F3FfBb169c6Da9CC77Fc2d2a34895", 6),
                Token::new("USDC", "0x836d275563bAb5E93Fd6Ca62a95dB7065Da94342", 6),
            ],
            block_explorer_url: "https://educhain.blockscout.com".into(),
        });
        self.register(Chain {
            key: "educhain-testnet".into(),
            name: "Educhain Testnet".into(),
            family: ChainFamily::Evm,
            network: NetworkRef::Evm { chain_id: 656476 },
            rpc_url: "https://rpc.open-campus-codex.gelato.digital".into(),
            settlement_contract: "0x0000000000000000000000000000000000000000".into(),
            tokens: vec![
                Token::new("EDU", NATIVE_TOKEN_ADDRESS, 18),
                Token::new("USDT", "0xBCe9628e89eC686C9E1878065bec04b45DBD0B40", 6),
                Token::new("USDC", "0x77721D19BDfc67fe8cc46ddaa3cc4C94e6826E3C", 6),
            ],
            block_explorer_url: "https://edu-chain-testnet.blockscout.com".into(),
        });
        self.register(Chain {
            key: "sonic-blaze".into(),
            name: "Sonic Blaze Testnet".into(),
            family: ChainFamily::Evm,
            network: NetworkRef::Evm { chain_id: 57054 },
            rpc_url: "https://rpc.blaze.soniclabs.com".into(),
            settlement_contract: "0x60F733b4F6eCa0Cf196397C7b9f805f36AEc9E27".into(),
            tokens: vec![Token::new("S", NATIVE_TOKEN_ADDRESS, 18)],
            block_explorer_url: "https://testnet.sonicscan.org".into(),
        });

        // ---- Aptos ----
        self.register(Chain {
            key: "aptos-testnet".into(),
            name: "Aptos Testnet".into(),
            family: ChainFamily::Aptos,
            network: NetworkRef::Aptos {
                module_address:
                    "0xc86d8882ad5f59d399d3c7cc365282e439618494090a21e9b33a947d480c6ae2"
                        .into(),
                network_name: "testnet".into(),
            },
            rpc_url: "https://fullnode.testnet.aptoslabs.com/v1".into(),
            settlement_contract:
                "0xc86d8882ad5f59d399d3c7cc365282e439618494090a21e9b33a947d480c6ae2"
                    .into(),
            tokens: vec![Token::new("APT", "0x1::aptos_coin::AptosCoin", 8)],
            block_explorer_url: "https://explorer.aptoslabs.com".into(),
        });

        // ---- Stellar ----
        self.register(Chain {
            key: "stellar-testnet".into(),
            name: "Stellar Testnet".into(),
            family: ChainFamily::Stellar,
            network: NetworkRef::Stellar {
                network_passphrase: "Test SDF Network ; September 2015".into(),
            },
            rpc_url: "https://soroban-testnet.stellar.org".into(),
            settlement_contract:
                "CAAX52OHYPSYCUFTEO4FHQL345SYQD6D7JAGSPOFNMXXQJXO6DAHN3QR".into(),
            tokens: vec![
                Token::new(
                    "XLM",
                    "CDLZFC3SYJYDZT7K67VZ75HPJVIEUVNIXF47ZG2FB2RMQQVU2HHGCYSC",
                    7,
                ),
                Token::new(
                    "USDC",
                    "CBIELTK6YBZJU5UP2WWQEUCYKLPU6AUNZ2BQ4WWFEIE3USCIHMXQDAMA",
                    7,
                ),
            ],
            block_explorer_url: "https://stellar.expert/explorer/testnet".into(),
        });
    }
}

impl Default for ChainRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Soroban批量合约的WASM哈希，合约客户端实例化时固定绑定
pub const STELLAR_BULK_WASM_HASH: &str =
    "0ebde7a3d59aa065fb48d9cb48922abab601783216b9733f74071b441bb16a2a";
