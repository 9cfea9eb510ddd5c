//! 链注册表不变式测试

use super::*;

#[test]
fn test_default_catalog_is_nonempty_and_ordered() {
    let registry = ChainRegistry::new();
    let chains = registry.list();
    assert!(!chains.is_empty());

    // 目录顺序即展示顺序，EVM链在前
    assert_eq!(chains[0].key, "polygon");
    assert_eq!(chains[0].family, ChainFamily::Evm);
}

#[test]
fn test_every_chain_has_tokens_and_at_most_one_native() {
    let registry = ChainRegistry::new();
    for chain in registry.list() {
        assert!(!chain.tokens.is_empty(), "chain {} has no tokens", chain.key);
        let native = chain
            .tokens
            .iter()
            .filter(|t| t.is_native(chain.family))
            .count();
        assert!(native <= 1, "chain {} has {} native tokens", chain.key, native);
    }
}

#[test]
fn test_get_unknown_chain_fails() {
    let registry = ChainRegistry::new();
    let err = registry.get("dogecoin").unwrap_err();
    assert_eq!(err.code, crate::error::AppErrorCode::ChainNotSupported);
}

#[test]
fn test_default_token_is_first_entry() {
    let registry = ChainRegistry::new();
    let bnb = registry.get("bnb-testnet").unwrap();
    assert_eq!(registry.default_token(bnb).symbol, "BNB");

    let stellar = registry.get("stellar-testnet").unwrap();
    assert_eq!(registry.default_token(stellar).symbol, "XLM");
}

#[test]
fn test_native_sentinel_detection() {
    let registry = ChainRegistry::new();
    let bnb = registry.get("bnb-testnet").unwrap();
    assert!(bnb.tokens[0].is_native(ChainFamily::Evm));
    assert!(!bnb.tokens[1].is_native(ChainFamily::Evm));

    // Polygon使用预编译地址标记MATIC
    let polygon = registry.get("polygon").unwrap();
    assert!(polygon.tokens[0].is_native(ChainFamily::Evm));
}

#[test]
fn test_evm_chain_id_resolution() {
    let registry = ChainRegistry::new();
    assert_eq!(registry.get("bnb-testnet").unwrap().evm_chain_id(), Some(97));
    assert_eq!(registry.get("aptos-testnet").unwrap().evm_chain_id(), None);
}

#[test]
fn test_register_rejects_empty_token_catalog() {
    let mut registry = ChainRegistry::new();
    let before = registry.list().len();
    registry.register(Chain {
        key: "broken".into(),
        name: "Broken".into(),
        family: ChainFamily::Evm,
        network: NetworkRef::Evm { chain_id: 1 },
        rpc_url: String::new(),
        settlement_contract: String::new(),
        tokens: vec![],
        block_explorer_url: String::new(),
    });
    assert_eq!(registry.list().len(), before);
}

#[test]
fn test_token_lookup_is_case_insensitive() {
    let registry = ChainRegistry::new();
    let chain = registry.get("polygon").unwrap();
    assert_eq!(chain.token("usdc").unwrap().decimals, 6);
    assert!(chain.token("DOGE").is_err());
}
