//! 批量发薪管线离线集成测试
//!
//! 覆盖从收款人解析到待签名交易组装的完整路径，不访问网络：
//! EVM原生币、Aptos、Stellar三条组装路径，以及各类输入错误的归集。

use std::{sync::Arc, time::Duration};

use payforge::{
    domain::chain::{ChainFamily, ChainRegistry},
    error::AppErrorCode,
    service::{
        employee_service::EmployeeStore,
        notification_service::NotificationCenter,
        payroll_service::{PayrollService, PrepareInput, RecipientSource},
        transfer_assembler::SignableTransaction,
    },
    utils::strkey::{self, StrkeyVersion},
};

fn service() -> PayrollService {
    PayrollService::new(
        Arc::new(ChainRegistry::new()),
        NotificationCenter::new(Duration::from_secs(60)),
        EmployeeStore::new(),
    )
}

fn free_text(recipients: &str, amounts: &str) -> RecipientSource {
    RecipientSource::FreeText {
        recipients_text: recipients.to_string(),
        amounts_text: amounts.to_string(),
    }
}

#[tokio::test]
async fn aptos_bulk_transfer_builds_octa_amounts() {
    let outcome = service()
        .prepare(PrepareInput {
            chain_key: "aptos-testnet".into(),
            token_symbol: None,
            sender: "0x1".into(),
            wallet_network: Some("testnet".into()),
            source: free_text("0x2, 0x3", "2.5, 0.00000001"),
        })
        .await
        .unwrap();

    assert_eq!(outcome.token_symbol, "APT");
    assert_eq!(outcome.aggregate, "250000001");
    match outcome.transaction.unwrap() {
        SignableTransaction::Aptos(payload) => {
            assert!(payload.function.ends_with("::bulk_payroll::bulk_transfer"));
            assert_eq!(payload.recipients, vec!["0x2", "0x3"]);
            assert_eq!(payload.amounts, vec!["250000000", "1"]);
            // 钱包载荷形态：arguments = [recipients, amounts]
            let wallet = payload.wallet_payload();
            assert_eq!(wallet["arguments"][1][0], "250000000");
        }
        other => panic!("expected Aptos payload, got {:?}", other),
    }
}

#[tokio::test]
async fn aptos_wrong_wallet_network_rejected() {
    let err = service()
        .prepare(PrepareInput {
            chain_key: "aptos-testnet".into(),
            token_symbol: None,
            sender: "0x1".into(),
            wallet_network: Some("mainnet".into()),
            source: free_text("0x2", "1"),
        })
        .await
        .unwrap_err();
    assert_eq!(err.code, AppErrorCode::WrongNetwork);
}

#[tokio::test]
async fn stellar_bulk_transfer_uses_seven_decimals() {
    let sender = strkey::encode(StrkeyVersion::PublicKey, &[7u8; 32]);
    let alice = strkey::encode(StrkeyVersion::PublicKey, &[1u8; 32]);
    let bob = strkey::encode(StrkeyVersion::PublicKey, &[2u8; 32]);

    let outcome = service()
        .prepare(PrepareInput {
            chain_key: "stellar-testnet".into(),
            token_symbol: Some("USDC".into()),
            sender: sender.clone(),
            wallet_network: None,
            source: free_text(&format!("{}, {}", alice, bob), "10.5, 0.0000001"),
        })
        .await
        .unwrap();

    match outcome.transaction.unwrap() {
        SignableTransaction::Stellar(inv) => {
            assert_eq!(inv.function, "bulk_transfer");
            assert_eq!(inv.sender, sender);
            assert_eq!(inv.amounts, vec!["105000000", "1"]);
            assert_eq!(
                inv.contract_id,
                "CAAX52OHYPSYCUFTEO4FHQL345SYQD6D7JAGSPOFNMXXQJXO6DAHN3QR"
            );
        }
        other => panic!("expected Soroban invocation, got {:?}", other),
    }
}

#[tokio::test]
async fn length_mismatch_reported_before_per_entry_validation() {
    // 地址列表里有非法条目，但长度不匹配要先报
    let err = service()
        .prepare(PrepareInput {
            chain_key: "polygon".into(),
            token_symbol: None,
            sender: "0x52908400098527886E0F7030069857D2E4169EE7".into(),
            wallet_network: None,
            source: free_text("not-an-address, 0xdef", "1, 2, 3"),
        })
        .await
        .unwrap_err();
    assert_eq!(err.code, AppErrorCode::LengthMismatch);
}

#[tokio::test]
async fn validation_errors_accumulate_across_entries() {
    let err = service()
        .prepare(PrepareInput {
            chain_key: "polygon".into(),
            token_symbol: None,
            sender: "0x52908400098527886E0F7030069857D2E4169EE7".into(),
            wallet_network: None,
            source: free_text(
                "not-an-address, 0x8617E340B3D01FA5F11F306F4090FD50E238070D",
                "1, -5",
            ),
        })
        .await
        .unwrap_err();

    assert_eq!(err.code, AppErrorCode::ValidationFailed);
    let details = err.details.expect("accumulated report attached");
    let issues = details["issues"].as_array().unwrap();
    // 一条地址问题 + 一条金额问题，一次性全部返回
    assert_eq!(issues.len(), 2);
    assert_eq!(issues[0]["index"], 0);
    assert_eq!(issues[0]["field"], "address");
    assert_eq!(issues[1]["index"], 1);
    assert_eq!(issues[1]["field"], "amount");
}

#[tokio::test]
async fn duplicate_recipients_paid_independently() {
    let outcome = service()
        .prepare(PrepareInput {
            chain_key: "aptos-testnet".into(),
            token_symbol: None,
            sender: "0x1".into(),
            wallet_network: Some("testnet".into()),
            source: free_text("0x2, 0x2", "1, 2"),
        })
        .await
        .unwrap();

    assert_eq!(outcome.recipient_count, 2);
    assert_eq!(outcome.aggregate, "300000000");
}

#[tokio::test]
async fn employee_roster_feeds_prepare() {
    let registry = Arc::new(ChainRegistry::new());
    let notifications = NotificationCenter::new(Duration::from_secs(60));
    let employees = EmployeeStore::new();
    let svc = PayrollService::new(
        Arc::clone(&registry),
        Arc::clone(&notifications),
        Arc::clone(&employees),
    );

    let ada = employees
        .add("Ada".into(), "0x2".into(), ChainFamily::Aptos, "3".into())
        .await
        .unwrap();
    let ben = employees
        .add("Ben".into(), "0x3".into(), ChainFamily::Aptos, "1.5".into())
        .await
        .unwrap();

    // 选择顺序决定支付顺序
    let outcome = svc
        .prepare(PrepareInput {
            chain_key: "aptos-testnet".into(),
            token_symbol: None,
            sender: "0x1".into(),
            wallet_network: Some("testnet".into()),
            source: RecipientSource::Employees {
                employee_ids: vec![ben.id, ada.id],
            },
        })
        .await
        .unwrap();

    match outcome.transaction.unwrap() {
        SignableTransaction::Aptos(payload) => {
            assert_eq!(payload.recipients, vec!["0x3", "0x2"]);
            assert_eq!(payload.amounts, vec!["150000000", "300000000"]);
        }
        other => panic!("expected Aptos payload, got {:?}", other),
    }
}

#[tokio::test]
async fn unknown_token_symbol_rejected() {
    let err = service()
        .prepare(PrepareInput {
            chain_key: "stellar-testnet".into(),
            token_symbol: Some("DOGE".into()),
            sender: strkey::encode(StrkeyVersion::PublicKey, &[7u8; 32]),
            wallet_network: None,
            source: free_text("", ""),
        })
        .await
        .unwrap_err();
    assert_eq!(err.code, AppErrorCode::TokenNotSupported);
}

#[tokio::test]
async fn pipeline_failures_surface_as_notifications() {
    let registry = Arc::new(ChainRegistry::new());
    let notifications = NotificationCenter::new(Duration::from_secs(60));
    let svc = PayrollService::new(
        Arc::clone(&registry),
        Arc::clone(&notifications),
        EmployeeStore::new(),
    );

    let _ = svc
        .prepare(PrepareInput {
            chain_key: "aptos-testnet".into(),
            token_symbol: None,
            sender: "0x1".into(),
            wallet_network: Some("testnet".into()),
            source: free_text("0x2", "abc"),
        })
        .await
        .unwrap_err();

    tokio::task::yield_now().await;
    let active = notifications.snapshot().await;
    assert!(!active.is_empty());
}
