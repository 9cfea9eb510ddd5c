//! 收款人列表解析
//!
//! 两种输入形态：逗号分隔的地址/金额并行文本，或对已拉取员工目录的选择集。
//! 输出是与输入同序的收款人列表。

use serde_json::json;

use crate::{
    domain::{
        chain::Chain,
        transfer::{Recipient, ValidationField, ValidationReport},
    },
    error::AppError,
    service::{amount_normalizer::AmountNormalizer, employee_service::Employee},
    utils::address_validator::AddressValidator,
};

/// 收款人解析器
pub struct RecipientListParser;

impl RecipientListParser {
    /// 解析并行的自由文本输入
    ///
    /// 两列长度不一致时整体失败（LengthMismatch），不尝试部分配对。
    /// 逐条校验时收集全部问题再统一返回，UI要能一次展示所有错误。
    /// 不去重：重复地址允许出现并按条独立支付。
    pub fn parse_free_text(
        chain: &Chain,
        recipients_text: &str,
        amounts_text: &str,
    ) -> Result<Vec<Recipient>, AppError> {
        let addresses: Vec<&str> = split_csv(recipients_text);
        let amounts: Vec<&str> = split_csv(amounts_text);

        if addresses.len() != amounts.len() {
            return Err(AppError::length_mismatch(format!(
                "Recipients and amounts must have the same length ({} vs {})",
                addresses.len(),
                amounts.len()
            )));
        }
        if addresses.is_empty() {
            return Err(AppError::validation_failed("Recipient list is empty"));
        }

        let entries: Vec<Recipient> = addresses
            .iter()
            .zip(amounts.iter())
            .map(|(address, amount)| Recipient {
                display_name: None,
                address: address.to_string(),
                amount: amount.to_string(),
            })
            .collect();

        Self::validate_entries(chain, entries)
    }

    /// 从员工选择集构造收款人列表
    ///
    /// 金额取员工的salary字段；顺序跟随选择集顺序。
    pub fn from_employees(
        chain: &Chain,
        employees: Vec<Employee>,
    ) -> Result<Vec<Recipient>, AppError> {
        if employees.is_empty() {
            return Err(AppError::validation_failed("No employees selected"));
        }

        let entries: Vec<Recipient> = employees
            .into_iter()
            .map(|e| Recipient {
                display_name: Some(e.name),
                address: e.account_id,
                amount: e.salary,
            })
            .collect();

        Self::validate_entries(chain, entries)
    }

    /// 逐条校验，累积全部问题
    fn validate_entries(
        chain: &Chain,
        entries: Vec<Recipient>,
    ) -> Result<Vec<Recipient>, AppError> {
        let mut report = ValidationReport::default();

        for (index, entry) in entries.iter().enumerate() {
            if entry.address.is_empty() {
                report.push(index, ValidationField::Address, "Address must not be empty");
            } else if !AddressValidator::validate(chain.family, &entry.address) {
                report.push(
                    index,
                    ValidationField::Address,
                    format!("Invalid {:?} address: {}", chain.family, entry.address),
                );
            }

            if let Err(err) = AmountNormalizer::validate(&entry.amount) {
                report.push(index, ValidationField::Amount, err.message);
            }
        }

        if !report.is_empty() {
            return Err(AppError::validation_failed(format!(
                "{} recipient entries failed validation",
                report.issues.len()
            ))
            .with_details(json!(report)));
        }

        Ok(entries)
    }
}

/// 仅吞掉尾部多余的分隔符；内部空槽保留，逐条校验会按下标点名
fn split_csv(text: &str) -> Vec<&str> {
    let mut slots: Vec<&str> = text.split(',').map(str::trim).collect();
    while slots.last() == Some(&"") {
        slots.pop();
    }
    slots
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{domain::ChainRegistry, error::AppErrorCode};

    fn evm_chain() -> Chain {
        ChainRegistry::new().get("bnb-testnet").unwrap().clone()
    }

    const ADDR_A: &str = "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa1";
    const ADDR_B: &str = "0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb2";

    #[test]
    fn test_parse_preserves_length_and_order() {
        let chain = evm_chain();
        let parsed = RecipientListParser::parse_free_text(
            &chain,
            &format!("{}, {}", ADDR_A, ADDR_B),
            "1, 2",
        )
        .unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].address, ADDR_A);
        assert_eq!(parsed[0].amount, "1");
        assert_eq!(parsed[1].address, ADDR_B);
        assert_eq!(parsed[1].amount, "2");
    }

    #[test]
    fn test_length_mismatch_assembles_nothing() {
        let chain = evm_chain();
        let err = RecipientListParser::parse_free_text(
            &chain,
            &format!("{},{},{}", ADDR_A, ADDR_B, ADDR_A),
            "1,2",
        )
        .unwrap_err();
        assert_eq!(err.code, AppErrorCode::LengthMismatch);
    }

    #[test]
    fn test_all_problems_reported_at_once() {
        let chain = evm_chain();
        // 第0条地址坏，第1条金额坏——两条问题都要出现在报告里
        let err = RecipientListParser::parse_free_text(
            &chain,
            &format!("0xnothex,{}", ADDR_B),
            "1,-5",
        )
        .unwrap_err();
        assert_eq!(err.code, AppErrorCode::ValidationFailed);
        let details = err.details.expect("validation report attached");
        let issues = details["issues"].as_array().unwrap();
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0]["index"], 0);
        assert_eq!(issues[0]["field"], "address");
        assert_eq!(issues[1]["index"], 1);
        assert_eq!(issues[1]["field"], "amount");
    }

    #[test]
    fn test_interior_empty_slot_reported_by_index() {
        let chain = evm_chain();
        // 中间漏了一个地址：长度仍配对，空槽要在报告里按下标出现
        let err = RecipientListParser::parse_free_text(
            &chain,
            &format!("{},,{}", ADDR_A, ADDR_B),
            "1,2,3",
        )
        .unwrap_err();
        assert_eq!(err.code, AppErrorCode::ValidationFailed);
        let details = err.details.expect("validation report attached");
        let issues = details["issues"].as_array().unwrap();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0]["index"], 1);
        assert_eq!(issues[0]["field"], "address");
    }

    #[test]
    fn test_trailing_separator_tolerated() {
        let chain = evm_chain();
        let parsed = RecipientListParser::parse_free_text(
            &chain,
            &format!("{},{},", ADDR_A, ADDR_B),
            "1,2,",
        )
        .unwrap();
        assert_eq!(parsed.len(), 2);
    }

    #[test]
    fn test_duplicate_addresses_are_allowed() {
        let chain = evm_chain();
        let parsed = RecipientListParser::parse_free_text(
            &chain,
            &format!("{},{}", ADDR_A, ADDR_A),
            "1,2",
        )
        .unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].address, parsed[1].address);
    }

    #[test]
    fn test_empty_input_rejected() {
        let chain = evm_chain();
        let err = RecipientListParser::parse_free_text(&chain, "", "").unwrap_err();
        assert_eq!(err.code, AppErrorCode::ValidationFailed);
    }

    #[test]
    fn test_from_employees_uses_salary_and_name() {
        let chain = evm_chain();
        let employees = vec![Employee {
            id: uuid::Uuid::new_v4(),
            name: "Ada".into(),
            account_id: ADDR_A.into(),
            chain_family: crate::domain::ChainFamily::Evm,
            salary: "1250.50".into(),
        }];
        let parsed = RecipientListParser::from_employees(&chain, employees).unwrap();
        assert_eq!(parsed[0].display_name.as_deref(), Some("Ada"));
        assert_eq!(parsed[0].amount, "1250.50");
    }
}
