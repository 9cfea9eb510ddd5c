//! 金额归一化
//!
//! 把用户录入的十进制金额字符串转换为链上基础单位整数。
//! 这是全仓库唯一一处浮点误差会静默污染支付金额的位置，
//! 因此从解析到累加全程使用精确数值类型（rust_decimal + U256），禁止f64。

use std::str::FromStr;

use ethers::types::U256;
use rust_decimal::Decimal;

use crate::error::AppError;

/// 金额归一化器
pub struct AmountNormalizer;

impl AmountNormalizer {
    /// 校验金额字符串可解析为正的有限十进制数
    ///
    /// 用于解析阶段的逐条校验；不做缩放
    pub fn validate(amount: &str) -> Result<Decimal, AppError> {
        let trimmed = amount.trim();
        if trimmed.is_empty() {
            return Err(AppError::invalid_amount("Amount must not be empty"));
        }
        let value = Decimal::from_str(trimmed)
            .map_err(|_| AppError::invalid_amount(format!("Not a decimal number: {}", trimmed)))?;
        if value <= Decimal::ZERO {
            return Err(AppError::invalid_amount(format!(
                "Amount must be positive: {}",
                trimmed
            )));
        }
        Ok(value)
    }

    /// 归一化：normalized = round_down(amount * 10^decimals)
    ///
    /// 先整数/小数部分拆分，超出decimals的小数位直接截断（向下取整），
    /// 再用U256做缩放与相加，保证对任意精度输入都精确。
    pub fn to_base_units(amount: &str, decimals: u32) -> Result<U256, AppError> {
        Self::validate(amount)?;
        let trimmed = amount.trim();

        let mut parts = trimmed.split('.');
        let int_part = parts.next().unwrap_or("0");
        let frac_part = parts.next().unwrap_or("");
        if parts.next().is_some() {
            return Err(AppError::invalid_amount(format!(
                "Malformed amount: {}",
                trimmed
            )));
        }

        let int_part = if int_part.is_empty() { "0" } else { int_part };
        let int_units = U256::from_dec_str(int_part)
            .map_err(|_| AppError::invalid_amount(format!("Invalid integer part: {}", int_part)))?;

        let mut frac = frac_part.to_string();
        if frac.len() > decimals as usize {
            // 截断即round_down
            frac.truncate(decimals as usize);
        }
        while frac.len() < decimals as usize {
            frac.push('0');
        }
        let frac_units = if frac.is_empty() {
            U256::zero()
        } else {
            U256::from_dec_str(&frac).map_err(|_| {
                AppError::invalid_amount(format!("Invalid fractional part: {}", frac_part))
            })?
        };

        let scale = U256::from(10u64).pow(U256::from(decimals));
        int_units
            .checked_mul(scale)
            .and_then(|v| v.checked_add(frac_units))
            .ok_or_else(|| AppError::amount_overflow(format!("Amount overflow: {}", trimmed)))
    }

    /// 批量归一化并计算合计
    ///
    /// 合计使用U256累加器（对18位小数的代币，合计很容易超过2^53，
    /// 机器浮点在此不可用）。顺序无关：求和满足结合律。
    pub fn normalize_all(
        amounts: &[String],
        decimals: u32,
    ) -> Result<(Vec<U256>, U256), AppError> {
        let mut normalized = Vec::with_capacity(amounts.len());
        let mut aggregate = U256::zero();
        for amount in amounts {
            let units = Self::to_base_units(amount, decimals)?;
            aggregate = aggregate
                .checked_add(units)
                .ok_or_else(|| AppError::amount_overflow("Aggregate amount overflow"))?;
            normalized.push(units);
        }
        Ok((normalized, aggregate))
    }

    /// 降位到u64（Aptos Move入口函数的金额参数类型）
    pub fn to_u64(units: U256) -> Result<u64, AppError> {
        if units > U256::from(u64::MAX) {
            return Err(AppError::amount_overflow(
                "Amount exceeds u64 range required by the Move entry function",
            ));
        }
        Ok(units.as_u64())
    }

    /// 降位到i128（Soroban合约的金额参数类型）
    pub fn to_i128(units: U256) -> Result<i128, AppError> {
        if units > U256::from(i128::MAX as u128) {
            return Err(AppError::amount_overflow(
                "Amount exceeds i128 range required by the Soroban contract",
            ));
        }
        Ok(units.as_u128() as i128)
    }
}
