//! 转账请求领域模型
//!
//! TransferRequest每次提交动作新建一份，交给组装器后不可变，
//! 外部广播返回后即丢弃（成功清空表单，失败保留以便重试）。

use ethers::types::U256;
use serde::Serialize;

use crate::domain::chain::{Chain, Token};

/// 收款人条目
#[derive(Debug, Clone, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub struct Recipient {
    /// 展示名（员工选择路径填充）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// 链特定格式的地址，已通过对应家族的地址校验
    pub address: String,
    /// 用户录入的十进制金额字符串
    pub amount: String,
}

/// 单个收款条目的校验问题
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct ValidationIssue {
    /// 条目序号（解析输入中的位置）
    pub index: usize,
    /// 出错字段
    pub field: ValidationField,
    /// 问题说明（可直接展示给用户）
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ValidationField {
    Address,
    Amount,
}

/// 累积式校验报告
///
/// 策略：逐条校验并收集全部问题而非首错即停，UI需要一次性展示所有错误
#[derive(Debug, Clone, Default, Serialize, utoipa::ToSchema)]
pub struct ValidationReport {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn push(&mut self, index: usize, field: ValidationField, message: impl Into<String>) {
        self.issues.push(ValidationIssue {
            index,
            field,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }
}

/// 不可变的批量转账请求
///
/// 不变式：recipients与normalized_amounts等长且同序；
/// aggregate为归一化金额之和（U256累加，不经过浮点）。
/// 不去重：同一地址出现多次则多次独立支付（保留线上观察到的行为）。
#[derive(Debug, Clone)]
pub struct TransferRequest {
    pub chain_key: String,
    pub token: Token,
    pub recipients: Vec<Recipient>,
    /// 每个收款人的基础单位整数金额，与recipients同序
    pub normalized_amounts: Vec<U256>,
    /// 归一化金额合计
    pub aggregate: U256,
}

impl TransferRequest {
    /// 是否为原生币转账（跳过AllowanceGate，合计金额挂到value字段）
    pub fn is_native(&self, chain: &Chain) -> bool {
        self.token.is_native(chain.family)
    }
}
