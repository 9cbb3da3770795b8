//! Credit Billing - 信用点计费策略
//!
//! 定义信用点交易类型与文本计费规则，计费单位可配置
//! （按字符 / 按单词 / 按字母）

use serde::{Deserialize, Serialize};

/// 预估基础耗时（秒）
const BASE_SECS: f64 = 30.0;

/// 每字符预估合成耗时（秒）
const SECONDS_PER_CHAR: f64 = 5.4;

/// 信用点交易类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    /// 购买
    Purchase,
    /// 消耗（生成扣费）
    Usage,
    /// 赠送
    Bonus,
    /// 退款
    Refund,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Purchase => "purchase",
            TransactionKind::Usage => "usage",
            TransactionKind::Bonus => "bonus",
            TransactionKind::Refund => "refund",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "purchase" => Some(TransactionKind::Purchase),
            "usage" => Some(TransactionKind::Usage),
            "bonus" => Some(TransactionKind::Bonus),
            "refund" => Some(TransactionKind::Refund),
            _ => None,
        }
    }
}

/// 计费单位模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreditCalculation {
    /// 按字符计费（含空格和标点）
    PerCharacter,
    /// 按单词计费（空白分隔）
    PerWord,
    /// 按字母计费（只统计字母）
    PerLetter,
}

impl Default for CreditCalculation {
    fn default() -> Self {
        CreditCalculation::PerCharacter
    }
}

impl CreditCalculation {
    pub fn as_str(&self) -> &'static str {
        match self {
            CreditCalculation::PerCharacter => "per_character",
            CreditCalculation::PerWord => "per_word",
            CreditCalculation::PerLetter => "per_letter",
        }
    }

    /// 计费单位名称（用于账单描述）
    pub fn unit_name(&self) -> &'static str {
        match self {
            CreditCalculation::PerCharacter => "characters",
            CreditCalculation::PerWord => "words",
            CreditCalculation::PerLetter => "letters",
        }
    }
}

/// 计费策略
///
/// 由配置注入，不使用全局单例
#[derive(Debug, Clone, Copy)]
pub struct CreditPolicy {
    pub calculation: CreditCalculation,
    pub credits_per_unit: i64,
}

impl CreditPolicy {
    pub fn new(calculation: CreditCalculation, credits_per_unit: i64) -> Self {
        Self {
            calculation,
            credits_per_unit,
        }
    }

    /// 计算文本的计费单位数
    pub fn units(&self, text: &str) -> i64 {
        match self.calculation {
            CreditCalculation::PerCharacter => text.chars().count() as i64,
            CreditCalculation::PerWord => text.split_whitespace().count() as i64,
            CreditCalculation::PerLetter => text.chars().filter(|c| c.is_alphabetic()).count() as i64,
        }
    }

    /// 计算文本所需信用点
    pub fn credits_needed(&self, text: &str) -> i64 {
        self.units(text) * self.credits_per_unit
    }
}

/// 预估合成耗时（秒），基于字符数的线性模型
pub fn estimate_secs(char_count: usize) -> i64 {
    (BASE_SECS + char_count as f64 * SECONDS_PER_CHAR) as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_units_per_character() {
        let policy = CreditPolicy::new(CreditCalculation::PerCharacter, 1);
        assert_eq!(policy.units("hello world!"), 12);
    }

    #[test]
    fn test_units_per_word() {
        let policy = CreditPolicy::new(CreditCalculation::PerWord, 1);
        assert_eq!(policy.units("hello  brave new world"), 4);
    }

    #[test]
    fn test_units_per_letter_skips_punctuation() {
        let policy = CreditPolicy::new(CreditCalculation::PerLetter, 1);
        assert_eq!(policy.units("a b, c!"), 3);
    }

    #[test]
    fn test_credits_needed_applies_rate() {
        let policy = CreditPolicy::new(CreditCalculation::PerCharacter, 3);
        assert_eq!(policy.credits_needed("abcd"), 12);
    }

    #[test]
    fn test_estimate_secs() {
        assert_eq!(estimate_secs(0), 30);
        assert_eq!(estimate_secs(40), 246);
    }

    #[test]
    fn test_transaction_kind_round_trip() {
        for kind in [
            TransactionKind::Purchase,
            TransactionKind::Usage,
            TransactionKind::Bonus,
            TransactionKind::Refund,
        ] {
            assert_eq!(TransactionKind::from_str(kind.as_str()), Some(kind));
        }
        assert_eq!(TransactionKind::from_str("unknown"), None);
    }
}
