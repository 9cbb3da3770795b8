//! Ledger Port - 账户与信用账本
//!
//! 账本为只追加流水表，余额变更与流水写入必须在同一事务内完成。
//! 不变式：按创建顺序重放某账户的全部流水，必须精确得到当前余额。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::TransactionKind;

/// Ledger 错误
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Account not found: {0}")]
    AccountNotFound(Uuid),

    #[error("Insufficient funds: required {required}, available {available}")]
    InsufficientFunds { required: i64, available: i64 },

    #[error("Duplicate account: {0}")]
    DuplicateAccount(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(i64),

    #[error("Storage error: {0}")]
    StorageError(String),
}

/// 账户套餐
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanTier {
    Free,
    Starter,
    Basic,
    Pro,
}

impl Default for PlanTier {
    fn default() -> Self {
        PlanTier::Free
    }
}

impl PlanTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanTier::Free => "free",
            PlanTier::Starter => "starter",
            PlanTier::Basic => "basic",
            PlanTier::Pro => "pro",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "free" => Some(PlanTier::Free),
            "starter" => Some(PlanTier::Starter),
            "basic" => Some(PlanTier::Basic),
            "pro" => Some(PlanTier::Pro),
            _ => None,
        }
    }
}

/// 账户记录
#[derive(Debug, Clone)]
pub struct AccountRecord {
    pub id: Uuid,
    pub email: String,
    /// 当前余额，永不为负
    pub credits: i64,
    pub plan: PlanTier,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 账本流水（不可变，创建后不修改不删除）
#[derive(Debug, Clone)]
pub struct LedgerEntry {
    pub id: Uuid,
    pub account_id: Uuid,
    /// 带符号金额：credit 为正，debit 为负
    pub amount: i64,
    pub kind: TransactionKind,
    /// 该笔流水落账后的余额
    pub balance_after: i64,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

/// Ledger Port
///
/// debit/credit 必须原子执行（余额更新 + 流水写入同一事务），
/// 同一账户的并发扣费以此为串行化点
#[async_trait]
pub trait LedgerPort: Send + Sync {
    /// 创建账户，初始余额为 0
    async fn create_account(&self, email: &str, plan: PlanTier) -> Result<AccountRecord, LedgerError>;

    /// 根据 ID 查找账户
    async fn get_account(&self, account_id: Uuid) -> Result<Option<AccountRecord>, LedgerError>;

    /// 扣费，余额不足时失败且余额不变，返回新余额
    async fn debit(
        &self,
        account_id: Uuid,
        amount: i64,
        description: &str,
    ) -> Result<i64, LedgerError>;

    /// 充值 / 赠送 / 退款，总是成功（账户存在时），返回新余额
    async fn credit(
        &self,
        account_id: Uuid,
        amount: i64,
        kind: TransactionKind,
        description: &str,
    ) -> Result<i64, LedgerError>;

    /// 当前余额
    async fn balance(&self, account_id: Uuid) -> Result<i64, LedgerError>;

    /// 账户的全部流水（按创建时间倒序）
    async fn entries(&self, account_id: Uuid) -> Result<Vec<LedgerEntry>, LedgerError>;
}
