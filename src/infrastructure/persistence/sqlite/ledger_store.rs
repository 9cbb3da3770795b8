//! SQLite Ledger Store
//!
//! 余额更新与流水写入在同一事务内完成；扣费通过条件 UPDATE
//! （credits >= amount）实现，同一账户的并发扣费在此串行化，
//! 余额永不为负。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use super::DbPool;
use crate::application::ports::{AccountRecord, LedgerEntry, LedgerError, LedgerPort, PlanTier};
use crate::domain::TransactionKind;

/// SQLite Ledger Store
pub struct SqliteLedgerStore {
    pool: DbPool,
}

impl SqliteLedgerStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct AccountRow {
    id: String,
    email: String,
    credits: i64,
    plan: String,
    created_at: String,
    updated_at: String,
}

impl TryFrom<AccountRow> for AccountRecord {
    type Error = LedgerError;

    fn try_from(row: AccountRow) -> Result<Self, Self::Error> {
        Ok(AccountRecord {
            id: Uuid::parse_str(&row.id).map_err(|e| LedgerError::StorageError(e.to_string()))?,
            email: row.email,
            credits: row.credits,
            plan: PlanTier::from_str(&row.plan)
                .ok_or_else(|| LedgerError::StorageError(format!("Unknown plan: {}", row.plan)))?,
            created_at: parse_timestamp(&row.created_at)?,
            updated_at: parse_timestamp(&row.updated_at)?,
        })
    }
}

#[derive(FromRow)]
struct LedgerEntryRow {
    id: String,
    account_id: String,
    amount: i64,
    kind: String,
    balance_after: i64,
    description: String,
    created_at: String,
}

impl TryFrom<LedgerEntryRow> for LedgerEntry {
    type Error = LedgerError;

    fn try_from(row: LedgerEntryRow) -> Result<Self, Self::Error> {
        Ok(LedgerEntry {
            id: Uuid::parse_str(&row.id).map_err(|e| LedgerError::StorageError(e.to_string()))?,
            account_id: Uuid::parse_str(&row.account_id)
                .map_err(|e| LedgerError::StorageError(e.to_string()))?,
            amount: row.amount,
            kind: TransactionKind::from_str(&row.kind)
                .ok_or_else(|| LedgerError::StorageError(format!("Unknown kind: {}", row.kind)))?,
            balance_after: row.balance_after,
            description: row.description,
            created_at: parse_timestamp(&row.created_at)?,
        })
    }
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, LedgerError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| LedgerError::StorageError(e.to_string()))
}

#[async_trait]
impl LedgerPort for SqliteLedgerStore {
    async fn create_account(
        &self,
        email: &str,
        plan: PlanTier,
    ) -> Result<AccountRecord, LedgerError> {
        let now = Utc::now();
        let account = AccountRecord {
            id: Uuid::new_v4(),
            email: email.to_string(),
            credits: 0,
            plan,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO accounts (id, email, credits, plan, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(account.id.to_string())
        .bind(&account.email)
        .bind(account.credits)
        .bind(account.plan.as_str())
        .bind(account.created_at.to_rfc3339())
        .bind(account.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if e.as_database_error()
                .map(|d| d.is_unique_violation())
                .unwrap_or(false)
            {
                LedgerError::DuplicateAccount(email.to_string())
            } else {
                LedgerError::StorageError(e.to_string())
            }
        })?;

        Ok(account)
    }

    async fn get_account(&self, account_id: Uuid) -> Result<Option<AccountRecord>, LedgerError> {
        let row: Option<AccountRow> = sqlx::query_as(
            "SELECT id, email, credits, plan, created_at, updated_at FROM accounts WHERE id = ?",
        )
        .bind(account_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| LedgerError::StorageError(e.to_string()))?;

        row.map(AccountRecord::try_from).transpose()
    }

    async fn debit(
        &self,
        account_id: Uuid,
        amount: i64,
        description: &str,
    ) -> Result<i64, LedgerError> {
        if amount <= 0 {
            return Err(LedgerError::InvalidAmount(amount));
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| LedgerError::StorageError(e.to_string()))?;

        // 条件 UPDATE：余额不足时不会命中任何行
        let result = sqlx::query(
            r#"
            UPDATE accounts SET credits = credits - ?, updated_at = ?
            WHERE id = ? AND credits >= ?
            "#,
        )
        .bind(amount)
        .bind(Utc::now().to_rfc3339())
        .bind(account_id.to_string())
        .bind(amount)
        .execute(&mut *tx)
        .await
        .map_err(|e| LedgerError::StorageError(e.to_string()))?;

        if result.rows_affected() == 0 {
            let available: Option<i64> =
                sqlx::query_scalar("SELECT credits FROM accounts WHERE id = ?")
                    .bind(account_id.to_string())
                    .fetch_optional(&mut *tx)
                    .await
                    .map_err(|e| LedgerError::StorageError(e.to_string()))?;

            // 事务里没有写入，回滚只是释放连接
            tx.rollback()
                .await
                .map_err(|e| LedgerError::StorageError(e.to_string()))?;

            return match available {
                None => Err(LedgerError::AccountNotFound(account_id)),
                Some(available) => Err(LedgerError::InsufficientFunds {
                    required: amount,
                    available,
                }),
            };
        }

        let balance_after: i64 = sqlx::query_scalar("SELECT credits FROM accounts WHERE id = ?")
            .bind(account_id.to_string())
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| LedgerError::StorageError(e.to_string()))?;

        insert_entry(
            &mut tx,
            account_id,
            -amount,
            TransactionKind::Usage,
            balance_after,
            description,
        )
        .await?;

        tx.commit()
            .await
            .map_err(|e| LedgerError::StorageError(e.to_string()))?;

        tracing::debug!(
            account_id = %account_id,
            amount = amount,
            balance_after = balance_after,
            "Credits debited"
        );

        Ok(balance_after)
    }

    async fn credit(
        &self,
        account_id: Uuid,
        amount: i64,
        kind: TransactionKind,
        description: &str,
    ) -> Result<i64, LedgerError> {
        if amount <= 0 {
            return Err(LedgerError::InvalidAmount(amount));
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| LedgerError::StorageError(e.to_string()))?;

        let result = sqlx::query(
            "UPDATE accounts SET credits = credits + ?, updated_at = ? WHERE id = ?",
        )
        .bind(amount)
        .bind(Utc::now().to_rfc3339())
        .bind(account_id.to_string())
        .execute(&mut *tx)
        .await
        .map_err(|e| LedgerError::StorageError(e.to_string()))?;

        if result.rows_affected() == 0 {
            tx.rollback()
                .await
                .map_err(|e| LedgerError::StorageError(e.to_string()))?;
            return Err(LedgerError::AccountNotFound(account_id));
        }

        let balance_after: i64 = sqlx::query_scalar("SELECT credits FROM accounts WHERE id = ?")
            .bind(account_id.to_string())
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| LedgerError::StorageError(e.to_string()))?;

        insert_entry(&mut tx, account_id, amount, kind, balance_after, description).await?;

        tx.commit()
            .await
            .map_err(|e| LedgerError::StorageError(e.to_string()))?;

        tracing::debug!(
            account_id = %account_id,
            amount = amount,
            kind = kind.as_str(),
            balance_after = balance_after,
            "Credits added"
        );

        Ok(balance_after)
    }

    async fn balance(&self, account_id: Uuid) -> Result<i64, LedgerError> {
        sqlx::query_scalar("SELECT credits FROM accounts WHERE id = ?")
            .bind(account_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| LedgerError::StorageError(e.to_string()))?
            .ok_or(LedgerError::AccountNotFound(account_id))
    }

    async fn entries(&self, account_id: Uuid) -> Result<Vec<LedgerEntry>, LedgerError> {
        let rows: Vec<LedgerEntryRow> = sqlx::query_as(
            r#"
            SELECT id, account_id, amount, kind, balance_after, description, created_at
            FROM ledger_entries WHERE account_id = ? ORDER BY created_at DESC
            "#,
        )
        .bind(account_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| LedgerError::StorageError(e.to_string()))?;

        rows.into_iter().map(LedgerEntry::try_from).collect()
    }
}

/// 在当前事务内追加一笔流水
async fn insert_entry(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    account_id: Uuid,
    amount: i64,
    kind: TransactionKind,
    balance_after: i64,
    description: &str,
) -> Result<(), LedgerError> {
    sqlx::query(
        r#"
        INSERT INTO ledger_entries (id, account_id, amount, kind, balance_after, description, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(account_id.to_string())
    .bind(amount)
    .bind(kind.as_str())
    .bind(balance_after)
    .bind(description)
    .bind(Utc::now().to_rfc3339())
    .execute(&mut **tx)
    .await
    .map_err(|e| LedgerError::StorageError(e.to_string()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::persistence::sqlite::{create_pool, run_migrations, DatabaseConfig};

    async fn setup() -> SqliteLedgerStore {
        let pool = create_pool(&DatabaseConfig::in_memory()).await.unwrap();
        run_migrations(&pool).await.unwrap();
        SqliteLedgerStore::new(pool)
    }

    #[tokio::test]
    async fn test_create_and_get_account() {
        let store = setup().await;
        let account = store
            .create_account("user@example.com", PlanTier::Free)
            .await
            .unwrap();

        let found = store.get_account(account.id).await.unwrap().unwrap();
        assert_eq!(found.email, "user@example.com");
        assert_eq!(found.credits, 0);
        assert_eq!(found.plan, PlanTier::Free);
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let store = setup().await;
        store
            .create_account("dup@example.com", PlanTier::Free)
            .await
            .unwrap();
        let result = store.create_account("dup@example.com", PlanTier::Pro).await;
        assert!(matches!(result, Err(LedgerError::DuplicateAccount(_))));
    }

    #[tokio::test]
    async fn test_credit_and_debit() {
        let store = setup().await;
        let account = store
            .create_account("user@example.com", PlanTier::Free)
            .await
            .unwrap();

        let balance = store
            .credit(account.id, 100, TransactionKind::Purchase, "Purchase")
            .await
            .unwrap();
        assert_eq!(balance, 100);

        let balance = store.debit(account.id, 30, "Generated audio").await.unwrap();
        assert_eq!(balance, 70);
        assert_eq!(store.balance(account.id).await.unwrap(), 70);
    }

    #[tokio::test]
    async fn test_debit_insufficient_funds_leaves_balance_unchanged() {
        let store = setup().await;
        let account = store
            .create_account("user@example.com", PlanTier::Free)
            .await
            .unwrap();
        store
            .credit(account.id, 50, TransactionKind::Purchase, "Purchase")
            .await
            .unwrap();

        let result = store.debit(account.id, 100, "Too expensive").await;
        assert!(matches!(
            result,
            Err(LedgerError::InsufficientFunds {
                required: 100,
                available: 50
            })
        ));

        // 余额不变，且没有写入 usage 流水
        assert_eq!(store.balance(account.id).await.unwrap(), 50);
        let entries = store.entries(account.id).await.unwrap();
        assert_eq!(entries.len(), 1);
    }

    #[tokio::test]
    async fn test_ledger_replay_reproduces_balance() {
        let store = setup().await;
        let account = store
            .create_account("user@example.com", PlanTier::Free)
            .await
            .unwrap();

        store
            .credit(account.id, 1000, TransactionKind::Bonus, "Trial")
            .await
            .unwrap();
        store.debit(account.id, 300, "Usage 1").await.unwrap();
        store
            .credit(account.id, 500, TransactionKind::Purchase, "Purchase")
            .await
            .unwrap();
        store.debit(account.id, 120, "Usage 2").await.unwrap();
        store
            .credit(account.id, 40, TransactionKind::Refund, "Refund")
            .await
            .unwrap();

        let entries = store.entries(account.id).await.unwrap();
        let replayed: i64 = entries.iter().map(|e| e.amount).sum();
        assert_eq!(replayed, store.balance(account.id).await.unwrap());
        assert_eq!(replayed, 1120);

        // 每笔流水的 balance_after 与其前缀和一致（倒序返回，从尾部重放）
        let mut running = 0;
        for entry in entries.iter().rev() {
            running += entry.amount;
            assert_eq!(entry.balance_after, running);
        }
    }

    #[tokio::test]
    async fn test_debit_unknown_account() {
        let store = setup().await;
        let result = store.debit(Uuid::new_v4(), 10, "ghost").await;
        assert!(matches!(result, Err(LedgerError::AccountNotFound(_))));
    }

    #[tokio::test]
    async fn test_invalid_amounts_rejected() {
        let store = setup().await;
        let account = store
            .create_account("user@example.com", PlanTier::Free)
            .await
            .unwrap();

        assert!(matches!(
            store.debit(account.id, 0, "zero").await,
            Err(LedgerError::InvalidAmount(0))
        ));
        assert!(matches!(
            store
                .credit(account.id, -5, TransactionKind::Purchase, "negative")
                .await,
            Err(LedgerError::InvalidAmount(-5))
        ));
    }
}
