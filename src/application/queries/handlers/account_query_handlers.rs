//! Account Query Handlers

use std::sync::Arc;

use crate::application::error::ApplicationError;
use crate::application::ports::{AccountRecord, LedgerEntry, LedgerPort};
use crate::application::queries::{GetAccountQuery, ListTransactionsQuery};

/// GetAccount Handler - 查询账户
pub struct GetAccountHandler {
    ledger: Arc<dyn LedgerPort>,
}

impl GetAccountHandler {
    pub fn new(ledger: Arc<dyn LedgerPort>) -> Self {
        Self { ledger }
    }

    pub async fn handle(&self, query: GetAccountQuery) -> Result<AccountRecord, ApplicationError> {
        self.ledger
            .get_account(query.account_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Account", query.account_id))
    }
}

/// ListTransactions Handler - 查询账户流水
pub struct ListTransactionsHandler {
    ledger: Arc<dyn LedgerPort>,
}

impl ListTransactionsHandler {
    pub fn new(ledger: Arc<dyn LedgerPort>) -> Self {
        Self { ledger }
    }

    pub async fn handle(
        &self,
        query: ListTransactionsQuery,
    ) -> Result<Vec<LedgerEntry>, ApplicationError> {
        // 账户不存在时返回 NotFound 而不是空列表
        self.ledger
            .get_account(query.account_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Account", query.account_id))?;

        Ok(self.ledger.entries(query.account_id).await?)
    }
}
