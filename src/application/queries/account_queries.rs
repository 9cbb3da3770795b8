//! Account Queries - 账户查询定义

use uuid::Uuid;

/// 查询账户
#[derive(Debug, Clone)]
pub struct GetAccountQuery {
    pub account_id: Uuid,
}

/// 查询账户流水
#[derive(Debug, Clone)]
pub struct ListTransactionsQuery {
    pub account_id: Uuid,
}
