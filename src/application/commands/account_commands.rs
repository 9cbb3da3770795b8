//! Account Commands - 账户命令定义

use uuid::Uuid;

/// 创建账户
#[derive(Debug, Clone)]
pub struct CreateAccountCommand {
    pub email: String,
    /// 套餐，缺省为 free
    pub plan: Option<String>,
}

/// 账户充值（购买 / 赠送 / 退款入账）
#[derive(Debug, Clone)]
pub struct TopUpCreditsCommand {
    pub account_id: Uuid,
    pub amount: i64,
    /// 交易类型，缺省为 purchase
    pub kind: Option<String>,
    pub description: Option<String>,
}

/// 充值结果
#[derive(Debug, Clone)]
pub struct TopUpCreditsResponse {
    pub account_id: Uuid,
    pub balance: i64,
}
