//! Account Command Handlers

use std::sync::Arc;

use crate::application::commands::{
    CreateAccountCommand, TopUpCreditsCommand, TopUpCreditsResponse,
};
use crate::application::error::ApplicationError;
use crate::application::ports::{AccountRecord, LedgerPort, PlanTier};
use crate::domain::TransactionKind;

/// CreateAccount Handler - 创建账户
///
/// 新账户余额从 0 开始，注册赠送通过一笔 bonus 流水入账，
/// 保证余额始终可由流水重放得到
pub struct CreateAccountHandler {
    ledger: Arc<dyn LedgerPort>,
    /// 注册赠送的信用点数
    free_trial_credits: i64,
}

impl CreateAccountHandler {
    pub fn new(ledger: Arc<dyn LedgerPort>, free_trial_credits: i64) -> Self {
        Self {
            ledger,
            free_trial_credits,
        }
    }

    pub async fn handle(
        &self,
        cmd: CreateAccountCommand,
    ) -> Result<AccountRecord, ApplicationError> {
        let email = cmd.email.trim();
        if email.is_empty() || !email.contains('@') {
            return Err(ApplicationError::validation(format!(
                "Invalid email: {}",
                cmd.email
            )));
        }

        let plan = match cmd.plan.as_deref() {
            None => PlanTier::default(),
            Some(s) => PlanTier::from_str(s)
                .ok_or_else(|| ApplicationError::validation(format!("Unknown plan: {}", s)))?,
        };

        let account = self.ledger.create_account(email, plan).await?;

        if self.free_trial_credits > 0 {
            self.ledger
                .credit(
                    account.id,
                    self.free_trial_credits,
                    TransactionKind::Bonus,
                    "Free trial credits",
                )
                .await?;
        }

        tracing::info!(
            account_id = %account.id,
            email = %account.email,
            plan = account.plan.as_str(),
            free_trial_credits = self.free_trial_credits,
            "Account created"
        );

        // 返回含赠送余额的最新状态
        let account = self
            .ledger
            .get_account(account.id)
            .await?
            .ok_or_else(|| ApplicationError::internal("Account vanished after creation"))?;

        Ok(account)
    }
}

/// TopUpCredits Handler - 账户入账
pub struct TopUpCreditsHandler {
    ledger: Arc<dyn LedgerPort>,
}

impl TopUpCreditsHandler {
    pub fn new(ledger: Arc<dyn LedgerPort>) -> Self {
        Self { ledger }
    }

    pub async fn handle(
        &self,
        cmd: TopUpCreditsCommand,
    ) -> Result<TopUpCreditsResponse, ApplicationError> {
        if cmd.amount <= 0 {
            return Err(ApplicationError::validation(format!(
                "Top-up amount must be positive, got {}",
                cmd.amount
            )));
        }

        let kind = match cmd.kind.as_deref() {
            None => TransactionKind::Purchase,
            Some(s) => TransactionKind::from_str(s)
                .ok_or_else(|| ApplicationError::validation(format!("Unknown kind: {}", s)))?,
        };

        // usage 只能由生成扣费产生
        if kind == TransactionKind::Usage {
            return Err(ApplicationError::business_rule(
                "Usage entries are created by task completion only",
            ));
        }

        let description = cmd
            .description
            .unwrap_or_else(|| format!("{} of {} credits", kind.as_str(), cmd.amount));

        let balance = self
            .ledger
            .credit(cmd.account_id, cmd.amount, kind, &description)
            .await?;

        tracing::info!(
            account_id = %cmd.account_id,
            amount = cmd.amount,
            kind = kind.as_str(),
            balance = balance,
            "Credits added"
        );

        Ok(TopUpCreditsResponse {
            account_id: cmd.account_id,
            balance,
        })
    }
}
