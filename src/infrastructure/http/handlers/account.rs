//! Account Handlers

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::application::{
    CreateAccountCommand, GetAccountQuery, ListTransactionsQuery, TopUpCreditsCommand,
};
use crate::infrastructure::http::dto::ApiResponse;
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

// ============================================================================
// Create Account
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateAccountRequest {
    pub email: String,
    pub plan: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AccountResponse {
    pub id: Uuid,
    pub email: String,
    pub credits: i64,
    pub plan: String,
    pub created_at: String,
}

pub async fn create_account(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateAccountRequest>,
) -> Result<Json<ApiResponse<AccountResponse>>, ApiError> {
    let cmd = CreateAccountCommand {
        email: req.email,
        plan: req.plan,
    };

    let account = state.create_account_handler.handle(cmd).await?;

    Ok(Json(ApiResponse::success(AccountResponse {
        id: account.id,
        email: account.email,
        credits: account.credits,
        plan: account.plan.as_str().to_string(),
        created_at: account.created_at.to_rfc3339(),
    })))
}

// ============================================================================
// Get Account
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct GetAccountRequest {
    pub id: Uuid,
}

pub async fn get_account(
    State(state): State<Arc<AppState>>,
    Json(req): Json<GetAccountRequest>,
) -> Result<Json<ApiResponse<AccountResponse>>, ApiError> {
    let account = state
        .get_account_handler
        .handle(GetAccountQuery { account_id: req.id })
        .await?;

    Ok(Json(ApiResponse::success(AccountResponse {
        id: account.id,
        email: account.email,
        credits: account.credits,
        plan: account.plan.as_str().to_string(),
        created_at: account.created_at.to_rfc3339(),
    })))
}

// ============================================================================
// Top Up Credits
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct TopUpRequest {
    pub account_id: Uuid,
    pub amount: i64,
    pub kind: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TopUpResponse {
    pub account_id: Uuid,
    pub balance: i64,
}

pub async fn topup_credits(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TopUpRequest>,
) -> Result<Json<ApiResponse<TopUpResponse>>, ApiError> {
    let cmd = TopUpCreditsCommand {
        account_id: req.account_id,
        amount: req.amount,
        kind: req.kind,
        description: req.description,
    };

    let result = state.topup_credits_handler.handle(cmd).await?;

    Ok(Json(ApiResponse::success(TopUpResponse {
        account_id: result.account_id,
        balance: result.balance,
    })))
}

// ============================================================================
// List Transactions
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ListTransactionsRequest {
    pub account_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct TransactionDto {
    pub id: Uuid,
    pub amount: i64,
    pub kind: String,
    pub balance_after: i64,
    pub description: String,
    pub created_at: String,
}

#[derive(Debug, Serialize)]
pub struct ListTransactionsResponse {
    pub account_id: Uuid,
    pub transactions: Vec<TransactionDto>,
}

pub async fn list_transactions(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ListTransactionsRequest>,
) -> Result<Json<ApiResponse<ListTransactionsResponse>>, ApiError> {
    let entries = state
        .list_transactions_handler
        .handle(ListTransactionsQuery {
            account_id: req.account_id,
        })
        .await?;

    Ok(Json(ApiResponse::success(ListTransactionsResponse {
        account_id: req.account_id,
        transactions: entries
            .into_iter()
            .map(|e| TransactionDto {
                id: e.id,
                amount: e.amount,
                kind: e.kind.as_str().to_string(),
                balance_after: e.balance_after,
                description: e.description,
                created_at: e.created_at.to_rfc3339(),
            })
            .collect(),
    })))
}
