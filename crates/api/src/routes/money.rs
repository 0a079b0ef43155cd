//! Balance, history and money movement routes.

use std::future::Future;

use axum::{
    Json, Router,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use moneta_core::LedgerError;
use moneta_core::currency::Currency;
use moneta_core::ledger::{CreditOrDebitCommand, TransferCommand};
use moneta_core::pagination::Page;
use moneta_core::query::{ListRequest, Transaction};
use moneta_shared::types::{AccountId, TransactionId};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::AppState;
use crate::error::data_response;

/// Header carrying the client's idempotency key.
pub const IDEMPOTENCY_KEY: &str = "Idempotency-Key";

/// Creates the money routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/money", post(credit_or_debit))
        .route("/money/transfer", post(transfer))
        .route("/money/{account_id}", get(get_balance))
        .route("/money/{account_id}/transactions", get(list_transactions))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query parameters for reading a balance.
#[derive(Debug, Deserialize)]
pub struct BalanceQuery {
    /// Display currency, RUB when absent.
    pub currency: Option<String>,
}

/// Query parameters for listing transactions.
#[derive(Debug, Deserialize)]
pub struct ListTransactionsQuery {
    /// Cursor from a previous page.
    pub cursor: Option<String>,
    /// 0 = by date, 1 = by amount.
    pub sort: Option<String>,
    /// 0 = ascending, 1 = descending.
    pub order: Option<String>,
    /// Page size, 1 to 30.
    pub limit: Option<String>,
}

/// Request body for a transfer.
#[derive(Debug, Deserialize)]
pub struct TransferRequest {
    /// Paying account.
    pub from: String,
    /// Receiving account.
    pub to: String,
    /// Positive amount in kopecks.
    pub amount: i64,
    /// Free-text description.
    #[serde(default)]
    pub description: String,
}

/// Request body for a credit or debit.
#[derive(Debug, Deserialize)]
pub struct CreditOrDebitRequest {
    /// Affected account.
    pub account: String,
    /// Positive to credit, negative to debit.
    pub amount: i64,
    /// Free-text description.
    #[serde(default)]
    pub description: String,
}

/// One history row.
#[derive(Debug, Serialize)]
pub struct TransactionResponse {
    /// Ledger entry id.
    pub id: TransactionId,
    /// Signed amount from the listed account's side.
    pub amount: i64,
    /// Counterparty, empty for credits and debits.
    pub other_account_id: String,
    /// Description.
    pub description: String,
    /// Entry timestamp.
    pub updated_at: DateTime<Utc>,
}

impl From<Transaction> for TransactionResponse {
    fn from(transaction: Transaction) -> Self {
        Self {
            id: transaction.id,
            amount: transaction.amount,
            other_account_id: transaction
                .counterparty
                .map(|account| account.to_string())
                .unwrap_or_default(),
            description: transaction.description,
            updated_at: transaction.created_at,
        }
    }
}

/// One page of history.
#[derive(Debug, Serialize)]
pub struct ListTransactionsResponse {
    /// Rows of this page.
    pub transactions: Vec<TransactionResponse>,
    /// Page index and neighbouring cursors.
    pub page: Page,
    /// Entries in the whole history.
    pub count_item: u64,
}

// ============================================================================
// Route Handlers
// ============================================================================

/// GET `/money/{account_id}` - Balance in a display currency.
async fn get_balance(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
    query: Result<Query<BalanceQuery>, QueryRejection>,
) -> Response {
    let request = query.map_err(|_| LedgerError::InvalidRequest).and_then(|Query(query)| {
        let account = account_id
            .trim()
            .parse::<AccountId>()
            .map_err(|_| LedgerError::InvalidAccountId)?;
        let currency = Currency::parse(query.currency.as_deref())?;
        Ok((account, currency))
    });
    let (account, currency) = match request {
        Ok(request) => request,
        Err(e) => return state.errors.respond(&e),
    };

    match state.money.get_balance(account, currency).await {
        Ok(balance) => (StatusCode::OK, Json(balance)).into_response(),
        Err(e) => state.errors.respond(&e),
    }
}

/// GET `/money/{account_id}/transactions` - One page of history.
async fn list_transactions(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
    query: Result<Query<ListTransactionsQuery>, QueryRejection>,
) -> Response {
    let request = query.map_err(|_| LedgerError::InvalidRequest).and_then(|Query(query)| {
        ListRequest::parse(
            &account_id,
            query.cursor.as_deref(),
            query.sort.as_deref(),
            query.order.as_deref(),
            query.limit.as_deref(),
        )
    });
    let request = match request {
        Ok(request) => request,
        Err(e) => return state.errors.respond(&e),
    };

    match state.money.list_transactions(request).await {
        Ok(page) => {
            let body = ListTransactionsResponse {
                transactions: page
                    .transactions
                    .into_iter()
                    .map(TransactionResponse::from)
                    .collect(),
                page: page.page,
                count_item: page.count_item,
            };
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => state.errors.respond(&e),
    }
}

/// POST `/money/transfer` - Move money between two accounts.
async fn transfer(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<TransferRequest>, JsonRejection>,
) -> Response {
    let command = idempotency_key(&headers).and_then(|key| {
        let Json(body) = body.map_err(|_| LedgerError::InvalidRequest)?;
        TransferCommand::new(key, &body.from, &body.to, body.amount, body.description)
    });
    let command = match command {
        Ok(command) => command,
        Err(e) => return state.errors.respond(&e),
    };

    let money = state.money.clone();
    run_mutation(&state, async move { money.transfer(command).await }).await
}

/// POST `/money` - Credit or debit one account.
async fn credit_or_debit(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<CreditOrDebitRequest>, JsonRejection>,
) -> Response {
    let command = idempotency_key(&headers).and_then(|key| {
        let Json(body) = body.map_err(|_| LedgerError::InvalidRequest)?;
        CreditOrDebitCommand::new(key, &body.account, body.amount, body.description)
    });
    let command = match command {
        Ok(command) => command,
        Err(e) => return state.errors.respond(&e),
    };

    let money = state.money.clone();
    run_mutation(&state, async move { money.credit_or_debit(command).await }).await
}

// ============================================================================
// Helpers
// ============================================================================

/// Reads the idempotency key header. A value that is not visible ASCII
/// cannot be a UUID.
fn idempotency_key(headers: &HeaderMap) -> Result<Option<&str>, LedgerError> {
    headers
        .get(IDEMPOTENCY_KEY)
        .map(|value| {
            value
                .to_str()
                .map_err(|_| LedgerError::InvalidIdempotencyKey)
        })
        .transpose()
}

/// Runs a mutation on its own task so a dropped connection cannot cancel it
/// halfway through.
async fn run_mutation<F>(state: &AppState, mutation: F) -> Response
where
    F: Future<Output = Result<TransactionId, LedgerError>> + Send + 'static,
{
    let outcome = tokio::spawn(mutation)
        .await
        .unwrap_or_else(|e| {
            error!(error = %e, "Mutation task failed");
            Err(LedgerError::internal(e))
        });

    match outcome {
        Ok(id) => {
            debug!(transaction_id = %id, "Mutation applied");
            data_response(id)
        }
        Err(e) => state.errors.respond(&e),
    }
}
