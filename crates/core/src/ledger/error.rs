//! Ledger error types.
//!
//! One tagged enumeration covers request validation, pagination, ledger
//! mutation, and currency conversion. Storage adapters translate their own
//! failures into these conditions before anything leaves the repository layer.

use moneta_shared::types::TransactionId;
use thiserror::Error;

/// Boxed error cause carried by the catch-all variants.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    // ========== Request Errors ==========
    /// Malformed request body or parameter.
    #[error("invalid request")]
    InvalidRequest,

    /// Account id is not a valid identifier.
    #[error("invalid account id")]
    InvalidAccountId,

    /// Supplied idempotency key is not a UUID.
    #[error("invalid idempotency key, must be a uuid")]
    InvalidIdempotencyKey,

    /// Pagination cursor could not be decoded.
    #[error("invalid cursor")]
    InvalidCursor,

    /// Unknown `sort` code.
    #[error("unsupported sort field")]
    UnsupportedSortField,

    /// Unknown `order` code.
    #[error("unsupported sort direction")]
    UnsupportedSortDirection,

    /// Transfer names the same account on both sides.
    #[error("can't transfer money to the same account")]
    TransferToSelf,

    // ========== Account Errors ==========
    /// Account absent on a balance read.
    #[error("account not found")]
    NotFound,

    /// Mutation would take a balance below zero.
    #[error("not enough money on account")]
    NotEnoughMoney,

    /// Mutation names an account that does not exist.
    #[error("account does not exist")]
    AccountNotExist,

    /// The ledger entry for this idempotency key already exists.
    ///
    /// Callers treat this as a successful replay, not a failure.
    #[error("duplicate idempotency key")]
    DuplicateIdempotencyKey(TransactionId),

    // ========== Currency Errors ==========
    /// Requested display currency is unknown.
    #[error("not supported currency")]
    NotSupportedCurrency,

    /// Rate lookup or conversion failed.
    #[error("failed convert")]
    FailedConvert(#[source] BoxError),

    // ========== Internal Errors ==========
    /// Unexpected failure. Logged server-side, never shown to clients.
    #[error("internal error: {0}")]
    Internal(#[source] BoxError),
}

impl LedgerError {
    /// Wraps an unexpected failure.
    pub fn internal(cause: impl Into<BoxError>) -> Self {
        Self::Internal(cause.into())
    }

    /// Wraps a conversion failure.
    pub fn failed_convert(cause: impl Into<BoxError>) -> Self {
        Self::FailedConvert(cause.into())
    }

    /// Returns the stable numeric code for API responses.
    #[must_use]
    pub fn error_code(&self) -> u32 {
        match self {
            Self::Internal(_) => 100,
            Self::InvalidRequest => 101,
            Self::NotFound => 102,
            Self::InvalidAccountId => 103,
            Self::NotSupportedCurrency => 104,
            Self::InvalidIdempotencyKey => 105,
            Self::InvalidCursor => 106,
            Self::UnsupportedSortField => 107,
            Self::UnsupportedSortDirection => 108,
            Self::TransferToSelf => 109,
            Self::NotEnoughMoney => 110,
            Self::AccountNotExist => 111,
            Self::DuplicateIdempotencyKey(_) => 112,
            Self::FailedConvert(_) => 113,
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            // 200 OK - idempotent replay
            Self::DuplicateIdempotencyKey(_) => 200,

            // 400 Bad Request - validation errors
            Self::InvalidRequest
            | Self::InvalidAccountId
            | Self::InvalidIdempotencyKey
            | Self::InvalidCursor
            | Self::UnsupportedSortField
            | Self::UnsupportedSortDirection
            | Self::TransferToSelf
            | Self::NotSupportedCurrency => 400,

            // 404 Not Found
            Self::NotFound | Self::AccountNotExist => 404,

            // 422 Unprocessable Entity - business rule violations
            Self::NotEnoughMoney => 422,

            // 502 Bad Gateway - rate provider failures
            Self::FailedConvert(_) => 502,

            // 500 Internal Server Error
            Self::Internal(_) => 500,
        }
    }

    /// Returns true for conditions recognised at the storage boundary.
    ///
    /// These pass through a unit of work verbatim; anything else is wrapped.
    #[must_use]
    pub fn is_domain(&self) -> bool {
        !matches!(self, Self::Internal(_))
    }

    /// Message safe to show to API clients.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::Internal(_) => "unexpected error".to_string(),
            other => other.to_string(),
        }
    }
}
