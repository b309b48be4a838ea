use lpg_common::Points;
use thiserror::Error;

use crate::db_types::{Balance, NewWithdrawal, OrderNumber, Withdrawal};

#[derive(Debug, Clone, Error)]
pub enum AccountApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Insufficient funds. Requested {requested}, but only {available} is available")]
    InsufficientFunds { requested: Points, available: Points },
    #[error("Order {0} has already been used for a withdrawal")]
    OrderAlreadyWithdrawn(OrderNumber),
}

impl From<sqlx::Error> for AccountApiError {
    fn from(e: sqlx::Error) -> Self {
        AccountApiError::DatabaseError(e.to_string())
    }
}

/// The `AccountManagement` trait defines behaviour for querying and debiting user balances.
///
/// A user's balance is derived, never stored: it is the total of the accruals on their `REGISTERED` orders, less
/// the total of their withdrawals.
#[allow(async_fn_in_trait)]
pub trait AccountManagement {
    async fn fetch_balance(&self, user_id: i64) -> Result<Balance, AccountApiError>;

    /// Fetches all withdrawals for the user, oldest first.
    async fn fetch_withdrawals_for_user(&self, user_id: i64) -> Result<Vec<Withdrawal>, AccountApiError>;

    /// Debits the user's balance. The balance check and the debit must happen atomically, so that two concurrent
    /// withdrawals can never overdraw the account.
    ///
    /// Fails with [`AccountApiError::InsufficientFunds`] if the balance does not cover the sum, and with
    /// [`AccountApiError::OrderAlreadyWithdrawn`] if the order number has been used for a withdrawal before.
    async fn withdraw(&self, withdrawal: NewWithdrawal) -> Result<Withdrawal, AccountApiError>;
}
