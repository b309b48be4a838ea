//! Unifies API for balances and withdrawals.
use std::fmt::Debug;

use log::*;
use lpg_common::Points;

use crate::{
    db_types::{Balance, NewWithdrawal, OrderNumber, Withdrawal},
    helpers::is_valid_order_number,
    lpe_api::errors::WithdrawalError,
    traits::{AccountApiError, AccountManagement},
};

/// The `AccountApi` reports user balances and debits them.
pub struct AccountApi<B> {
    db: B,
}

impl<B: Debug> Debug for AccountApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AccountApi ({:?})", self.db)
    }
}

impl<B> AccountApi<B>
where B: AccountManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub async fn balance(&self, user_id: i64) -> Result<Balance, AccountApiError> {
        self.db.fetch_balance(user_id).await
    }

    /// Spends `sum` points against the given order number.
    ///
    /// The order number must pass the Luhn check and the sum must be positive. The backend rejects the withdrawal if
    /// the balance is too low or the order number was used for a withdrawal before.
    pub async fn withdraw(&self, user_id: i64, order: &str, sum: Points) -> Result<Withdrawal, WithdrawalError> {
        let order = order.trim();
        if !is_valid_order_number(order) {
            return Err(WithdrawalError::InvalidOrderNumber(order.to_string()));
        }
        if !sum.is_positive() {
            return Err(WithdrawalError::NonPositiveSum);
        }
        let withdrawal = NewWithdrawal { user_id, order_number: OrderNumber::from(order), sum };
        let result = self.db.withdraw(withdrawal).await?;
        info!("💸️ User {user_id} withdrew {sum} against order {}", result.order_number);
        Ok(result)
    }

    /// All of the user's withdrawals, oldest first.
    pub async fn withdrawals(&self, user_id: i64) -> Result<Vec<Withdrawal>, AccountApiError> {
        self.db.fetch_withdrawals_for_user(user_id).await
    }
}
