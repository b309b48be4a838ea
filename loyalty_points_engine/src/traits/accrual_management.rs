use std::future::Future;

use thiserror::Error;

use crate::db_types::{AccrualResult, OrderNumber};

#[derive(Debug, Clone, Error)]
pub enum AccrualStoreError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Order {0} does not exist")]
    OrderNotFound(OrderNumber),
}

impl From<sqlx::Error> for AccrualStoreError {
    fn from(e: sqlx::Error) -> Self {
        AccrualStoreError::DatabaseError(e.to_string())
    }
}

/// The order store behind the accrual pipeline.
///
/// Implementations are shared between the discovery task and every worker task, hence the `Clone + Send + Sync`
/// bounds and the `Send` futures.
pub trait AccrualManagement: Clone + Send + Sync + 'static {
    /// Returns up to `limit` order numbers whose status is `NEW` or `PROCESSING`. Orders that have never been checked
    /// come first, then the ones checked longest ago.
    fn list_non_terminal(
        &self,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<OrderNumber>, AccrualStoreError>> + Send;

    /// Writes the accrual service's verdict back to the order. Last write wins, so applying the same result twice
    /// leaves the same stored state, timestamps included.
    fn write_result(&self, result: &AccrualResult) -> impl Future<Output = Result<(), AccrualStoreError>> + Send;

    /// Records that the accrual service is about to be asked about the order. Called for every lookup, whether or not
    /// it produces a result, so that unanswered orders rotate behind the rest in [`list_non_terminal`].
    ///
    /// [`list_non_terminal`]: AccrualManagement::list_non_terminal
    fn mark_checked(&self, order_number: &OrderNumber) -> impl Future<Output = Result<(), AccrualStoreError>> + Send;
}
