use thiserror::Error;

use crate::db_types::{NewOrder, Order, OrderNumber};

#[derive(Debug, Clone, Error)]
pub enum OrderManagementError {
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<sqlx::Error> for OrderManagementError {
    fn from(e: sqlx::Error) -> Self {
        OrderManagementError::DatabaseError(e.to_string())
    }
}

/// The result of an idempotent order insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOrderResult {
    /// The order was new, and has been stored.
    Inserted(Order),
    /// An order with the same number already exists. The stored order is returned, whoever it belongs to.
    AlreadyExists(Order),
}

impl InsertOrderResult {
    pub fn order(&self) -> &Order {
        match self {
            InsertOrderResult::Inserted(o) | InsertOrderResult::AlreadyExists(o) => o,
        }
    }
}

/// The `OrderManagement` trait covers order uploads and order histories.
#[allow(async_fn_in_trait)]
pub trait OrderManagement {
    /// Stores a new order in the `NEW` state. The call is idempotent: if the order number is already known, the
    /// existing order is returned untouched as [`InsertOrderResult::AlreadyExists`].
    async fn insert_order(&self, order: NewOrder) -> Result<InsertOrderResult, OrderManagementError>;

    /// Fetches all orders for the user, oldest upload first.
    async fn fetch_orders_for_user(&self, user_id: i64) -> Result<Vec<Order>, OrderManagementError>;

    /// Returns true if the order number has already been used to withdraw points.
    async fn order_has_withdrawal(&self, order_number: &OrderNumber) -> Result<bool, OrderManagementError>;
}
