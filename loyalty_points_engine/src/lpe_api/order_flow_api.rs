use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{NewOrder, Order, OrderNumber},
    helpers::is_valid_order_number,
    lpe_api::errors::OrderFlowError,
    traits::{InsertOrderResult, OrderManagement},
};

/// The outcome of a successful order upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOrderResult {
    /// The order is new and will be picked up by the accrual pipeline.
    Accepted(Order),
    /// The same user uploaded this order before. Nothing changed.
    AlreadySubmitted(Order),
}

/// `OrderFlowApi` accepts order uploads from users.
///
/// Uploaded orders start out as `NEW`. From there the accrual pipeline takes over; this API never changes an order's
/// status.
pub struct OrderFlowApi<B> {
    db: B,
}

impl<B: Debug> Debug for OrderFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi ({:?})", self.db)
    }
}

impl<B> OrderFlowApi<B>
where B: OrderManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    /// Submit an order number on behalf of the user.
    ///
    /// The number must pass the Luhn check, must not belong to another user, and must not have been used to withdraw
    /// points. Uploading the same number twice is harmless and reports [`SubmitOrderResult::AlreadySubmitted`].
    pub async fn submit_order(&self, user_id: i64, number: &str) -> Result<SubmitOrderResult, OrderFlowError> {
        let number = number.trim();
        if !is_valid_order_number(number) {
            debug!("🔄️📦️ User {user_id} submitted invalid order number '{number}'");
            return Err(OrderFlowError::InvalidOrderNumber(number.to_string()));
        }
        let order_number = OrderNumber::from(number);
        if self.db.order_has_withdrawal(&order_number).await? {
            return Err(OrderFlowError::AlreadyWithdrawn(order_number));
        }
        match self.db.insert_order(NewOrder::new(order_number, user_id)).await? {
            InsertOrderResult::Inserted(order) => {
                info!("🔄️📦️ Order {} accepted for user {user_id}", order.order_number);
                Ok(SubmitOrderResult::Accepted(order))
            },
            InsertOrderResult::AlreadyExists(order) if order.user_id == user_id => {
                Ok(SubmitOrderResult::AlreadySubmitted(order))
            },
            InsertOrderResult::AlreadyExists(order) => {
                warn!("🔄️📦️ User {user_id} tried to submit order {}, which belongs to another user", order.order_number);
                Err(OrderFlowError::SubmittedByAnotherUser(order.order_number))
            },
        }
    }

    /// All of the user's orders, oldest upload first.
    pub async fn orders_for_user(&self, user_id: i64) -> Result<Vec<Order>, OrderFlowError> {
        let orders = self.db.fetch_orders_for_user(user_id).await?;
        trace!("🔄️📦️ {} orders fetched for user {user_id}", orders.len());
        Ok(orders)
    }
}
