use log::{debug, trace};
use lpg_common::Points;
use sqlx::SqliteConnection;

use super::SQL_NOW;
use crate::{
    db_types::{AccrualResult, NewOrder, Order, OrderNumber, OrderStatusType},
    traits::{AccrualStoreError, InsertOrderResult},
};

/// Inserts the order into the database. If an order with the same number already exists, it is returned untouched.
///
/// The insert and the conflict check are a single statement, so concurrent uploads of the same number cannot both
/// succeed.
pub async fn idempotent_insert(order: NewOrder, conn: &mut SqliteConnection) -> Result<InsertOrderResult, sqlx::Error> {
    let inserted: Option<Order> = sqlx::query_as(
        r#"
            INSERT INTO orders (order_number, user_id) VALUES ($1, $2)
            ON CONFLICT(order_number) DO NOTHING
            RETURNING *;
        "#,
    )
    .bind(order.order_number.as_str())
    .bind(order.user_id)
    .fetch_optional(&mut *conn)
    .await?;
    if let Some(order) = inserted {
        debug!("📝️ Order [{}] inserted with id {}", order.order_number, order.id);
        return Ok(InsertOrderResult::Inserted(order));
    }
    let existing = fetch_order_by_number(&order.order_number, conn).await?.ok_or(sqlx::Error::RowNotFound)?;
    trace!("📝️ Order [{}] already exists with id {}", existing.order_number, existing.id);
    Ok(InsertOrderResult::AlreadyExists(existing))
}

pub async fn fetch_order_by_number(
    order_number: &OrderNumber,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE order_number = $1")
        .bind(order_number.as_str())
        .fetch_optional(conn)
        .await?;
    Ok(order)
}

/// Fetches all orders belonging to the user, ordered by `uploaded_at` in ascending order.
pub async fn fetch_orders_for_user(user_id: i64, conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    let orders = sqlx::query_as("SELECT * FROM orders WHERE user_id = $1 ORDER BY uploaded_at ASC, id ASC")
        .bind(user_id)
        .fetch_all(conn)
        .await?;
    Ok(orders)
}

/// Returns up to `limit` order numbers in the `NEW` or `PROCESSING` state. Orders that have never been checked come
/// first, then the ones checked longest ago.
///
/// Every lookup stamps `checked_at`, whatever the outcome, so orders that the accrual service keeps reporting as
/// `PROCESSING` or does not know at all move to the back of the line.
pub async fn fetch_non_terminal(limit: usize, conn: &mut SqliteConnection) -> Result<Vec<OrderNumber>, sqlx::Error> {
    let statuses = OrderStatusType::NON_TERMINAL.iter().map(|s| format!("'{s}'")).collect::<Vec<String>>().join(",");
    // NULLs sort first
    let q = format!(
        "SELECT order_number FROM orders WHERE status IN ({statuses}) ORDER BY checked_at ASC, uploaded_at ASC, id ASC \
         LIMIT $1"
    );
    #[allow(clippy::cast_possible_wrap)]
    let limit = limit as i64;
    let numbers = sqlx::query_scalar::<_, OrderNumber>(&q).bind(limit).fetch_all(conn).await?;
    trace!("📝️ {} non-terminal orders fetched", numbers.len());
    Ok(numbers)
}

/// Overwrites the status and accrual of the order. Last write wins.
///
/// A result that matches what is already stored is not written at all, so `updated_at` only moves when the order
/// actually changes.
pub async fn update_accrual(result: &AccrualResult, conn: &mut SqliteConnection) -> Result<(), AccrualStoreError> {
    let q = format!(
        "UPDATE orders SET status = $1, accrual = $2, updated_at = {SQL_NOW} WHERE order_number = $3 AND (status IS NOT \
         $1 OR accrual IS NOT $2)"
    );
    let res = sqlx::query(&q)
        .bind(result.status.to_string())
        .bind(result.accrual.map(|a| a.value()))
        .bind(result.order_number.as_str())
        .execute(&mut *conn)
        .await?;
    if res.rows_affected() > 0 {
        return Ok(());
    }
    match fetch_order_by_number(&result.order_number, conn).await? {
        Some(_) => {
            trace!("📝️ Order [{}] is already {}. Nothing to write", result.order_number, result.status);
            Ok(())
        },
        None => Err(AccrualStoreError::OrderNotFound(result.order_number.clone())),
    }
}

/// Stamps `checked_at` on the order, moving it to the back of the pending scan.
pub async fn mark_checked(order_number: &OrderNumber, conn: &mut SqliteConnection) -> Result<(), AccrualStoreError> {
    let q = format!("UPDATE orders SET checked_at = {SQL_NOW} WHERE order_number = $1");
    let res = sqlx::query(&q).bind(order_number.as_str()).execute(conn).await?;
    match res.rows_affected() {
        0 => Err(AccrualStoreError::OrderNotFound(order_number.clone())),
        _ => Ok(()),
    }
}

/// The sum of all accruals on the user's `REGISTERED` orders.
pub async fn accrued_total(user_id: i64, conn: &mut SqliteConnection) -> Result<Points, sqlx::Error> {
    let total: i64 = sqlx::query_scalar(
        "SELECT COALESCE(SUM(accrual), 0) FROM orders WHERE user_id = $1 AND status = 'REGISTERED'",
    )
    .bind(user_id)
    .fetch_one(conn)
    .await?;
    Ok(Points::from_hundredths(total))
}
