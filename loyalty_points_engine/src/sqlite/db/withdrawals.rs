use log::debug;
use lpg_common::Points;
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewWithdrawal, OrderNumber, Withdrawal},
    traits::AccountApiError,
};

/// Records a withdrawal. This is not atomic with respect to the balance check; embed it in a transaction alongside
/// [`withdrawn_total`] and the accrual sum.
///
/// An order number can only ever be withdrawn against once. A repeat is reported as
/// [`AccountApiError::OrderAlreadyWithdrawn`].
pub async fn insert_withdrawal(
    withdrawal: NewWithdrawal,
    conn: &mut SqliteConnection,
) -> Result<Withdrawal, AccountApiError> {
    let result = sqlx::query_as::<_, Withdrawal>(
        "INSERT INTO withdrawals (user_id, order_number, sum) VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(withdrawal.user_id)
    .bind(withdrawal.order_number.as_str())
    .bind(withdrawal.sum.value())
    .fetch_one(conn)
    .await;
    match result {
        Ok(w) => {
            debug!("💸️ Withdrawal of {} against order {} recorded for user {}", w.sum, w.order_number, w.user_id);
            Ok(w)
        },
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            Err(AccountApiError::OrderAlreadyWithdrawn(withdrawal.order_number))
        },
        Err(e) => Err(e.into()),
    }
}

pub async fn withdrawal_exists(order_number: &OrderNumber, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM withdrawals WHERE order_number = $1")
        .bind(order_number.as_str())
        .fetch_one(conn)
        .await?;
    Ok(count > 0)
}

/// Fetches the user's withdrawals, oldest first.
pub async fn fetch_withdrawals_for_user(
    user_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<Withdrawal>, sqlx::Error> {
    let withdrawals = sqlx::query_as("SELECT * FROM withdrawals WHERE user_id = $1 ORDER BY processed_at ASC, id ASC")
        .bind(user_id)
        .fetch_all(conn)
        .await?;
    Ok(withdrawals)
}

pub async fn withdrawn_total(user_id: i64, conn: &mut SqliteConnection) -> Result<Points, sqlx::Error> {
    let total: i64 = sqlx::query_scalar("SELECT COALESCE(SUM(sum), 0) FROM withdrawals WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(conn)
        .await?;
    Ok(Points::from_hundredths(total))
}
