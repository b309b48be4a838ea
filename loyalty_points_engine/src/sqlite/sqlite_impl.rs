//! `SqliteDatabase` is a concrete implementation of a loyalty points engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`traits`] module.
use std::fmt::Debug;

use log::*;
use sqlx::{migrate::MigrateError, SqliteConnection, SqlitePool};

use super::db::{new_pool, orders, tokens, users, withdrawals};
use crate::{
    db_types::{AccrualResult, Balance, NewOrder, NewWithdrawal, Order, OrderNumber, UserCredentials, Withdrawal},
    traits::{
        AccountApiError,
        AccountManagement,
        AccrualManagement,
        AccrualStoreError,
        AuthApiError,
        AuthManagement,
        InsertOrderResult,
        OrderManagement,
        OrderManagementError,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object with the given URL. The database file is created if it does not exist.
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("🗃️ Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        Ok(Self { pool })
    }

    /// Brings the schema up to date. Migrations that have already been applied are skipped.
    pub async fn migrate(&self) -> Result<(), MigrateError> {
        sqlx::migrate!("./src/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Database migrations complete");
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
        info!("🗃️ Database connection pool closed");
    }
}

async fn balance_for_user(user_id: i64, conn: &mut SqliteConnection) -> Result<Balance, sqlx::Error> {
    let accrued = orders::accrued_total(user_id, conn).await?;
    let withdrawn = withdrawals::withdrawn_total(user_id, conn).await?;
    Ok(Balance::new(accrued, withdrawn))
}

impl AuthManagement for SqliteDatabase {
    async fn create_user(&self, login: &str, password_hash: &str) -> Result<i64, AuthApiError> {
        let mut conn = self.pool.acquire().await?;
        users::insert_user(login, password_hash, &mut conn).await
    }

    async fn fetch_credentials_for_login(&self, login: &str) -> Result<Option<UserCredentials>, AuthApiError> {
        let mut conn = self.pool.acquire().await?;
        let creds = users::fetch_credentials(login, &mut conn).await?;
        Ok(creds)
    }

    async fn save_token(&self, user_id: i64, token: &str) -> Result<(), AuthApiError> {
        let mut conn = self.pool.acquire().await?;
        tokens::upsert_token(user_id, token, &mut conn).await?;
        Ok(())
    }

    async fn fetch_user_id_for_token(&self, token: &str) -> Result<Option<i64>, AuthApiError> {
        let mut conn = self.pool.acquire().await?;
        let id = tokens::user_id_for_token(token, &mut conn).await?;
        Ok(id)
    }
}

impl OrderManagement for SqliteDatabase {
    async fn insert_order(&self, order: NewOrder) -> Result<InsertOrderResult, OrderManagementError> {
        let mut conn = self.pool.acquire().await?;
        let result = orders::idempotent_insert(order, &mut conn).await?;
        Ok(result)
    }

    async fn fetch_orders_for_user(&self, user_id: i64) -> Result<Vec<Order>, OrderManagementError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::fetch_orders_for_user(user_id, &mut conn).await?;
        Ok(orders)
    }

    async fn order_has_withdrawal(&self, order_number: &OrderNumber) -> Result<bool, OrderManagementError> {
        let mut conn = self.pool.acquire().await?;
        let exists = withdrawals::withdrawal_exists(order_number, &mut conn).await?;
        Ok(exists)
    }
}

impl AccountManagement for SqliteDatabase {
    async fn fetch_balance(&self, user_id: i64) -> Result<Balance, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        let balance = balance_for_user(user_id, &mut conn).await?;
        Ok(balance)
    }

    async fn fetch_withdrawals_for_user(&self, user_id: i64) -> Result<Vec<Withdrawal>, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        let withdrawals = withdrawals::fetch_withdrawals_for_user(user_id, &mut conn).await?;
        Ok(withdrawals)
    }

    /// The withdrawal is written first, which takes SQLite's write lock for the rest of the transaction. The balance
    /// is then re-derived with the new row included, and the transaction is rolled back if it went negative.
    async fn withdraw(&self, withdrawal: NewWithdrawal) -> Result<Withdrawal, AccountApiError> {
        let user_id = withdrawal.user_id;
        let requested = withdrawal.sum;
        let mut tx = self.pool.begin().await?;
        let result = withdrawals::insert_withdrawal(withdrawal, &mut tx).await?;
        let balance = balance_for_user(user_id, &mut tx).await?;
        if balance.current.value() < 0 {
            tx.rollback().await?;
            let available = balance.current + requested;
            debug!("💸️ User {user_id} tried to withdraw {requested}, but only has {available}");
            return Err(AccountApiError::InsufficientFunds { requested, available });
        }
        tx.commit().await?;
        Ok(result)
    }
}

impl AccrualManagement for SqliteDatabase {
    async fn list_non_terminal(&self, limit: usize) -> Result<Vec<OrderNumber>, AccrualStoreError> {
        let mut conn = self.pool.acquire().await?;
        let numbers = orders::fetch_non_terminal(limit, &mut conn).await?;
        Ok(numbers)
    }

    async fn write_result(&self, result: &AccrualResult) -> Result<(), AccrualStoreError> {
        let mut conn = self.pool.acquire().await?;
        orders::update_accrual(result, &mut conn).await?;
        trace!("🗃️ Accrual result for order {} saved: {}", result.order_number, result.status);
        Ok(())
    }

    async fn mark_checked(&self, order_number: &OrderNumber) -> Result<(), AccrualStoreError> {
        let mut conn = self.pool.acquire().await?;
        orders::mark_checked(order_number, &mut conn).await
    }
}
