//! Sqlite database operations for user records.
//!
//! Generally clients should never call these methods directly, and prefer to use the [`AuthManagement`] trait methods
//! that are implemented on the [`SqliteDatabase`] struct instead.
use log::debug;
use sqlx::SqliteConnection;

use crate::{db_types::UserCredentials, traits::AuthApiError};

/// Inserts a new user, returning its id. A duplicate login is reported as [`AuthApiError::UserAlreadyExists`].
pub async fn insert_user(login: &str, password_hash: &str, conn: &mut SqliteConnection) -> Result<i64, AuthApiError> {
    let result = sqlx::query_scalar::<_, i64>("INSERT INTO users (login, password_hash) VALUES ($1, $2) RETURNING id")
        .bind(login)
        .bind(password_hash)
        .fetch_one(conn)
        .await;
    match result {
        Ok(id) => {
            debug!("👤️ User '{login}' created with id {id}");
            Ok(id)
        },
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            Err(AuthApiError::UserAlreadyExists(login.to_string()))
        },
        Err(e) => Err(e.into()),
    }
}

pub async fn fetch_credentials(login: &str, conn: &mut SqliteConnection) -> Result<Option<UserCredentials>, sqlx::Error> {
    let creds = sqlx::query_as("SELECT id, login, password_hash FROM users WHERE login = $1")
        .bind(login)
        .fetch_optional(conn)
        .await?;
    Ok(creds)
}
