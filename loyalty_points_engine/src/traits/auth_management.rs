use thiserror::Error;

use crate::db_types::UserCredentials;

#[derive(Debug, Clone, Error)]
pub enum AuthApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("The login '{0}' is already taken")]
    UserAlreadyExists(String),
}

impl From<sqlx::Error> for AuthApiError {
    fn from(e: sqlx::Error) -> Self {
        AuthApiError::DatabaseError(e.to_string())
    }
}

/// The `AuthManagement` trait defines behaviour for managing user credentials and access tokens.
///
/// Password hashing happens in the engine API layer. Backends only ever see (and store) digests.
#[allow(async_fn_in_trait)]
pub trait AuthManagement {
    /// Creates a new user record, returning the new user id. If the login is already taken, the error
    /// [`AuthApiError::UserAlreadyExists`] is returned.
    async fn create_user(&self, login: &str, password_hash: &str) -> Result<i64, AuthApiError>;

    /// Fetches the stored credentials for the given login, or `None` if no such user exists.
    async fn fetch_credentials_for_login(&self, login: &str) -> Result<Option<UserCredentials>, AuthApiError>;

    /// Stores the access token for the user. Each user has at most one live token; saving a new token replaces the
    /// previous one.
    async fn save_token(&self, user_id: i64, token: &str) -> Result<(), AuthApiError>;

    async fn fetch_user_id_for_token(&self, token: &str) -> Result<Option<i64>, AuthApiError>;
}
