//! Registration, login and bearer token resolution.
use std::fmt::Debug;

use log::*;
use lpg_common::Secret;

use crate::{
    helpers::{generate_access_token, hash_password, verify_password},
    lpe_api::errors::AuthError,
    traits::AuthManagement,
};

/// `AuthApi` hands out bearer tokens in exchange for valid credentials, and resolves tokens back to user ids.
///
/// A user holds one token at a time. Logging in again issues a fresh token and invalidates the old one.
pub struct AuthApi<B> {
    db: B,
}

impl<B: Debug> Debug for AuthApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AuthApi ({:?})", self.db)
    }
}

impl<B> AuthApi<B>
where B: AuthManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    /// Creates a new user and logs them in, returning their access token.
    pub async fn register(&self, login: &str, password: &Secret<String>) -> Result<String, AuthError> {
        check_not_empty(login, password)?;
        let digest = hash_password(password.reveal());
        let user_id = self.db.create_user(login, &digest).await?;
        info!("🔑️ New user '{login}' registered with id {user_id}");
        self.issue_token(user_id).await
    }

    /// Checks the credentials and returns a new access token for the user.
    pub async fn login(&self, login: &str, password: &Secret<String>) -> Result<String, AuthError> {
        check_not_empty(login, password)?;
        let creds = self.db.fetch_credentials_for_login(login).await?.ok_or_else(|| {
            debug!("🔑️ Login attempt for unknown user '{login}'");
            AuthError::InvalidCredentials
        })?;
        if !verify_password(password.reveal(), &creds.password_hash) {
            debug!("🔑️ Wrong password supplied for user '{login}'");
            return Err(AuthError::InvalidCredentials);
        }
        debug!("🔑️ User '{login}' logged in");
        self.issue_token(creds.id).await
    }

    /// Resolves a bearer token to the id of the user it was issued to.
    pub async fn authenticate(&self, token: &str) -> Result<i64, AuthError> {
        if token.is_empty() {
            return Err(AuthError::InvalidToken);
        }
        self.db.fetch_user_id_for_token(token).await?.ok_or(AuthError::InvalidToken)
    }

    async fn issue_token(&self, user_id: i64) -> Result<String, AuthError> {
        let token = generate_access_token();
        self.db.save_token(user_id, &token).await?;
        trace!("🔑️ Access token issued for user {user_id}");
        Ok(token)
    }
}

fn check_not_empty(login: &str, password: &Secret<String>) -> Result<(), AuthError> {
    if login.trim().is_empty() || password.reveal().is_empty() {
        return Err(AuthError::EmptyCredentials);
    }
    Ok(())
}
