use thiserror::Error;

use crate::{
    db_types::OrderNumber,
    traits::{AccountApiError, AuthApiError, OrderManagementError},
};

#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("Login and password must not be empty")]
    EmptyCredentials,
    #[error("The login '{0}' is already taken")]
    LoginTaken(String),
    #[error("Invalid login or password")]
    InvalidCredentials,
    #[error("Access token is missing or invalid")]
    InvalidToken,
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<AuthApiError> for AuthError {
    fn from(e: AuthApiError) -> Self {
        match e {
            AuthApiError::UserAlreadyExists(login) => AuthError::LoginTaken(login),
            AuthApiError::DatabaseError(s) => AuthError::DatabaseError(s),
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum OrderFlowError {
    #[error("Order number {0} is not a valid order number")]
    InvalidOrderNumber(String),
    #[error("Order {0} has already been submitted by another user")]
    SubmittedByAnotherUser(OrderNumber),
    #[error("Order {0} has already been used for a withdrawal")]
    AlreadyWithdrawn(OrderNumber),
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<OrderManagementError> for OrderFlowError {
    fn from(e: OrderManagementError) -> Self {
        match e {
            OrderManagementError::DatabaseError(s) => OrderFlowError::DatabaseError(s),
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum WithdrawalError {
    #[error("Order number {0} is not a valid order number")]
    InvalidOrderNumber(String),
    #[error("The withdrawal sum must be positive")]
    NonPositiveSum,
    #[error("Account error: {0}")]
    AccountError(#[from] AccountApiError),
}
