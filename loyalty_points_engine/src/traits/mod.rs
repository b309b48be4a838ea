//! #  Database management and control.
//!
//! This module provides the interface contracts of the loyalty points engine database *backends*.
//!
//! ## Users
//! A user registers with a login and password, and is handed a bearer token that identifies them on every subsequent
//! request. The [`AuthManagement`] trait stores credentials and tokens.
//!
//! ## Orders and balances
//! Users submit order numbers. The external accrual service decides, some time later, how many points each order
//! earns. A user's balance is the sum of all accruals on their orders, less the sum of their withdrawals.
//!
//! ## Traits
//! The module defines behaviour that database backends need to expose in order to be supported by the engine.
//!
//! * [`AuthManagement`] defines behaviour for registering users and managing their access tokens.
//! * [`OrderManagement`] handles order uploads and per-user order histories.
//! * [`AccountManagement`] provides balances, withdrawal histories, and the withdrawal operation itself.
//! * [`AccrualManagement`] is the order store used by the background accrual pipeline. Its futures are `Send` so that
//!   pipeline tasks can be spawned onto the tokio runtime.
mod account_management;
mod accrual_management;
mod auth_management;
mod order_management;

pub use account_management::{AccountApiError, AccountManagement};
pub use accrual_management::{AccrualManagement, AccrualStoreError};
pub use auth_management::{AuthApiError, AuthManagement};
pub use order_management::{InsertOrderResult, OrderManagement, OrderManagementError};
