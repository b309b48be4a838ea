//! # Loyalty points engine public API
//!
//! The `lpe_api` module exposes the programmatic API for the loyalty points engine.
//! The API is modular, so that clients of the API can pick and choose the functionality they want.
//!
//! * [`auth_api`] registers users, checks passwords, and resolves bearer tokens to user ids.
//! * [`order_flow_api`] accepts order uploads and lists a user's orders.
//! * [`accounts_api`] reports balances and handles withdrawals.
//!
//! # API usage
//!
//! The pattern for using all the APIs is the same. An API instance is created by supplying a database backend that
//! implements the specific backend traits required by the API.
//!
//! ```rust,ignore
//! use loyalty_points_engine::{AccountApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url(...).await?;
//! // SqliteDatabase implements AccountManagement
//! let api = AccountApi::new(db);
//! let balance = api.balance(user_id).await?;
//! ```

pub mod accounts_api;
pub mod auth_api;
pub mod errors;
pub mod order_flow_api;
