//! Loyalty Points Engine
//!
//! The loyalty points engine is the accounting core of the loyalty points gateway. Users upload order numbers, an
//! external accrual service decides how many points each order earns, and users spend their points by withdrawing
//! them against new orders.
//!
//! The library is divided into three main sections:
//! 1. Database management and control ([`mod@traits`] and [`SqliteDatabase`]). The traits define what a backend
//!    must provide; SQLite is the supported backend. The data types used in the database are defined in the
//!    [`mod@db_types`] module and are public.
//! 2. The engine public API ([`AuthApi`], [`OrderFlowApi`], [`AccountApi`]). This provides the request/response
//!    functionality used by the HTTP server: registration and login, order uploads, balances, and withdrawals.
//! 3. The accrual reconciliation pipeline ([`mod@accrual`]). A set of background tasks that keep polling the accrual
//!    service about pending orders and write the verdicts back to the database.
pub mod accrual;
pub mod db_types;
pub mod helpers;
mod lpe_api;
pub mod traits;

#[cfg(feature = "sqlite")]
mod sqlite;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

#[cfg(feature = "sqlite")]
pub use sqlite::{db as sqlite_db, SqliteDatabase};
pub use lpe_api::{
    accounts_api::AccountApi,
    auth_api::AuthApi,
    errors::{AuthError, OrderFlowError, WithdrawalError},
    order_flow_api::{OrderFlowApi, SubmitOrderResult},
};
