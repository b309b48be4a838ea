//! # Loyalty points gateway server
//! This module hosts the HTTP server for the loyalty points gateway. It is responsible for:
//! Registering users and handing out bearer tokens.
//! Accepting order uploads and reporting their accrual status.
//! Reporting balances and processing withdrawals.
//! Running the accrual pipeline in the background for as long as the server is up.
//!
//! ## Configuration
//! The server is configured via environment variables and command-line flags. See [config](config/index.html) for
//! more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/api/user/register` and `/api/user/login`: Exchange credentials for an access token.
//! * `/api/user/orders`: Upload an order number (POST), or list your orders (GET).
//! * `/api/user/balance` and `/api/user/balance/withdraw`: Fetch your balance, or spend points.
//! * `/api/user/withdrawals`: List your withdrawals.
//!
//! Every `/api/user` route except register and login needs an `Authorization: Bearer <token>` header.

pub mod accrual_worker;
pub mod auth;
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod middleware;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
