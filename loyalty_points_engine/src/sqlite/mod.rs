//! SQLite database module for the loyalty points engine.
//!
//! Schema migrations live in `migrations/` and are embedded in the binary with `sqlx::migrate!`.
mod sqlite_impl;

pub mod db;
pub use sqlite_impl::SqliteDatabase;
