//! Helpers for tests that need a real database. Only available with the `test_utils` feature.
pub mod prepare_env;
