mod credentials;
mod luhn;

pub use credentials::{generate_access_token, hash_password, verify_password, ACCESS_TOKEN_LENGTH};
pub use luhn::is_valid_order_number;
