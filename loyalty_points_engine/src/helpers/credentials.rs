//! Password digests and access token generation.
//!
//! Passwords are stored as `<salt>$<digest>`, both base64 encoded, where the digest is `Blake2b-512(salt || password)`
//! and the salt is 16 random bytes.
use blake2::{Blake2b512, Digest};
use log::warn;
use rand::{distributions::Alphanumeric, thread_rng, Rng};

const SALT_LENGTH: usize = 16;
pub const ACCESS_TOKEN_LENGTH: usize = 64;

pub fn hash_password(password: &str) -> String {
    let salt: [u8; SALT_LENGTH] = thread_rng().gen();
    let digest = salted_digest(&salt, password);
    format!("{}${}", base64::encode(salt), base64::encode(digest))
}

/// Checks `password` against a digest produced by [`hash_password`]. Malformed digests never verify.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let Some((salt, digest)) = stored.split_once('$') else {
        warn!("🔐️ Stored password digest is malformed");
        return false;
    };
    let (salt, expected) = match (base64::decode(salt), base64::decode(digest)) {
        (Ok(s), Ok(d)) => (s, d),
        _ => {
            warn!("🔐️ Stored password digest is not valid base64");
            return false;
        },
    };
    let actual = salted_digest(&salt, password);
    constant_time_eq(&actual, &expected)
}

/// A random alphanumeric bearer token, drawn from the thread-local CSPRNG.
pub fn generate_access_token() -> String {
    thread_rng().sample_iter(&Alphanumeric).take(ACCESS_TOKEN_LENGTH).map(char::from).collect()
}

fn salted_digest(salt: &[u8], password: &str) -> Vec<u8> {
    Blake2b512::new().chain_update(salt).chain_update(password.as_bytes()).finalize().to_vec()
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
