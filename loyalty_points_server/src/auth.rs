use std::future::{ready, Ready};

use actix_web::{
    dev::Payload,
    http::header::{HeaderMap, HeaderValue, AUTHORIZATION},
    FromRequest,
    HttpMessage,
    HttpRequest,
};
use log::debug;

use crate::errors::ServerError;

const BEARER_SCHEME: &str = "Bearer";

/// The authenticated caller. The bearer middleware places it in the request extensions once the access token checks
/// out; handlers take it as an extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserSession {
    pub user_id: i64,
}

impl FromRequest for UserSession {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let session = req.extensions().get::<UserSession>().copied().ok_or_else(|| {
            debug!("🔐️ No user session found in request extensions");
            ServerError::Unauthorized("This route requires an access token".into())
        });
        ready(session)
    }
}

/// Extracts the token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case(BEARER_SCHEME) && !token.is_empty() && !token.contains(' '))
        .then(|| token.to_string())
}

/// The `Authorization` header value handed back on register and login.
pub fn authorization_header(token: &str) -> (actix_web::http::header::HeaderName, HeaderValue) {
    let value = HeaderValue::from_str(&format!("{BEARER_SCHEME} {token}"))
        .unwrap_or_else(|_| HeaderValue::from_static(BEARER_SCHEME));
    (AUTHORIZATION, value)
}
