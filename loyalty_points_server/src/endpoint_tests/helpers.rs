use actix_web::{
    body::MessageBody,
    http::{header::HeaderMap, StatusCode},
    test,
    test::TestRequest,
    web,
    web::ServiceConfig,
    App,
};
use log::debug;
use loyalty_points_engine::AuthApi;

use super::mocks::MockAuthManager;
use crate::routes::json_config;

pub const VALID_TOKEN: &str = "tHisTokenIsValidForTheTestUser0123456789abcdefghijklmnopqrstuvw";

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestResponse {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).expect("Response body is not JSON")
    }
}

/// An `AuthApi` whose backend only knows [`VALID_TOKEN`], which belongs to `user_id`.
pub fn auth_api_for(user_id: i64) -> web::Data<AuthApi<MockAuthManager>> {
    let mut auth_manager = MockAuthManager::new();
    auth_manager
        .expect_fetch_user_id_for_token()
        .returning(move |token| Ok((token == VALID_TOKEN).then_some(user_id)));
    web::Data::new(AuthApi::new(auth_manager))
}

pub fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {token}"))
}

/// Runs a single request against an app built by `configure`. Errors raised by middleware are turned into responses
/// the same way the HTTP server would.
pub async fn send<F>(req: TestRequest, configure: F) -> TestResponse
where F: FnOnce(&mut ServiceConfig) {
    let _ = env_logger::try_init();
    let app = App::new().app_data(json_config()).configure(configure);
    let service = test::init_service(app).await;
    debug!("Making request");
    let res = match test::try_call_service(&service, req.to_request()).await {
        Ok(res) => res.into_parts().1.map_into_boxed_body(),
        Err(e) => e.error_response(),
    };
    let status = res.status();
    let headers = res.headers().clone();
    let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
    TestResponse { status, headers, body }
}
