use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use loyalty_points_engine::{
    db_types::UserCredentials,
    helpers::{hash_password, ACCESS_TOKEN_LENGTH},
    traits::AuthApiError,
    AuthApi,
};
use serde_json::json;

use super::{
    helpers::{send, TestResponse},
    mocks::MockAuthManager,
};
use crate::routes::{LoginRoute, RegisterRoute};

fn configure(auth_manager: MockAuthManager) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        cfg.app_data(web::Data::new(AuthApi::new(auth_manager)))
            .service(RegisterRoute::<MockAuthManager>::new())
            .service(LoginRoute::<MockAuthManager>::new());
    }
}

fn assert_token_issued(res: &TestResponse) {
    assert_eq!(res.status, StatusCode::OK);
    let token = res.json()["token"].as_str().expect("token missing from body").to_string();
    assert_eq!(token.len(), ACCESS_TOKEN_LENGTH);
    let header = res.headers.get("Authorization").expect("Authorization header missing");
    assert_eq!(header.to_str().unwrap(), format!("Bearer {token}"));
}

#[actix_web::test]
async fn register_new_user() {
    let mut auth_manager = MockAuthManager::new();
    auth_manager
        .expect_create_user()
        .withf(|login, digest| login == "alice" && digest != "s3cret" && digest.contains('$'))
        .times(1)
        .returning(|_, _| Ok(7));
    auth_manager.expect_save_token().withf(|id, _| *id == 7).times(1).returning(|_, _| Ok(()));
    let req = TestRequest::post().uri("/api/user/register").set_json(json!({"login": "alice", "password": "s3cret"}));
    let res = send(req, configure(auth_manager)).await;
    assert_token_issued(&res);
}

#[actix_web::test]
async fn register_taken_login() {
    let mut auth_manager = MockAuthManager::new();
    auth_manager.expect_create_user().returning(|login, _| Err(AuthApiError::UserAlreadyExists(login.to_string())));
    auth_manager.expect_save_token().never();
    let req = TestRequest::post().uri("/api/user/register").set_json(json!({"login": "alice", "password": "s3cret"}));
    let res = send(req, configure(auth_manager)).await;
    assert_eq!(res.status, StatusCode::CONFLICT);
    assert_eq!(res.body, r#"{"error":"The login 'alice' is already taken"}"#);
}

#[actix_web::test]
async fn register_bad_requests() {
    for body in [r#"{"login": "alice"}"#, "not json", r#"{"login": "", "password": "s3cret"}"#] {
        let mut auth_manager = MockAuthManager::new();
        auth_manager.expect_create_user().never();
        let req = TestRequest::post()
            .uri("/api/user/register")
            .insert_header(("Content-Type", "application/json"))
            .set_payload(body);
        let res = send(req, configure(auth_manager)).await;
        assert_eq!(res.status, StatusCode::BAD_REQUEST, "body: {body}");
        assert!(res.json()["error"].is_string());
    }
}

fn known_user(auth_manager: &mut MockAuthManager) {
    let creds = UserCredentials { id: 3, login: "bob".into(), password_hash: hash_password("correct horse") };
    auth_manager
        .expect_fetch_credentials_for_login()
        .returning(move |login| Ok((login == "bob").then(|| creds.clone())));
}

#[actix_web::test]
async fn login_success() {
    let mut auth_manager = MockAuthManager::new();
    known_user(&mut auth_manager);
    auth_manager.expect_save_token().withf(|id, _| *id == 3).times(1).returning(|_, _| Ok(()));
    let req = TestRequest::post().uri("/api/user/login").set_json(json!({"login": "bob", "password": "correct horse"}));
    let res = send(req, configure(auth_manager)).await;
    assert_token_issued(&res);
}

#[actix_web::test]
async fn login_failures() {
    let attempts = [json!({"login": "bob", "password": "battery staple"}), json!({"login": "eve", "password": "x"})];
    for attempt in attempts {
        let mut auth_manager = MockAuthManager::new();
        known_user(&mut auth_manager);
        auth_manager.expect_save_token().never();
        let req = TestRequest::post().uri("/api/user/login").set_json(&attempt);
        let res = send(req, configure(auth_manager)).await;
        assert_eq!(res.status, StatusCode::UNAUTHORIZED, "{attempt}");
        assert_eq!(res.body, r#"{"error":"Authentication Error. Invalid login or password"}"#);
        assert!(res.headers.get("Authorization").is_none());
    }
}

#[actix_web::test]
async fn login_backend_failure() {
    let mut auth_manager = MockAuthManager::new();
    auth_manager
        .expect_fetch_credentials_for_login()
        .returning(|_| Err(AuthApiError::DatabaseError("database is locked".into())));
    let req = TestRequest::post().uri("/api/user/login").set_json(json!({"login": "bob", "password": "x"}));
    let res = send(req, configure(auth_manager)).await;
    assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
}
