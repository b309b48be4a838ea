use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use chrono::{TimeZone, Utc};
use loyalty_points_engine::{
    db_types::{Balance, NewWithdrawal, OrderNumber, Withdrawal},
    traits::AccountApiError,
    AccountApi,
};
use lpg_common::Points;
use serde_json::json;

use super::{
    helpers::{auth_api_for, bearer, send, VALID_TOKEN},
    mocks::{MockAccountManager, MockAuthManager},
};
use crate::{
    middleware::BearerAuthFactory,
    routes::{MyBalanceRoute, MyWithdrawalsRoute, WithdrawRoute},
};

const ALICE: i64 = 1;

fn configure(account_manager: MockAccountManager) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        cfg.app_data(auth_api_for(ALICE)).app_data(web::Data::new(AccountApi::new(account_manager))).service(
            web::scope("/api/user")
                .wrap(BearerAuthFactory::<MockAuthManager>::new())
                .service(MyBalanceRoute::<MockAccountManager>::new())
                .service(WithdrawRoute::<MockAccountManager>::new())
                .service(MyWithdrawalsRoute::<MockAccountManager>::new()),
        );
    }
}

fn withdrawal(w: &NewWithdrawal) -> Withdrawal {
    Withdrawal {
        id: 1,
        user_id: w.user_id,
        order_number: w.order_number.clone(),
        sum: w.sum,
        processed_at: Utc.with_ymd_and_hms(2024, 3, 2, 8, 30, 0).unwrap(),
    }
}

fn withdraw_request(body: serde_json::Value) -> TestRequest {
    TestRequest::post().uri("/api/user/balance/withdraw").insert_header(bearer(VALID_TOKEN)).set_json(body)
}

#[actix_web::test]
async fn fetch_my_balance() {
    let mut account_manager = MockAccountManager::new();
    account_manager.expect_fetch_balance().withf(|id| *id == ALICE).returning(|_| {
        Ok(Balance::new(Points::from_points(500), Points::from_hundredths(4_950)))
    });
    let req = TestRequest::get().uri("/api/user/balance").insert_header(bearer(VALID_TOKEN));
    let res = send(req, configure(account_manager)).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json(), json!({"current": 450.5, "withdrawn": 49.5}));
}

#[actix_web::test]
async fn fetch_my_balance_no_token() {
    let mut account_manager = MockAccountManager::new();
    account_manager.expect_fetch_balance().never();
    let req = TestRequest::get().uri("/api/user/balance");
    let res = send(req, configure(account_manager)).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn withdraw_points() {
    let mut account_manager = MockAccountManager::new();
    account_manager
        .expect_withdraw()
        .withf(|w| {
            w.user_id == ALICE
                && w.order_number == OrderNumber::from("2377225624")
                && w.sum == Points::from_hundredths(75_125)
        })
        .times(1)
        .returning(|w| Ok(withdrawal(&w)));
    let res = send(withdraw_request(json!({"order": "2377225624", "sum": 751.25})), configure(account_manager)).await;
    assert_eq!(res.status, StatusCode::OK);
}

#[actix_web::test]
async fn withdraw_more_than_the_balance() {
    let mut account_manager = MockAccountManager::new();
    account_manager.expect_withdraw().returning(|w| {
        Err(AccountApiError::InsufficientFunds { requested: w.sum, available: Points::from_points(10) })
    });
    let res = send(withdraw_request(json!({"order": "2377225624", "sum": 751})), configure(account_manager)).await;
    assert_eq!(res.status, StatusCode::PAYMENT_REQUIRED);
    assert_eq!(
        res.body,
        r#"{"error":"Insufficient funds. Requested 751.00pts, but only 10.00pts is available"}"#
    );
}

#[actix_web::test]
async fn withdraw_against_a_used_order_number() {
    let mut account_manager = MockAccountManager::new();
    account_manager.expect_withdraw().returning(|w| Err(AccountApiError::OrderAlreadyWithdrawn(w.order_number)));
    let res = send(withdraw_request(json!({"order": "2377225624", "sum": 1})), configure(account_manager)).await;
    assert_eq!(res.status, StatusCode::CONFLICT);
}

#[actix_web::test]
async fn rejected_withdrawal_requests() {
    let cases = [
        (json!({"order": "2377225625", "sum": 10}), StatusCode::UNPROCESSABLE_ENTITY),
        (json!({"order": "2377225624", "sum": 0}), StatusCode::BAD_REQUEST),
        (json!({"order": "2377225624", "sum": -5}), StatusCode::BAD_REQUEST),
        (json!({"order": "2377225624"}), StatusCode::BAD_REQUEST),
    ];
    for (body, status) in cases {
        let mut account_manager = MockAccountManager::new();
        account_manager.expect_withdraw().never();
        let res = send(withdraw_request(body.clone()), configure(account_manager)).await;
        assert_eq!(res.status, status, "{body}");
    }
}

#[actix_web::test]
async fn fetch_my_withdrawals() {
    let mut account_manager = MockAccountManager::new();
    account_manager.expect_fetch_withdrawals_for_user().returning(|user_id| {
        let w = NewWithdrawal { user_id, order_number: "2377225624".into(), sum: Points::from_points(500) };
        Ok(vec![withdrawal(&w)])
    });
    let req = TestRequest::get().uri("/api/user/withdrawals").insert_header(bearer(VALID_TOKEN));
    let res = send(req, configure(account_manager)).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json(), json!([{"order": "2377225624", "sum": 500.0, "processed_at": "2024-03-02T08:30:00Z"}]));
}

#[actix_web::test]
async fn fetch_my_withdrawals_when_there_are_none() {
    let mut account_manager = MockAccountManager::new();
    account_manager.expect_fetch_withdrawals_for_user().returning(|_| Ok(vec![]));
    let req = TestRequest::get().uri("/api/user/withdrawals").insert_header(bearer(VALID_TOKEN));
    let res = send(req, configure(account_manager)).await;
    assert_eq!(res.status, StatusCode::NO_CONTENT);
}
