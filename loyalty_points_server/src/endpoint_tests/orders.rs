use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use chrono::{TimeZone, Utc};
use loyalty_points_engine::{
    db_types::{Order, OrderNumber, OrderStatusType},
    traits::InsertOrderResult,
    OrderFlowApi,
};
use lpg_common::Points;
use serde_json::json;

use super::{
    helpers::{auth_api_for, bearer, send, VALID_TOKEN},
    mocks::{MockAuthManager, MockOrderManager},
};
use crate::{
    middleware::BearerAuthFactory,
    routes::{MyOrdersRoute, SubmitOrderRoute},
};

const ALICE: i64 = 1;
const BOB: i64 = 2;

fn configure(order_manager: MockOrderManager) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        cfg.app_data(auth_api_for(ALICE)).app_data(web::Data::new(OrderFlowApi::new(order_manager))).service(
            web::scope("/api/user")
                .wrap(BearerAuthFactory::<MockAuthManager>::new())
                .service(SubmitOrderRoute::<MockOrderManager>::new())
                .service(MyOrdersRoute::<MockOrderManager>::new()),
        );
    }
}

fn order(number: &str, user_id: i64, status: OrderStatusType, accrual: Option<Points>) -> Order {
    let uploaded_at = Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap();
    Order {
        id: 1,
        order_number: OrderNumber::from(number),
        user_id,
        status,
        accrual,
        uploaded_at,
        updated_at: uploaded_at,
    }
}

fn new_order(number: &str, user_id: i64) -> Order {
    order(number, user_id, OrderStatusType::New, None)
}

fn upload(number: &str) -> TestRequest {
    TestRequest::post()
        .uri("/api/user/orders")
        .insert_header(bearer(VALID_TOKEN))
        .insert_header(("Content-Type", "text/plain"))
        .set_payload(number.to_string())
}

fn no_withdrawals(order_manager: &mut MockOrderManager) {
    order_manager.expect_order_has_withdrawal().returning(|_| Ok(false));
}

#[actix_web::test]
async fn fetch_my_orders_no_headers() {
    let req = TestRequest::get().uri("/api/user/orders");
    let res = send(req, configure(MockOrderManager::new())).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.body, r#"{"error":"Authentication Error. A bearer token is required"}"#);
}

#[actix_web::test]
async fn fetch_my_orders_unknown_token() {
    let req = TestRequest::get().uri("/api/user/orders").insert_header(bearer("not-a-token"));
    let res = send(req, configure(MockOrderManager::new())).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.body, r#"{"error":"Authentication Error. Access token is missing or invalid"}"#);
}

#[actix_web::test]
async fn fetch_my_orders() {
    let mut order_manager = MockOrderManager::new();
    order_manager.expect_fetch_orders_for_user().withf(|id| *id == ALICE).returning(|id| {
        Ok(vec![
            order("9278923470", id, OrderStatusType::Registered, Some(Points::from_points(500))),
            order("12345678903", id, OrderStatusType::Processing, None),
        ])
    });
    let req = TestRequest::get().uri("/api/user/orders").insert_header(bearer(VALID_TOKEN));
    let res = send(req, configure(order_manager)).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(
        res.json(),
        json!([
            {"number": "9278923470", "status": "REGISTERED", "accrual": 500.0, "uploaded_at": "2024-03-01T10:00:00Z"},
            {"number": "12345678903", "status": "PROCESSING", "uploaded_at": "2024-03-01T10:00:00Z"}
        ])
    );
}

#[actix_web::test]
async fn fetch_my_orders_when_there_are_none() {
    let mut order_manager = MockOrderManager::new();
    order_manager.expect_fetch_orders_for_user().returning(|_| Ok(vec![]));
    let req = TestRequest::get().uri("/api/user/orders").insert_header(bearer(VALID_TOKEN));
    let res = send(req, configure(order_manager)).await;
    assert_eq!(res.status, StatusCode::NO_CONTENT);
    assert!(res.body.is_empty());
}

#[actix_web::test]
async fn upload_new_order() {
    let mut order_manager = MockOrderManager::new();
    no_withdrawals(&mut order_manager);
    order_manager
        .expect_insert_order()
        .withf(|o| o.order_number.as_str() == "12345678903" && o.user_id == ALICE)
        .times(1)
        .returning(|o| Ok(InsertOrderResult::Inserted(new_order(o.order_number.as_str(), o.user_id))));
    let res = send(upload("12345678903\n"), configure(order_manager)).await;
    assert_eq!(res.status, StatusCode::ACCEPTED);
}

#[actix_web::test]
async fn upload_same_order_again() {
    let mut order_manager = MockOrderManager::new();
    no_withdrawals(&mut order_manager);
    order_manager
        .expect_insert_order()
        .returning(|o| Ok(InsertOrderResult::AlreadyExists(new_order(o.order_number.as_str(), ALICE))));
    let res = send(upload("12345678903"), configure(order_manager)).await;
    assert_eq!(res.status, StatusCode::OK);
}

#[actix_web::test]
async fn upload_another_users_order() {
    let mut order_manager = MockOrderManager::new();
    no_withdrawals(&mut order_manager);
    order_manager
        .expect_insert_order()
        .returning(|o| Ok(InsertOrderResult::AlreadyExists(new_order(o.order_number.as_str(), BOB))));
    let res = send(upload("12345678903"), configure(order_manager)).await;
    assert_eq!(res.status, StatusCode::CONFLICT);
    assert_eq!(res.body, r##"{"error":"Order #12345678903 has already been submitted by another user"}"##);
}

#[actix_web::test]
async fn upload_withdrawn_order() {
    let mut order_manager = MockOrderManager::new();
    order_manager.expect_order_has_withdrawal().returning(|_| Ok(true));
    order_manager.expect_insert_order().never();
    let res = send(upload("12345678903"), configure(order_manager)).await;
    assert_eq!(res.status, StatusCode::CONFLICT);
}

#[actix_web::test]
async fn upload_invalid_order_numbers() {
    for (number, status) in [
        ("12345678900", StatusCode::UNPROCESSABLE_ENTITY),
        ("12345abc", StatusCode::UNPROCESSABLE_ENTITY),
        ("", StatusCode::BAD_REQUEST),
        ("  \n", StatusCode::BAD_REQUEST),
    ] {
        let mut order_manager = MockOrderManager::new();
        order_manager.expect_order_has_withdrawal().never();
        order_manager.expect_insert_order().never();
        let res = send(upload(number), configure(order_manager)).await;
        assert_eq!(res.status, status, "order number: '{number}'");
    }
}
