//! Request handler definitions
//!
//! Define each route and it handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests:
//! ```nocompile
//!     fn my_handler() -> impl Responder {
//!         std::thread::sleep(Duration::from_secs(5)); // <-- Bad practice! Will cause the current worker thread to
//! hang!
//!     }
//! ```
//! For this reason, any long, non-cpu-bound operation (e.g. I/O, database operations, etc.) should be expressed as
//! futures or asynchronous functions. Async handlers get executed concurrently by worker threads and thus don’t block
//! execution:
//!
//! ```nocompile
//!     async fn my_handler() -> impl Responder {
//!         tokio::time::sleep(Duration::from_secs(5)).await; // <-- Ok. Worker thread will handle other requests here
//!     }
//! ```
use actix_web::{get, web, HttpResponse, Responder};
use log::*;
use loyalty_points_engine::{
    traits::{AccountManagement, AuthManagement, OrderManagement},
    AccountApi,
    AuthApi,
    OrderFlowApi,
    SubmitOrderResult,
};

use crate::{
    auth::{authorization_header, UserSession},
    data_objects::{Credentials, TokenResponse, WithdrawRequest},
    errors::ServerError,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

/// Turns JSON extraction failures into `400 Bad Request`, with the same error body as every other error.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|e, _req| {
        debug!("💻️ Could not read JSON body. {e}");
        ServerError::InvalidRequestBody(e.to_string()).into()
    })
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Auth  ----------------------------------------------------
route!(register => Post "/api/user/register" impl AuthManagement);
/// Route handler for user registration
///
/// Creates a new user from a JSON `{"login", "password"}` body and logs them straight in. The access token is
/// returned both in the `Authorization` header and in the body.
pub async fn register<A: AuthManagement>(
    body: web::Json<Credentials>,
    api: web::Data<AuthApi<A>>,
) -> Result<HttpResponse, ServerError> {
    let Credentials { login, password } = body.into_inner();
    debug!("💻️ Registration request for '{login}'");
    let token = api.register(&login, &password).await?;
    Ok(token_response(token))
}

route!(login => Post "/api/user/login" impl AuthManagement);
/// Route handler for user login
///
/// Exchanges a JSON `{"login", "password"}` body for a fresh access token. Any previously issued token stops working.
pub async fn login<A: AuthManagement>(
    body: web::Json<Credentials>,
    api: web::Data<AuthApi<A>>,
) -> Result<HttpResponse, ServerError> {
    let Credentials { login, password } = body.into_inner();
    debug!("💻️ Login request for '{login}'");
    let token = api.login(&login, &password).await?;
    Ok(token_response(token))
}

fn token_response(token: String) -> HttpResponse {
    HttpResponse::Ok().insert_header(authorization_header(&token)).json(TokenResponse { token })
}

//----------------------------------------------   Orders  ----------------------------------------------------
route!(submit_order => Post "/orders" impl OrderManagement);
/// Route handler for order uploads
///
/// The body is the bare order number, as plain text. A new order is accepted with `202 Accepted` and queued for
/// accrual; uploading one of your own orders again returns `200 OK`.
pub async fn submit_order<B: OrderManagement>(
    session: UserSession,
    body: String,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let number = body.trim();
    if number.is_empty() {
        return Err(ServerError::InvalidRequestBody("An order number is required".into()));
    }
    debug!("💻️ POST order {number} for user {}", session.user_id);
    match api.submit_order(session.user_id, number).await? {
        SubmitOrderResult::Accepted(_) => Ok(HttpResponse::Accepted().finish()),
        SubmitOrderResult::AlreadySubmitted(_) => Ok(HttpResponse::Ok().finish()),
    }
}

route!(my_orders => Get "/orders" impl OrderManagement);
/// Route handler for the orders endpoint
///
/// Returns the caller's orders, oldest upload first, or `204 No Content` if they have none.
pub async fn my_orders<B: OrderManagement>(
    session: UserSession,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET my_orders for user {}", session.user_id);
    let orders = api.orders_for_user(session.user_id).await?;
    Ok(list_response(&orders))
}

//----------------------------------------------   Balance  ----------------------------------------------------
route!(my_balance => Get "/balance" impl AccountManagement);
pub async fn my_balance<B: AccountManagement>(
    session: UserSession,
    api: web::Data<AccountApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET my_balance for user {}", session.user_id);
    let balance = api.balance(session.user_id).await?;
    Ok(HttpResponse::Ok().json(balance))
}

route!(withdraw => Post "/balance/withdraw" impl AccountManagement);
/// Route handler for withdrawals
///
/// Spends `sum` points against a new order number, given as JSON `{"order", "sum"}`.
pub async fn withdraw<B: AccountManagement>(
    session: UserSession,
    body: web::Json<WithdrawRequest>,
    api: web::Data<AccountApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let WithdrawRequest { order, sum } = body.into_inner();
    debug!("💻️ POST withdraw {sum} against order {order} for user {}", session.user_id);
    api.withdraw(session.user_id, &order, sum).await?;
    Ok(HttpResponse::Ok().finish())
}

route!(my_withdrawals => Get "/withdrawals" impl AccountManagement);
pub async fn my_withdrawals<B: AccountManagement>(
    session: UserSession,
    api: web::Data<AccountApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET my_withdrawals for user {}", session.user_id);
    let withdrawals = api.withdrawals(session.user_id).await?;
    Ok(list_response(&withdrawals))
}

fn list_response<T: serde::Serialize>(items: &[T]) -> HttpResponse {
    if items.is_empty() {
        HttpResponse::NoContent().finish()
    } else {
        HttpResponse::Ok().json(items)
    }
}
