//! Bearer token middleware for the loyalty points server.
//! This middleware can be placed on any route or scope.
//!
//! It reads the access token from the `Authorization: Bearer <token>` header and resolves it to a user through
//! [`AuthApi::authenticate`]. On success a [`UserSession`] is stored in the request extensions and the request is
//! allowed to continue. Otherwise, a 401 Unauthorized response is returned.
//!
//! The middleware needs an `AuthApi<A>` in the application data, for the same backend type `A` it was created with.

use std::{future::Future, marker::PhantomData, pin::Pin, rc::Rc};

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    error::ErrorInternalServerError,
    web,
    Error,
    HttpMessage,
};
use futures::future::{ok, Ready};
use log::*;
use loyalty_points_engine::{traits::AuthManagement, AuthApi};

use crate::{
    auth::{bearer_token, UserSession},
    errors::ServerError,
};

pub struct BearerAuthFactory<A> {
    _backend: PhantomData<fn() -> A>,
}

impl<A> BearerAuthFactory<A> {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self { _backend: PhantomData }
    }
}

impl<S, B, A> Transform<S, ServiceRequest> for BearerAuthFactory<A>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
    A: AuthManagement + 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = BearerAuthService<S, A>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(BearerAuthService { service: Rc::new(service), _backend: PhantomData })
    }
}

pub struct BearerAuthService<S, A> {
    service: Rc<S>,
    _backend: PhantomData<fn() -> A>,
}

impl<S, B, A> Service<ServiceRequest> for BearerAuthService<S, A>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
    A: AuthManagement + 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        Box::pin(async move {
            let token = bearer_token(req.headers()).ok_or_else(|| {
                debug!("🔐️ Request to {} has no bearer token", req.path());
                ServerError::Unauthorized("A bearer token is required".into())
            })?;
            let api = req.app_data::<web::Data<AuthApi<A>>>().cloned().ok_or_else(|| {
                error!("🔐️ AuthApi is missing from the application data. The bearer middleware cannot work.");
                ErrorInternalServerError("Authentication is not configured")
            })?;
            let user_id = api.authenticate(&token).await.map_err(|e| {
                debug!("🔐️ Access token rejected for {}. {e}", req.path());
                ServerError::from(e)
            })?;
            trace!("🔐️ Request to {} authenticated as user {user_id}", req.path());
            req.extensions_mut().insert(UserSession { user_id });
            service.call(req).await
        })
    }
}
