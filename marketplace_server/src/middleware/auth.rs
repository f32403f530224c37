//! Reads the caller's access token, if any, and stores the validated claims in the request extensions.
//!
//! This middleware never rejects a request. Callers without a token, or with a token that fails validation, carry on
//! as guests; routes that need an account are wrapped in [`super::AclMiddlewareFactory`].
use std::{
    future::{ready, Ready},
    rc::Rc,
};

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error,
    HttpMessage,
};
use futures::future::LocalBoxFuture;
use log::{debug, trace};

use crate::auth::{token_from_request, TokenValidator};

pub struct AuthMiddlewareFactory {
    validator: TokenValidator,
}

impl AuthMiddlewareFactory {
    pub fn new(validator: TokenValidator) -> Self {
        Self { validator }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<B>;
    type Transform = AuthMiddlewareService<S>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService { validator: self.validator.clone(), service: Rc::new(service) }))
    }
}

pub struct AuthMiddlewareService<S> {
    validator: TokenValidator,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;
    type Response = ServiceResponse<B>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let validator = self.validator.clone();
        Box::pin(async move {
            match token_from_request(req.request()).map(|t| validator.validate(&t)) {
                Some(Ok(claims)) => {
                    trace!("🔐️ Request from account #{} with roles {:?}", claims.account_id, claims.roles);
                    req.extensions_mut().insert(claims);
                },
                Some(Err(e)) => debug!("🔐️ Ignoring invalid access token. {e}"),
                None => trace!("🔐️ Guest request"),
            }
            service.call(req).await
        })
    }
}
