//! Reads the access token, if there is one, and makes its claims available to handlers and to the ACL layer.
//!
//! A missing token is not an error: the request continues as a guest. A token that is present but invalid is refused
//! with 401, so that an expired session is not silently treated as a guest.
use std::{pin::Pin, rc::Rc};

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::AUTHORIZATION,
    Error,
    HttpMessage,
};
use futures::{
    future::{ok, Ready},
    Future,
};
use log::*;

use crate::{
    auth::{TokenValidator, ACCESS_TOKEN_HEADER},
    errors::{AuthError, ServerError},
};

pub struct JwtMiddlewareFactory {
    validator: TokenValidator,
}

impl JwtMiddlewareFactory {
    pub fn new(validator: TokenValidator) -> Self {
        Self { validator }
    }
}

impl<S, B> Transform<S, ServiceRequest> for JwtMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = JwtMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(JwtMiddlewareService { validator: Rc::new(self.validator.clone()), service: Rc::new(service) })
    }
}

pub struct JwtMiddlewareService<S> {
    validator: Rc<TokenValidator>,
    service: Rc<S>,
}

/// The token from the `vpg_access_token` header, or failing that, an `Authorization: Bearer` header.
fn access_token(req: &ServiceRequest) -> Result<Option<String>, AuthError> {
    let headers = req.headers();
    if let Some(value) = headers.get(ACCESS_TOKEN_HEADER) {
        let token = value.to_str().map_err(|e| AuthError::PoorlyFormattedToken(e.to_string()))?;
        return Ok(Some(token.trim().to_string()));
    }
    match headers.get(AUTHORIZATION) {
        Some(value) => {
            let value = value.to_str().map_err(|e| AuthError::PoorlyFormattedToken(e.to_string()))?;
            Ok(value.strip_prefix("Bearer ").map(|t| t.trim().to_string()))
        },
        None => Ok(None),
    }
}

impl<S, B> Service<ServiceRequest> for JwtMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let validator = Rc::clone(&self.validator);
        Box::pin(async move {
            let token = access_token(&req).map_err(ServerError::AuthenticationError)?;
            if let Some(token) = token.filter(|t| !t.is_empty()) {
                let claims = validator.validate(&token).map_err(|e| {
                    debug!("🔐️ Refused access token for {}. {e}", req.path());
                    ServerError::AuthenticationError(e)
                })?;
                req.extensions_mut().insert(claims);
            }
            service.call(req).await
        })
    }
}
