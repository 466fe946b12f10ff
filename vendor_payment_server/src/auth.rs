//! Access tokens.
//!
//! Users log in through the storefront, which issues an HS256-signed JWT carrying the user id and roles. The token is
//! supplied in the `vpg_access_token` header (or as a bearer token), and is optional: requests without one act as a
//! guest. See [`crate::middleware::JwtMiddlewareFactory`].
use std::future::{ready, Ready};

use actix_web::{dev::Payload, FromRequest, HttpMessage, HttpRequest};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use log::*;
use serde::{Deserialize, Serialize};
use vendor_payment_engine::db_types::{Actor, Roles, UserId};

use crate::{
    config::AuthConfig,
    errors::{AuthError, ServerError},
};

pub const ACCESS_TOKEN_HEADER: &str = "vpg_access_token";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    /// The user id
    pub sub: UserId,
    pub roles: Roles,
    pub exp: i64,
    #[serde(default)]
    pub iat: i64,
}

impl JwtClaims {
    pub fn actor(&self) -> Actor {
        Actor::user(self.sub, self.roles.clone())
    }
}

/// Handlers that take `JwtClaims` require a logged-in user.
impl FromRequest for JwtClaims {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let claims = req.extensions().get::<JwtClaims>().cloned();
        ready(claims.ok_or(ServerError::AuthenticationError(AuthError::NotLoggedIn)))
    }
}

/// The caller of a request: the logged-in user if there is a valid access token, otherwise a guest.
#[derive(Debug, Clone, Default)]
pub struct RequestActor(pub Actor);

impl RequestActor {
    pub fn into_inner(self) -> Actor {
        self.0
    }
}

impl FromRequest for RequestActor {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let actor = req.extensions().get::<JwtClaims>().map(JwtClaims::actor).unwrap_or_else(Actor::guest);
        ready(Ok(RequestActor(actor)))
    }
}

/// Signs access tokens. The storefront normally does this; the server uses it for tooling and tests.
#[derive(Clone)]
pub struct TokenIssuer {
    key: EncodingKey,
}

impl TokenIssuer {
    pub fn new(config: &AuthConfig) -> Self {
        Self { key: EncodingKey::from_secret(config.jwt_secret.reveal().as_bytes()) }
    }

    pub fn issue_token(&self, user_id: UserId, roles: Roles, duration: Option<Duration>) -> Result<String, AuthError> {
        let now = Utc::now();
        let exp = now + duration.unwrap_or_else(|| Duration::hours(24));
        let claims = JwtClaims { sub: user_id, roles, exp: exp.timestamp(), iat: now.timestamp() };
        encode(&Header::new(Algorithm::HS256), &claims, &self.key).map_err(|e| AuthError::ValidationError(e.to_string()))
    }
}

#[derive(Clone)]
pub struct TokenValidator {
    key: DecodingKey,
    validation: Validation,
}

impl TokenValidator {
    pub fn new(config: &AuthConfig) -> Self {
        let key = DecodingKey::from_secret(config.jwt_secret.reveal().as_bytes());
        Self { key, validation: Validation::new(Algorithm::HS256) }
    }

    pub fn validate(&self, token: &str) -> Result<JwtClaims, AuthError> {
        let data = decode::<JwtClaims>(token, &self.key, &self.validation).map_err(|e| match e.kind() {
            ErrorKind::InvalidToken | ErrorKind::Base64(_) | ErrorKind::Json(_) | ErrorKind::Utf8(_) => {
                AuthError::PoorlyFormattedToken(e.to_string())
            },
            _ => AuthError::ValidationError(e.to_string()),
        })?;
        trace!("🔐️ Access token validated for user #{}", data.claims.sub);
        Ok(data.claims)
    }
}
