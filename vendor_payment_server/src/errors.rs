use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use log::error;
use thiserror::Error;
use vendor_payment_engine::{ErrorKind, PaymentGatewayError, SettingsApiError};

use crate::data_objects::JsonResponse;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("Could not read request path: {0}")]
    InvalidRequestPath(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("{0}")]
    AuthenticationError(#[from] AuthError),
    #[error("Security check failed.")]
    InvalidNonce,
    #[error("{0}")]
    PaymentError(#[from] PaymentGatewayError),
    #[error("{0}")]
    SettingsError(#[from] SettingsApiError),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::InvalidRequestPath(_) => StatusCode::BAD_REQUEST,
            Self::AuthenticationError(e) => match e {
                AuthError::NotLoggedIn => StatusCode::UNAUTHORIZED,
                AuthError::ValidationError(_) => StatusCode::UNAUTHORIZED,
                AuthError::PoorlyFormattedToken(_) => StatusCode::BAD_REQUEST,
                AuthError::InsufficientPermissions(_) => StatusCode::FORBIDDEN,
            },
            Self::InvalidNonce => StatusCode::FORBIDDEN,
            Self::PaymentError(e) => match e.kind() {
                ErrorKind::Validation | ErrorKind::NotApplicable => StatusCode::BAD_REQUEST,
                ErrorKind::Authorization if matches!(e, PaymentGatewayError::NotLoggedIn) => StatusCode::UNAUTHORIZED,
                ErrorKind::Authorization => StatusCode::FORBIDDEN,
                ErrorKind::NotFound => StatusCode::NOT_FOUND,
                ErrorKind::Integration => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::SettingsError(e) => match e {
                SettingsApiError::ExtraMismatch(_) => StatusCode::BAD_REQUEST,
                SettingsApiError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            let details = match self {
                Self::PaymentError(e) => e.details(),
                e => e.to_string(),
            };
            error!("💻️ Request failed. {details}");
        }
        HttpResponse::build(status)
            .insert_header(ContentType::json())
            .body(serde_json::to_string(&JsonResponse::failure(self)).unwrap_or_default())
    }
}

#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("You must be logged in")]
    NotLoggedIn,
    #[error("Insufficient Permissions. {0}")]
    InsufficientPermissions(String),
    #[error("Access token is invalid. {0}")]
    ValidationError(String),
    #[error("Access token is not in the correct format. {0}")]
    PoorlyFormattedToken(String),
}
