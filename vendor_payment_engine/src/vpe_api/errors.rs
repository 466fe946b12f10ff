use thiserror::Error;

use crate::{
    db_types::{OrderId, OrderStatusType, PaymentMethod},
    traits::StorageError,
};

/// How callers should treat a failure. The HTTP layer maps each kind onto a status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad input from the caller. Nothing was changed.
    Validation,
    /// The caller is not logged in, or may not act on this order.
    Authorization,
    NotFound,
    /// The order exists but is not paid through a vendor payment method.
    NotApplicable,
    /// A storage or file-store failure.
    Integration,
}

#[derive(Debug, Clone, Error)]
pub enum PaymentGatewayError {
    #[error("Transaction ID is required.")]
    MissingTransactionReference,
    #[error("Invalid status")]
    InvalidDecision(String),
    #[error("Invalid order.")]
    OrderNotFound(OrderId),
    #[error("{0} payment is not available for this order.")]
    MethodUnavailable(&'static str),
    #[error("Error loading payment details. Please contact support.")]
    MissingPaymentSnapshot(OrderId),
    #[error("Payment has already been {0}.")]
    AlreadyVerified(String),
    #[error("Payment information has already been submitted for this order.")]
    PaymentAlreadySubmitted(OrderId),
    #[error("This order is {0} and cannot be paid for.")]
    OrderNotPayable(OrderStatusType),
    #[error("This order is not being paid with {0}.")]
    WrongPaymentMethod(&'static str),
    #[error("File upload failed. Please try again.")]
    EmptyReceipt,
    #[error("Only images (JPG, PNG, GIF) and PDF files are allowed.")]
    UnsupportedReceiptType,
    #[error("File size must be less than 5MB.")]
    ReceiptTooLarge(usize),
    #[error("You must be logged in")]
    NotLoggedIn,
    #[error("{0}")]
    PermissionDenied(&'static str),
    #[error("Order {0} was not paid with a vendor payment method.")]
    NotApplicable(OrderId),
    #[error("Payment system error. Please contact support.")]
    StorageError(String),
    #[error("Could not save the receipt. Please try again.")]
    ReceiptStoreError(String),
}

impl PaymentGatewayError {
    pub fn kind(&self) -> ErrorKind {
        use PaymentGatewayError::*;
        match self {
            MissingTransactionReference
            | InvalidDecision(_)
            | MethodUnavailable(_)
            | MissingPaymentSnapshot(_)
            | AlreadyVerified(_)
            | PaymentAlreadySubmitted(_)
            | OrderNotPayable(_)
            | WrongPaymentMethod(_)
            | EmptyReceipt
            | UnsupportedReceiptType
            | ReceiptTooLarge(_) => ErrorKind::Validation,
            NotLoggedIn | PermissionDenied(_) => ErrorKind::Authorization,
            OrderNotFound(_) => ErrorKind::NotFound,
            NotApplicable(_) => ErrorKind::NotApplicable,
            StorageError(_) | ReceiptStoreError(_) => ErrorKind::Integration,
        }
    }

    /// A description of the failure for logs. Unlike `Display`, this includes backend detail.
    pub fn details(&self) -> String {
        match self {
            PaymentGatewayError::StorageError(e) | PaymentGatewayError::ReceiptStoreError(e) => format!("{self} ({e})"),
            PaymentGatewayError::ReceiptTooLarge(n) => format!("{self} ({n} bytes)"),
            PaymentGatewayError::InvalidDecision(s) => format!("{self} ({s})"),
            _ => self.to_string(),
        }
    }
}

impl From<StorageError> for PaymentGatewayError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::OrderNotFound(id) => PaymentGatewayError::OrderNotFound(OrderId(id)),
            e => PaymentGatewayError::StorageError(e.to_string()),
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum SettingsApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("The supplied extra settings do not apply to {0}")]
    ExtraMismatch(PaymentMethod),
}

impl From<StorageError> for SettingsApiError {
    fn from(e: StorageError) -> Self {
        SettingsApiError::DatabaseError(e.to_string())
    }
}
