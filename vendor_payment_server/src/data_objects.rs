use std::fmt::Display;

use actix_web::web;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use vendor_payment_engine::{
    db_types::{OrderId, PaymentMethod, PaymentStat},
    payment_objects::{Attestation, PaymentDetails, PaymentInstructions},
    settings_objects::{FlatSettings, SettingsForm, VendorInfo},
};

/// The envelope for every JSON response the server sends.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string(), data: None }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: message.to_string(), data: None }
    }

    /// Attaches a payload. Values that cannot be serialized are dropped.
    pub fn with_data<T: Serialize>(mut self, data: &T) -> Self {
        self.data = serde_json::to_value(data).ok();
        self
    }
}

/// Request bodies are accepted either as JSON or as an HTML form post.
pub type JsonOrForm<T> = web::Either<web::Json<T>, web::Form<T>>;

pub fn into_payload<T>(body: JsonOrForm<T>) -> T {
    match body {
        web::Either::Left(json) => json.into_inner(),
        web::Either::Right(form) => form.into_inner(),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NonceResponse {
    pub action: String,
    pub nonce: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CheckoutRequest {
    #[serde(default)]
    pub nonce: String,
}

/// A buyer's claim that they have paid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentSubmission {
    pub order_id: OrderId,
    #[serde(default)]
    pub transaction_id: String,
    #[serde(default)]
    pub sender_number: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub nonce: String,
}

impl PaymentSubmission {
    pub fn attestation(&self) -> Attestation {
        Attestation {
            transaction_reference: self.transaction_id.clone(),
            sender_number: self.sender_number.clone(),
            notes: self.notes.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyRequest {
    pub order_id: OrderId,
    /// `verified` or `rejected`
    pub status: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub nonce: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingsSubmission {
    #[serde(flatten)]
    pub form: SettingsForm,
    #[serde(default)]
    pub nonce: String,
}

/// What the vendor dashboard needs to render the payment settings page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingsPage {
    pub vendor: VendorInfo,
    pub settings: FlatSettings,
    pub active_methods: Vec<PaymentMethod>,
    pub stats: Vec<PaymentStat>,
    pub nonce: String,
}

/// The buyer's payment page, with the nonces its two forms need.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstructionsPage {
    pub instructions: PaymentInstructions,
    pub nonce: String,
    pub receipt_nonce: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationPage {
    pub details: PaymentDetails,
    pub nonce: String,
}

/// The state of a multipart receipt upload once every field has been read.
#[derive(Debug, Clone, Default)]
pub struct ReceiptUpload {
    pub order_id: Option<String>,
    pub method: Option<String>,
    pub nonce: Option<String>,
    pub declared_mime: Option<String>,
    pub bytes: Vec<u8>,
}
