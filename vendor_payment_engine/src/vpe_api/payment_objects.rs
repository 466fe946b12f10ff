use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    db_types::{Amount, Order, OrderId, OrderStatusType, PaymentMethod, Transaction, VendorId, VerificationDecision},
    helpers::order_meta::{self, method_key, MethodField},
    vpe_api::settings_objects::{LabelledValue, VendorInfo},
};

/// The CSRF action that protects checkout with a vendor payment method.
pub const CHECKOUT_ACTION: &str = "vpg_checkout";

/// Where the buyer is sent after checkout, to see the payment instructions.
pub fn order_pay_url(order_id: OrderId) -> String {
    format!("/checkout/order-pay/{}?pay_for_order=true", order_id.value())
}

/// Where the buyer is sent after submitting their transaction reference.
pub fn order_received_url(order_id: OrderId) -> String {
    format!("/checkout/order-received/{}", order_id.value())
}

//--------------------------------------     PaymentState     ---------------------------------------------------------
/// Where an order is in the manual payment workflow, derived from its metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentState {
    /// Not paid through a vendor payment method.
    Uninitiated,
    /// Checkout completed; the buyer has not yet submitted a transaction reference.
    Initiated,
    /// The buyer submitted a reference and the vendor has not yet acted on it.
    AwaitingConfirmation,
    Verified,
    Rejected,
}

impl PaymentState {
    pub fn of(order: &Order) -> Self {
        let method = match order.meta.get(order_meta::PAYMENT_METHOD).and_then(|m| m.parse::<PaymentMethod>().ok()) {
            Some(m) => m,
            None => return PaymentState::Uninitiated,
        };
        match order.meta.get(order_meta::VERIFICATION_STATUS) {
            Some("verified") => PaymentState::Verified,
            Some("rejected") => PaymentState::Rejected,
            _ if order.meta.contains_key(&method_key(method, MethodField::TransactionId)) => {
                PaymentState::AwaitingConfirmation
            },
            _ => PaymentState::Initiated,
        }
    }
}

//--------------------------------------   Buyer-side objects  ---------------------------------------------------------
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attestation {
    pub transaction_reference: String,
    pub sender_number: Option<String>,
    pub notes: Option<String>,
}

impl Attestation {
    pub fn new<S: Into<String>>(transaction_reference: S) -> Self {
        Self { transaction_reference: transaction_reference.into(), sender_number: None, notes: None }
    }

    pub fn with_sender_number<S: Into<String>>(mut self, sender: S) -> Self {
        self.sender_number = Some(sender.into());
        self
    }

    pub fn with_notes<S: Into<String>>(mut self, notes: S) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitiateResult {
    pub order_id: OrderId,
    pub vendor_id: VendorId,
    pub redirect: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionResult {
    pub transaction: Transaction,
    pub redirect: String,
}

/// Labels for the buyer's attestation form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttestationForm {
    /// CSRF action the submission must carry a nonce for.
    pub nonce_action: String,
    pub transaction_id_label: String,
    pub transaction_id_hint: String,
    pub sender_number_label: String,
    pub sender_number_hint: String,
}

/// Everything the buyer needs to make a manual payment for one order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentInstructions {
    pub order_id: OrderId,
    pub method: PaymentMethod,
    pub display_name: String,
    pub color: String,
    /// One-line summary of the method, shown under its name at checkout.
    pub description: String,
    pub account_label: String,
    /// The vendor account captured at checkout.
    pub vendor_account: String,
    pub vendor: VendorInfo,
    pub amount: Amount,
    pub currency: String,
    pub instructions: Vec<String>,
    /// Only populated for bank transfers.
    pub bank_details: Vec<LabelledValue>,
    pub form: AttestationForm,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThankYou {
    pub order_id: OrderId,
    pub method: PaymentMethod,
    pub transaction_id: String,
    pub message: String,
}

//--------------------------------------  Vendor-side objects  ---------------------------------------------------------
/// The payment information a vendor sees when checking an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentDetails {
    pub order_id: OrderId,
    pub order_status: OrderStatusType,
    pub state: PaymentState,
    pub method: PaymentMethod,
    pub display_name: String,
    pub amount: Amount,
    pub vendor_id: VendorId,
    pub vendor_account: Option<String>,
    pub transaction_id: Option<String>,
    pub sender_number: Option<String>,
    pub payment_notes: Option<String>,
    pub payment_date: Option<String>,
    pub receipt_url: Option<String>,
    pub receipt_filename: Option<String>,
    /// `pending`, `verified` or `rejected`.
    pub verification_status: String,
    pub verification_notes: Option<String>,
    pub verification_date: Option<String>,
    /// CSRF action a verification request for this order must carry a nonce for.
    pub nonce_action: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationOutcome {
    pub order_id: OrderId,
    pub decision: VerificationDecision,
    pub order_status: OrderStatusType,
    /// The transaction that was settled. `None` if the order had no pending transaction.
    pub transaction: Option<Transaction>,
    pub verified_at: DateTime<Utc>,
}

/// The CSRF action that protects verification of the given order.
pub fn verify_action(order_id: OrderId) -> String {
    format!("vpg_verify_{}", order_id.value())
}

//--------------------------------------        Receipts       ---------------------------------------------------------
/// The CSRF action that protects receipt uploads.
pub const UPLOAD_RECEIPT_ACTION: &str = "vpg_upload_receipt";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptRef {
    pub url: String,
    pub filename: String,
    pub mime_type: String,
    pub size: usize,
}
