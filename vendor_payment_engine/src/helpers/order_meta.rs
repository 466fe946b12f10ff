//! Order metadata keys written by the payment flow.
//!
//! Keys shared by every method use the `_vpg_` prefix. Keys that belong to a single method are prefixed with the
//! method name, e.g. `_bkash_transaction_id`.
use std::fmt::Display;

use crate::db_types::PaymentMethod;

/// The vendor that was resolved for the order at checkout.
pub const VENDOR_ID: &str = "_vpg_vendor_id";
/// The payment method chosen at checkout.
pub const PAYMENT_METHOD: &str = "_vpg_payment_method";
/// The vendor's account number at the time of checkout. Later settings changes do not affect it.
pub const VENDOR_ACCOUNT: &str = "_vpg_vendor_account";
pub const VERIFICATION_STATUS: &str = "_vpg_verification_status";
pub const VERIFICATION_NOTES: &str = "_vpg_verification_notes";
pub const VERIFICATION_DATE: &str = "_vpg_verification_date";
pub const VERIFIED_BY: &str = "_vpg_verified_by";

/// Every prefix a full purge removes from order metadata.
pub const PURGE_PREFIXES: [&str; 6] = ["_vpg_", "_bkash_", "_nagad_", "_rocket_", "_upay_", "_bank_"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodField {
    TransactionId,
    SenderNumber,
    PaymentNotes,
    PaymentDate,
    ReceiptFile,
    ReceiptFilename,
}

impl Display for MethodField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            MethodField::TransactionId => "transaction_id",
            MethodField::SenderNumber => "sender_number",
            MethodField::PaymentNotes => "payment_notes",
            MethodField::PaymentDate => "payment_date",
            MethodField::ReceiptFile => "receipt_file",
            MethodField::ReceiptFilename => "receipt_filename",
        };
        f.write_str(s)
    }
}

pub fn method_key(method: PaymentMethod, field: MethodField) -> String {
    format!("_{method}_{field}")
}
