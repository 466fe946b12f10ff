//! The vendor-facing half of the manual payment workflow: checking a buyer's submission and confirming or rejecting
//! it.
use std::fmt::Debug;

use chrono::Utc;
use log::*;

use crate::{
    db_types::{Actor, Order, OrderId, OrderUpdate, PaymentMethod, VendorId, VerificationDecision},
    helpers::order_meta::{self, method_key, MethodField},
    traits::{OrderManagement, VendorPaymentBackend},
    vpe_api::{
        errors::PaymentGatewayError,
        method_descriptor::MethodDescriptor,
        payment_objects::{verify_action, PaymentDetails, PaymentState, VerificationOutcome},
        vendor_resolver::VendorResolver,
    },
};

pub struct VerificationApi<B> {
    db: B,
    resolver: VendorResolver<B>,
}

impl<B: Debug> Debug for VerificationApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "VerificationApi ({:?})", self.db)
    }
}

impl<B> VerificationApi<B>
where B: OrderManagement
{
    pub fn new(db: B, resolver: VendorResolver<B>) -> Self {
        Self { db, resolver }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> VerificationApi<B>
where B: VendorPaymentBackend
{
    /// Runs the checks shared by every vendor-side operation and returns the order, its payment method and the
    /// vendor entitled to act on it.
    async fn authorize(
        &self,
        order_id: OrderId,
        actor: &Actor,
    ) -> Result<(Order, PaymentMethod, VendorId), PaymentGatewayError> {
        if !actor.is_authenticated() {
            return Err(PaymentGatewayError::NotLoggedIn);
        }
        let order = self.db.fetch_order(order_id).await?.ok_or(PaymentGatewayError::OrderNotFound(order_id))?;
        let method = order
            .meta
            .get(order_meta::PAYMENT_METHOD)
            .and_then(|m| m.parse::<PaymentMethod>().ok())
            .ok_or(PaymentGatewayError::NotApplicable(order_id))?;
        let vendor_id = self.resolver.resolve_for_verification(&order).await;
        if !(actor.is_vendor(vendor_id) || actor.is_elevated()) {
            warn!("🔄️ {actor:?} is not allowed to verify order {order_id}, which belongs to vendor #{vendor_id}");
            return Err(PaymentGatewayError::PermissionDenied("You do not have permission to verify this order"));
        }
        Ok((order, method, vendor_id))
    }

    /// Confirms or rejects the buyer's payment for the order.
    ///
    /// Only the order's vendor (or a store manager) may do this, and only once per submission. The verification
    /// record, the new order status and the latest pending transaction's status are written atomically.
    pub async fn verify(
        &self,
        order_id: OrderId,
        actor: &Actor,
        decision: VerificationDecision,
        notes: &str,
    ) -> Result<VerificationOutcome, PaymentGatewayError> {
        let (order, method, vendor_id) = self.authorize(order_id, actor).await?;
        if let Some(status) = order.meta.get(order_meta::VERIFICATION_STATUS) {
            if status == "verified" || status == "rejected" {
                info!("🔄️ Order {order_id} payment was already {status}. Ignoring new decision: {decision}");
                return Err(PaymentGatewayError::AlreadyVerified(status.to_string()));
            }
        }
        let notes = notes.trim();
        let prefix = match decision {
            VerificationDecision::Verified => "Payment verified by vendor.",
            VerificationDecision::Rejected => "Payment rejected by vendor.",
        };
        let note = if notes.is_empty() { prefix.to_string() } else { format!("{prefix} {notes}") };
        let order_status = decision.order_status();
        let verified_at = Utc::now();
        let verifier = actor.user_id.map(|id| id.to_string()).unwrap_or_default();
        let update = OrderUpdate::default()
            .set_meta(order_meta::VERIFICATION_STATUS, decision.to_string())
            .set_meta(order_meta::VERIFICATION_NOTES, notes)
            .set_meta(order_meta::VERIFICATION_DATE, verified_at.to_rfc3339())
            .set_meta(order_meta::VERIFIED_BY, verifier)
            .with_status(order_status, note);
        let transaction =
            self.db.update_order_and_settle_transaction(order_id, update, decision.transaction_status()).await?;
        info!("🔄️ {method} payment for order {order_id} (vendor #{vendor_id}) marked as {decision}. Order is now {order_status}");
        Ok(VerificationOutcome { order_id, decision, order_status, transaction, verified_at })
    }

    /// The payment information shown to the vendor for the order. Subject to the same permission checks as
    /// [`verify`](Self::verify).
    pub async fn payment_details(&self, order_id: OrderId, actor: &Actor) -> Result<PaymentDetails, PaymentGatewayError> {
        let (order, method, vendor_id) = self.authorize(order_id, actor).await?;
        let meta = |key: &str| order.meta.get(key).map(str::to_string);
        let field = |f: MethodField| meta(&method_key(method, f));
        Ok(PaymentDetails {
            order_id,
            order_status: order.status,
            state: PaymentState::of(&order),
            method,
            display_name: MethodDescriptor::for_method(method).display_name.to_string(),
            amount: order.total,
            vendor_id,
            vendor_account: meta(order_meta::VENDOR_ACCOUNT),
            transaction_id: field(MethodField::TransactionId),
            sender_number: field(MethodField::SenderNumber),
            payment_notes: field(MethodField::PaymentNotes),
            payment_date: field(MethodField::PaymentDate),
            receipt_url: field(MethodField::ReceiptFile),
            receipt_filename: field(MethodField::ReceiptFilename),
            verification_status: meta(order_meta::VERIFICATION_STATUS).unwrap_or_else(|| "pending".to_string()),
            verification_notes: meta(order_meta::VERIFICATION_NOTES),
            verification_date: meta(order_meta::VERIFICATION_DATE),
            nonce_action: verify_action(order_id),
        })
    }
}
