//! The buyer-facing half of the manual payment workflow.
//!
//! A [`PaymentGateway`] is parameterised by a [`MethodDescriptor`]; the server registers one per payment method in a
//! [`PaymentGateways`] set. The flow for a single order is:
//!
//! 1. [`initiate`](PaymentGateway::initiate) at checkout: resolve the vendor, check the method is available, and
//!    capture the vendor's account number on the order.
//! 2. [`render_instructions`](PaymentGateway::render_instructions): show the buyer where to send the money.
//! 3. [`submit_attestation`](PaymentGateway::submit_attestation): the buyer supplies the transaction reference. The
//!    order goes on hold and a pending transaction is recorded.
//!
//! Verification by the vendor is handled by [`VerificationApi`](super::verification_api::VerificationApi).
use std::{collections::BTreeMap, fmt::Debug};

use chrono::Utc;
use log::*;

use crate::{
    db_types::{Actor, NewTransaction, Order, OrderId, OrderStatusType, OrderUpdate, PaymentMethod, VendorId},
    helpers::order_meta::{self, method_key, MethodField},
    traits::{OrderManagement, VendorPaymentBackend},
    vpe_api::{
        errors::PaymentGatewayError,
        method_descriptor::MethodDescriptor,
        payment_objects::{
            order_pay_url,
            order_received_url,
            Attestation,
            AttestationForm,
            InitiateResult,
            PaymentInstructions,
            PaymentState,
            SubmissionResult,
            ThankYou,
        },
        settings_api::SettingsApi,
        vendor_resolver::VendorResolver,
    },
};

pub struct PaymentGateway<B> {
    descriptor: &'static MethodDescriptor,
    db: B,
    settings: SettingsApi<B>,
    resolver: VendorResolver<B>,
}

impl<B: Debug> Debug for PaymentGateway<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PaymentGateway<{}> ({:?})", self.descriptor.method, self.db)
    }
}

impl<B> PaymentGateway<B>
where B: Clone + OrderManagement
{
    pub fn new(descriptor: &'static MethodDescriptor, db: B, resolver: VendorResolver<B>) -> Self {
        let settings = SettingsApi::new(db.clone());
        Self { descriptor, db, settings, resolver }
    }

    pub fn descriptor(&self) -> &'static MethodDescriptor {
        self.descriptor
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> PaymentGateway<B>
where B: VendorPaymentBackend
{
    fn method(&self) -> PaymentMethod {
        self.descriptor.method
    }

    async fn fetch_order(&self, order_id: OrderId) -> Result<Order, PaymentGatewayError> {
        self.db.fetch_order(order_id).await?.ok_or(PaymentGatewayError::OrderNotFound(order_id))
    }

    fn snapshot_vendor(order: &Order) -> Option<VendorId> {
        order.meta.get(order_meta::VENDOR_ID).and_then(|v| v.parse().ok()).filter(|v: &VendorId| *v > 0)
    }

    /// Starts a manual payment at checkout.
    ///
    /// The method must be enabled for the order's vendor and have an account number. On success the vendor, method
    /// and account are captured on the order, the order is marked pending, stock is reduced and the buyer's cart is
    /// emptied, all in one atomic update.
    ///
    /// Checkout can be repeated until the buyer submits a reference, and again after a rejection. It is refused once a
    /// submission is awaiting the vendor or has been verified.
    pub async fn initiate(&self, order_id: OrderId) -> Result<InitiateResult, PaymentGatewayError> {
        let order = self.fetch_order(order_id).await?;
        match PaymentState::of(&order) {
            PaymentState::Verified => return Err(PaymentGatewayError::AlreadyVerified("verified".into())),
            PaymentState::AwaitingConfirmation => return Err(PaymentGatewayError::PaymentAlreadySubmitted(order_id)),
            _ => {},
        }
        if !matches!(order.status, OrderStatusType::Pending | OrderStatusType::Failed) {
            info!("🔄️ Checkout refused for order {order_id}, which is {}", order.status);
            return Err(PaymentGatewayError::OrderNotPayable(order.status));
        }
        let vendor_id = self.resolver.resolve(&order).await;
        let view = self.settings.get_gateway_view(vendor_id).await;
        let method = self.method();
        let account = match view.account(method) {
            Some(account) if view.is_enabled(method) => account.to_string(),
            _ => {
                info!("🔄️ {method} is not available for order {order_id} (vendor #{vendor_id})");
                return Err(PaymentGatewayError::MethodUnavailable(self.descriptor.display_name));
            },
        };
        let update = OrderUpdate::default()
            .set_meta(order_meta::VENDOR_ID, vendor_id.to_string())
            .set_meta(order_meta::PAYMENT_METHOD, method.as_str())
            .set_meta(order_meta::VENDOR_ACCOUNT, account)
            .with_status(OrderStatusType::Pending, format!("Awaiting {} payment confirmation", self.descriptor.display_name))
            .reduce_stock()
            .empty_cart();
        self.db.update_order(order_id, update).await?;
        info!("🔄️ Order {order_id} will be paid to vendor #{vendor_id} by {method}");
        Ok(InitiateResult { order_id, vendor_id, redirect: order_pay_url(order_id) })
    }

    /// The payment page for an order that has been through [`initiate`](Self::initiate). This has no side effects.
    ///
    /// The account shown is the one captured at checkout, even if the vendor has since changed their settings.
    pub async fn render_instructions(&self, order_id: OrderId) -> Result<PaymentInstructions, PaymentGatewayError> {
        let order = self.fetch_order(order_id).await?;
        let method = self.method();
        let snapshot_method = order.meta.get(order_meta::PAYMENT_METHOD);
        let vendor_account = match (snapshot_method, order.meta.get(order_meta::VENDOR_ACCOUNT)) {
            (Some(m), Some(account)) if m == method.as_str() => account.to_string(),
            _ => {
                warn!("🔄️ Order {order_id} has no {method} payment snapshot. Was checkout skipped?");
                return Err(PaymentGatewayError::MissingPaymentSnapshot(order_id));
            },
        };
        let vendor_id = match Self::snapshot_vendor(&order) {
            Some(id) => id,
            None => self.resolver.resolve(&order).await,
        };
        let vendor = self.settings.vendor_info(vendor_id).await;
        let bank_details =
            if self.descriptor.show_bank_details { self.settings.bank_details(vendor_id).await } else { vec![] };
        let name = self.descriptor.display_name;
        let form = AttestationForm {
            nonce_action: self.descriptor.submit_action(),
            transaction_id_label: format!("{name} Transaction ID:"),
            transaction_id_hint: format!("Enter the transaction ID from your {name} app/receipt"),
            sender_number_label: format!("Your {name} Number:"),
            sender_number_hint: format!("Optional: Your {name} account number for verification"),
        };
        Ok(PaymentInstructions {
            order_id,
            method,
            display_name: name.to_string(),
            color: self.descriptor.color.to_string(),
            description: self.descriptor.description.to_string(),
            account_label: self.descriptor.account_label.to_string(),
            vendor_account,
            vendor,
            amount: order.total,
            currency: order.currency,
            instructions: self.descriptor.instructions.iter().map(|s| s.to_string()).collect(),
            bank_details,
            form,
        })
    }

    /// Records the buyer's claim that they have sent the money.
    ///
    /// Only the buyer (or a store manager) may submit, and only through the method chosen at checkout. The submission
    /// details, the on-hold status and a new pending transaction for the current order total are written atomically.
    /// A rejection is cleared so that the payment can be re-submitted and verified again. A verified payment cannot be
    /// re-submitted.
    pub async fn submit_attestation(
        &self,
        order_id: OrderId,
        actor: &Actor,
        attestation: Attestation,
    ) -> Result<SubmissionResult, PaymentGatewayError> {
        let reference = attestation.transaction_reference.trim().to_string();
        if reference.is_empty() {
            return Err(PaymentGatewayError::MissingTransactionReference);
        }
        let order = self.fetch_order(order_id).await?;
        if !(actor.owns_order(&order) || actor.is_elevated()) {
            warn!("🔄️ {actor:?} tried to submit payment for order {order_id}, which belongs to {:?}", order.customer_id);
            return Err(PaymentGatewayError::PermissionDenied("You do not have permission to update this order."));
        }
        let method = self.method();
        if order.meta.get(order_meta::VERIFICATION_STATUS) == Some("verified") {
            info!("🔄️ Order {order_id} payment is already verified. Ignoring new reference [{reference}]");
            return Err(PaymentGatewayError::AlreadyVerified("verified".into()));
        }
        if !matches!(order.status, OrderStatusType::Pending | OrderStatusType::OnHold | OrderStatusType::Failed) {
            info!("🔄️ Payment submission refused for order {order_id}, which is {}", order.status);
            return Err(PaymentGatewayError::OrderNotPayable(order.status));
        }
        if let Some(chosen) = order.meta.get(order_meta::PAYMENT_METHOD).filter(|m| *m != method.as_str()) {
            warn!("🔄️ Order {order_id} was checked out with {chosen}, but a {method} reference was submitted");
            return Err(PaymentGatewayError::WrongPaymentMethod(self.descriptor.display_name));
        }
        let vendor_id = match Self::snapshot_vendor(&order) {
            Some(id) => id,
            None => self.resolver.resolve(&order).await,
        };
        let mut update = OrderUpdate::default()
            .set_meta(method_key(method, MethodField::TransactionId), reference.clone())
            .set_meta(method_key(method, MethodField::PaymentDate), Utc::now().to_rfc3339())
            .delete_meta(order_meta::VERIFICATION_STATUS)
            .delete_meta(order_meta::VERIFICATION_NOTES)
            .delete_meta(order_meta::VERIFICATION_DATE)
            .delete_meta(order_meta::VERIFIED_BY)
            .with_status(
                OrderStatusType::OnHold,
                format!("{} payment submitted. Transaction ID: {reference}", self.descriptor.display_name),
            );
        let optional_fields = [
            (MethodField::SenderNumber, attestation.sender_number.as_deref()),
            (MethodField::PaymentNotes, attestation.notes.as_deref()),
        ];
        for (field, value) in optional_fields {
            match value.map(str::trim).filter(|v| !v.is_empty()) {
                Some(v) => update = update.set_meta(method_key(method, field), v),
                None => update = update.delete_meta(method_key(method, field)),
            }
        }
        if !order.meta.contains_key(order_meta::PAYMENT_METHOD) {
            update = update.set_meta(order_meta::PAYMENT_METHOD, method.as_str());
        }
        if Self::snapshot_vendor(&order).is_none() {
            update = update.set_meta(order_meta::VENDOR_ID, vendor_id.to_string());
        }
        let transaction = NewTransaction {
            order_id,
            vendor_id,
            payment_method: method,
            transaction_id: reference,
            amount: order.total,
        };
        let transaction = self.db.update_order_with_transaction(update, transaction).await?;
        info!(
            "🔄️ {method} payment of {} submitted for order {order_id} with reference [{}]",
            transaction.amount, transaction.transaction_id
        );
        Ok(SubmissionResult { transaction, redirect: order_received_url(order_id) })
    }

    /// The confirmation shown after submission. `None` if the buyer has not submitted a reference for this method.
    pub async fn render_thankyou(&self, order_id: OrderId) -> Result<Option<ThankYou>, PaymentGatewayError> {
        let order = self.fetch_order(order_id).await?;
        let method = self.method();
        let result = order.meta.get(&method_key(method, MethodField::TransactionId)).map(|tx_id| ThankYou {
            order_id,
            method,
            transaction_id: tx_id.to_string(),
            message: format!(
                "Thank you! We have received your {} payment information. Your order is being verified and will be \
                 processed shortly.",
                self.descriptor.display_name
            ),
        });
        Ok(result)
    }
}

/// One gateway per payment method, sharing a backend and a vendor resolver.
pub struct PaymentGateways<B> {
    gateways: BTreeMap<PaymentMethod, PaymentGateway<B>>,
}

impl<B: Debug> Debug for PaymentGateways<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PaymentGateways ({:?})", self.gateways.keys().collect::<Vec<_>>())
    }
}

impl<B> PaymentGateways<B>
where B: Clone + OrderManagement
{
    pub fn new(db: B, resolver: VendorResolver<B>) -> Self {
        let gateways = PaymentMethod::ALL
            .into_iter()
            .map(|m| (m, PaymentGateway::new(MethodDescriptor::for_method(m), db.clone(), resolver.clone())))
            .collect();
        Self { gateways }
    }

    pub fn get(&self, method: PaymentMethod) -> Option<&PaymentGateway<B>> {
        self.gateways.get(&method)
    }
}
