//! Optional payment receipts uploaded by buyers. Uploading a receipt does not change the order's status or its
//! transactions; it only attaches a link to the file.
use std::fmt::Debug;

use chrono::Utc;
use log::*;

use crate::{
    db_types::{Actor, OrderId, OrderUpdate, PaymentMethod},
    helpers::{
        order_meta::{method_key, MethodField},
        ReceiptMime,
        MAX_RECEIPT_SIZE,
    },
    traits::{OrderManagement, PaymentGatewayDatabase},
    vpe_api::{
        errors::PaymentGatewayError,
        payment_objects::ReceiptRef,
        receipt_store::ReceiptStore,
    },
};

pub struct ReceiptApi<B, S> {
    db: B,
    store: S,
}

impl<B: Debug, S: Debug> Debug for ReceiptApi<B, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ReceiptApi ({:?}, {:?})", self.db, self.store)
    }
}

/// The stored name of a receipt: unique per upload, and free of anything the buyer supplied.
pub fn receipt_blob_name(order_id: OrderId, method: PaymentMethod, mime: ReceiptMime) -> String {
    format!(
        "vpg-receipt-order-{}-{method}-{}-{:08x}.{}",
        order_id.value(),
        Utc::now().timestamp(),
        rand::random::<u32>(),
        mime.extension()
    )
}

impl<B, S> ReceiptApi<B, S>
where
    B: OrderManagement + PaymentGatewayDatabase,
    S: ReceiptStore,
{
    pub fn new(db: B, store: S) -> Self {
        Self { db, store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Validates and stores a receipt, then links it from the order. If the link cannot be saved, the stored file is
    /// removed again.
    ///
    /// The file type is taken from the content itself; `declared_mime` is only logged. Only the buyer (or a store
    /// manager) may upload a receipt for an order.
    pub async fn upload(
        &self,
        order_id: OrderId,
        method: PaymentMethod,
        bytes: &[u8],
        declared_mime: Option<&str>,
        actor: &Actor,
    ) -> Result<ReceiptRef, PaymentGatewayError> {
        if bytes.is_empty() {
            return Err(PaymentGatewayError::EmptyReceipt);
        }
        let mime = ReceiptMime::detect(bytes).ok_or_else(|| {
            info!("🧾️ Rejected receipt for order {order_id}. Declared type: {declared_mime:?}");
            PaymentGatewayError::UnsupportedReceiptType
        })?;
        if bytes.len() > MAX_RECEIPT_SIZE {
            return Err(PaymentGatewayError::ReceiptTooLarge(bytes.len()));
        }
        let order = self.db.fetch_order(order_id).await?.ok_or(PaymentGatewayError::OrderNotFound(order_id))?;
        if !(actor.owns_order(&order) || actor.is_elevated()) {
            return Err(PaymentGatewayError::PermissionDenied(
                "You do not have permission to upload files for this order.",
            ));
        }
        let filename = receipt_blob_name(order_id, method, mime);
        let url = self
            .store
            .store(&filename, bytes, mime)
            .await
            .map_err(|e| PaymentGatewayError::ReceiptStoreError(e.to_string()))?;
        let update = OrderUpdate::default()
            .set_meta(method_key(method, MethodField::ReceiptFile), url.clone())
            .set_meta(method_key(method, MethodField::ReceiptFilename), filename.clone());
        if let Err(e) = self.db.update_order(order_id, update).await {
            warn!("🧾️ Receipt {filename} was stored but could not be linked to order {order_id}: {e}");
            if let Err(e) = self.store.remove(&filename).await {
                warn!("🧾️ Could not remove orphaned receipt {filename}: {e}");
            }
            return Err(e.into());
        }
        info!("🧾️ Receipt {filename} attached to order {order_id}");
        Ok(ReceiptRef { url, filename, mime_type: mime.mime_type().to_string(), size: bytes.len() })
    }

    /// The URL of the receipt uploaded for the order and method, if any.
    pub async fn receipt_url(&self, order_id: OrderId, method: PaymentMethod) -> Result<Option<String>, PaymentGatewayError> {
        let order = self.db.fetch_order(order_id).await?.ok_or(PaymentGatewayError::OrderNotFound(order_id))?;
        Ok(order.meta.get(&method_key(method, MethodField::ReceiptFile)).map(str::to_string))
    }
}
