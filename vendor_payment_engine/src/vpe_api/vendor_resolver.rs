//! Works out which vendor an order belongs to.
//!
//! Marketplace plugins record the owning vendor on the order in different ways. Each convention is a
//! [`VendorLinkageProvider`]; the resolver asks them in priority order, then falls back to the owner of the first line
//! item whose product still exists, and finally to a configured default vendor.
use std::{fmt::Debug, sync::Arc};

use log::*;

use crate::{
    db_types::{Order, VendorId},
    helpers::order_meta,
    traits::OrderManagement,
};

pub const DEFAULT_FALLBACK_VENDOR: VendorId = 1;

pub trait VendorLinkageProvider: Send + Sync {
    fn name(&self) -> &str;

    /// The vendor this provider links the order to, if any.
    fn vendor_for(&self, order: &Order) -> Option<VendorId>;
}

/// A provider that reads a positive vendor id from a single order metadata key.
#[derive(Debug, Clone, Copy)]
pub struct MetaKeyLinkage {
    name: &'static str,
    meta_key: &'static str,
}

impl MetaKeyLinkage {
    pub const fn new(name: &'static str, meta_key: &'static str) -> Self {
        Self { name, meta_key }
    }
}

impl VendorLinkageProvider for MetaKeyLinkage {
    fn name(&self) -> &str {
        self.name
    }

    fn vendor_for(&self, order: &Order) -> Option<VendorId> {
        order.meta.get(self.meta_key).and_then(|v| v.trim().parse::<VendorId>().ok()).filter(|id| *id > 0)
    }
}

pub const DOKAN_LINKAGE: MetaKeyLinkage = MetaKeyLinkage::new("dokan", "_dokan_vendor_id");
pub const WCFM_LINKAGE: MetaKeyLinkage = MetaKeyLinkage::new("wcfm", "_wcfm_vendor");
pub const WC_VENDORS_LINKAGE: MetaKeyLinkage = MetaKeyLinkage::new("wc-vendors", "_wcv_vendor_id");

pub fn default_linkage_providers() -> Vec<Arc<dyn VendorLinkageProvider>> {
    vec![Arc::new(DOKAN_LINKAGE), Arc::new(WCFM_LINKAGE), Arc::new(WC_VENDORS_LINKAGE)]
}

#[derive(Clone)]
pub struct VendorResolver<B> {
    db: B,
    providers: Vec<Arc<dyn VendorLinkageProvider>>,
    fallback_vendor: VendorId,
}

impl<B: Debug> Debug for VendorResolver<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names = self.providers.iter().map(|p| p.name()).collect::<Vec<_>>();
        write!(f, "VendorResolver ({:?}, providers: {names:?}, fallback: {})", self.db, self.fallback_vendor)
    }
}

impl<B> VendorResolver<B>
where B: OrderManagement
{
    pub fn new(db: B) -> Self {
        Self { db, providers: default_linkage_providers(), fallback_vendor: DEFAULT_FALLBACK_VENDOR }
    }

    pub fn with_providers(mut self, providers: Vec<Arc<dyn VendorLinkageProvider>>) -> Self {
        self.providers = providers;
        self
    }

    pub fn with_fallback_vendor(mut self, vendor_id: VendorId) -> Self {
        self.fallback_vendor = vendor_id;
        self
    }

    pub fn fallback_vendor(&self) -> VendorId {
        self.fallback_vendor
    }

    /// Returns the vendor that owns the order. Always returns a vendor; this never fails.
    pub async fn resolve(&self, order: &Order) -> VendorId {
        for provider in &self.providers {
            if let Some(id) = provider.vendor_for(order) {
                trace!("🔄️ Order {} linked to vendor #{id} by {}", order.id, provider.name());
                return id;
            }
        }
        for item in &order.items {
            match self.db.fetch_product_owner(item.product_id).await {
                Ok(Some(vendor_id)) if vendor_id > 0 => {
                    trace!("🔄️ Order {} belongs to vendor #{vendor_id} via product {}", order.id, item.product_id);
                    return vendor_id;
                },
                Ok(_) => trace!("🔄️ Product {} on order {} no longer exists", item.product_id, order.id),
                Err(e) => warn!("🔄️ Could not look up owner of product {}. {e}", item.product_id),
            }
        }
        debug!("🔄️ No vendor found for order {}. Using fallback vendor #{}", order.id, self.fallback_vendor);
        self.fallback_vendor
    }

    /// The vendor entitled to verify payment for the order: the vendor captured at checkout if there is one, otherwise
    /// the result of [`resolve`](Self::resolve).
    pub async fn resolve_for_verification(&self, order: &Order) -> VendorId {
        let snapshot = order.meta.get(order_meta::VENDOR_ID).and_then(|v| v.parse::<VendorId>().ok()).filter(|v| *v > 0);
        match snapshot {
            Some(id) => id,
            None => self.resolve(order).await,
        }
    }
}
