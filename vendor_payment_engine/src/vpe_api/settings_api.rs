//! Vendor payment settings: one row per vendor and payment method.
//!
//! Reads never fail. A vendor without stored rows, or a storage failure, yields the all-disabled defaults, which in
//! turn make every vendor payment method unavailable at checkout.
use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{MethodExtra, NewVendorSetting, PaymentMethod, PaymentStat, VendorId, VendorPaymentSetting},
    traits::{VendorDirectory, VendorSettingsManagement},
    vpe_api::{
        errors::SettingsApiError,
        settings_objects::{FlatSettings, GatewayView, LabelledValue, SettingsForm, VendorInfo},
    },
};

/// Store-name metadata keys written by the supported marketplace plugins, in priority order.
const STORE_NAME_KEYS: [&str; 3] = ["dokan_store_name", "wcfmmp_store_name", "pv_shop_name"];

pub struct SettingsApi<B> {
    db: B,
}

impl<B: Debug> Debug for SettingsApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SettingsApi ({:?})", self.db)
    }
}

impl<B> SettingsApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> SettingsApi<B>
where B: VendorSettingsManagement
{
    /// Writes or replaces the vendor's settings for one method.
    ///
    /// Returns `Ok(false)` without touching storage if `vendor_id` is not a valid (positive) id.
    pub async fn upsert(
        &self,
        vendor_id: VendorId,
        method: PaymentMethod,
        enabled: bool,
        account_number: &str,
        extra: MethodExtra,
    ) -> Result<bool, SettingsApiError> {
        if vendor_id <= 0 {
            debug!("🪛️ Ignoring settings update for invalid vendor id {vendor_id}");
            return Ok(false);
        }
        if !extra.is_valid_for(method) {
            return Err(SettingsApiError::ExtraMismatch(method));
        }
        let setting = NewVendorSetting::new(vendor_id, method, account_number.trim(), enabled).with_extra(extra);
        self.db.upsert_vendor_setting(setting).await?;
        debug!("🪛️ Vendor #{vendor_id} {method} settings saved. Enabled: {enabled}");
        Ok(true)
    }

    /// Applies a full dashboard settings-form submission. Every method is written, including disabled ones.
    pub async fn save_settings_form(&self, vendor_id: VendorId, form: &SettingsForm) -> Result<(), SettingsApiError> {
        for (method, enabled, account, extra) in form.entries() {
            self.upsert(vendor_id, method, enabled, &account, extra).await?;
        }
        info!("🪛️ Payment settings form saved for vendor #{vendor_id}");
        Ok(())
    }

    async fn rows_or_empty(&self, vendor_id: VendorId) -> Vec<VendorPaymentSetting> {
        match self.db.fetch_vendor_settings(vendor_id).await {
            Ok(rows) => rows,
            Err(e) => {
                warn!("🪛️ Could not load payment settings for vendor #{vendor_id}. Treating all methods as disabled. {e}");
                vec![]
            },
        }
    }

    /// Every method's settings for the vendor, merged over the defaults.
    pub async fn get_all(&self, vendor_id: VendorId) -> FlatSettings {
        let mut flat = FlatSettings::defaults();
        for row in self.rows_or_empty(vendor_id).await {
            flat.merge_row(&row);
        }
        flat
    }

    /// The settings view used by the checkout gateways.
    pub async fn get_gateway_view(&self, vendor_id: VendorId) -> GatewayView {
        let rows = self.rows_or_empty(vendor_id).await;
        if rows.is_empty() {
            trace!("🪛️ Vendor #{vendor_id} has no payment settings");
        }
        GatewayView::from_rows(&rows)
    }

    /// Methods the vendor has enabled *and* provided an account number for.
    pub async fn active_payment_methods(&self, vendor_id: VendorId) -> Vec<PaymentMethod> {
        let view = self.get_gateway_view(vendor_id).await;
        PaymentMethod::ALL.into_iter().filter(|m| view.is_available(*m)).collect()
    }

    pub async fn vendor_has_payment_methods(&self, vendor_id: VendorId) -> bool {
        !self.active_payment_methods(vendor_id).await.is_empty()
    }

    /// The vendor's bank account, as labelled rows for display. Empty if the vendor never saved bank settings.
    pub async fn bank_details(&self, vendor_id: VendorId) -> Vec<LabelledValue> {
        let row = match self.db.fetch_vendor_setting(vendor_id, PaymentMethod::Bank).await {
            Ok(Some(row)) => row,
            Ok(None) => return vec![],
            Err(e) => {
                warn!("🪛️ Could not load bank details for vendor #{vendor_id}. {e}");
                return vec![];
            },
        };
        let bank = row.extra.bank_details().cloned().unwrap_or_default();
        vec![
            LabelledValue::new("Bank Name", bank.bank_name),
            LabelledValue::new("Account Name", bank.account_holder_name),
            LabelledValue::new("Account Number", row.account_number),
            LabelledValue::new("Branch", bank.branch),
            LabelledValue::new("Routing Number", bank.routing_number),
        ]
    }

    pub async fn payment_stats(&self, vendor_id: VendorId) -> Result<Vec<PaymentStat>, SettingsApiError> {
        let stats = self.db.fetch_payment_stats(vendor_id).await?;
        Ok(stats)
    }
}

impl<B> SettingsApi<B>
where B: VendorDirectory
{
    /// The vendor's shop name and contact email. The shop name comes from the first marketplace store-name field that
    /// is set, falling back to the vendor's display name.
    pub async fn vendor_info(&self, vendor_id: VendorId) -> VendorInfo {
        let profile = match self.db.fetch_vendor_profile(vendor_id).await {
            Ok(Some(p)) => p,
            Ok(None) => return VendorInfo::unknown(vendor_id),
            Err(e) => {
                warn!("🪛️ Could not load profile for vendor #{vendor_id}. {e}");
                return VendorInfo::unknown(vendor_id);
            },
        };
        let name = STORE_NAME_KEYS
            .iter()
            .filter_map(|k| profile.meta.get(*k))
            .map(|s| s.trim())
            .find(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or(profile.display_name);
        VendorInfo { id: vendor_id, name, email: profile.email }
    }
}
