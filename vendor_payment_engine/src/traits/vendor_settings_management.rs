use crate::{
    db_types::{NewVendorSetting, PaymentMethod, PaymentStat, VendorId, VendorPaymentSetting},
    traits::StorageError,
};

/// Persistence for vendor payment settings. There is at most one row per `(vendor_id, method)` pair.
#[allow(async_fn_in_trait)]
pub trait VendorSettingsManagement {
    /// Inserts the setting, or replaces every field of the existing row for the same vendor and method.
    async fn upsert_vendor_setting(&self, setting: NewVendorSetting) -> Result<VendorPaymentSetting, StorageError>;

    /// Fetches all the settings rows for the vendor. Methods the vendor never configured are simply absent.
    async fn fetch_vendor_settings(&self, vendor_id: VendorId) -> Result<Vec<VendorPaymentSetting>, StorageError>;

    async fn fetch_vendor_setting(
        &self,
        vendor_id: VendorId,
        method: PaymentMethod,
    ) -> Result<Option<VendorPaymentSetting>, StorageError>;

    /// Counts and sums the vendor's submitted transactions, grouped by payment method.
    async fn fetch_payment_stats(&self, vendor_id: VendorId) -> Result<Vec<PaymentStat>, StorageError>;
}
