use crate::{
    db_types::{VendorId, VendorProfile},
    traits::StorageError,
};

#[allow(async_fn_in_trait)]
pub trait VendorDirectory {
    /// Fetches the vendor's user profile, including any storefront plugin metadata.
    async fn fetch_vendor_profile(&self, vendor_id: VendorId) -> Result<Option<VendorProfile>, StorageError>;
}
