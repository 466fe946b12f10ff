use crate::{
    db_types::{Order, OrderId, VendorId},
    traits::StorageError,
};

/// Read access to the storefront's orders and products.
#[allow(async_fn_in_trait)]
pub trait OrderManagement {
    /// Fetches the order with its line items and metadata. If no order exists, `None` is returned.
    async fn fetch_order(&self, order_id: OrderId) -> Result<Option<Order>, StorageError>;

    /// Returns the vendor that owns the product, or `None` if the product no longer exists.
    async fn fetch_product_owner(&self, product_id: i64) -> Result<Option<VendorId>, StorageError>;
}
