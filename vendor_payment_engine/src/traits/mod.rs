//! #  Storage backends for the vendor payment engine.
//!
//! This module provides the interfaces that define the interface contracts of the payment engine database *backends*.
//!
//! ## Settings
//! Each vendor holds at most one settings row per payment method. The [`VendorSettingsManagement`] trait reads and
//! writes those rows and aggregates submitted transactions for the vendor dashboard.
//!
//! ## Orders
//! Orders, products, carts and vendor profiles belong to the host storefront. The engine only needs to read them
//! ([`OrderManagement`], [`VendorDirectory`]) and to apply small atomic updates to an order's status, metadata and
//! notes log ([`PaymentGatewayDatabase`]).
//!
//! ## Traits
//! * [`PaymentGatewayDatabase`] defines the write side. Every method applies all of its changes in a single atomic
//!   step, or none of them.
//! * [`OrderManagement`] provides read access to orders and product ownership.
//! * [`TransactionManagement`] provides read access to submitted payment transactions.
//! * [`VendorSettingsManagement`] stores per-vendor payment method settings.
//! * [`VendorDirectory`] looks up display information for vendors.
mod data_objects;
mod errors;
mod order_management;
mod payment_gateway_database;
mod transaction_management;
mod vendor_directory;
mod vendor_settings_management;

pub use data_objects::PurgeSummary;
pub use errors::StorageError;
pub use order_management::OrderManagement;
pub use payment_gateway_database::PaymentGatewayDatabase;
pub use transaction_management::TransactionManagement;
pub use vendor_directory::VendorDirectory;
pub use vendor_settings_management::VendorSettingsManagement;

/// Everything the payment APIs need from a single backend. Implemented automatically for any type that implements
/// each of the component traits.
pub trait VendorPaymentBackend:
    PaymentGatewayDatabase + OrderManagement + TransactionManagement + VendorSettingsManagement + VendorDirectory
{
}

impl<T> VendorPaymentBackend for T where
    T: PaymentGatewayDatabase + OrderManagement + TransactionManagement + VendorSettingsManagement + VendorDirectory
{
}
