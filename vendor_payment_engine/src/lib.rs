//! Vendor Payment Engine
//!
//! The vendor payment engine lets marketplace vendors take payment straight into their own mobile-wallet (bKash,
//! Nagad, Rocket, Upay) or bank accounts. Nothing is confirmed automatically: the buyer pays outside the shop, submits
//! the transaction reference, and the vendor confirms or rejects it by hand.
//!
//! The library is divided into three main sections:
//! 1. Storage backend traits ([`mod@traits`]) and the SQLite implementation. You should never need to access the
//!    database directly. Instead, use the public API provided by the payment engine. The exception is the data types
//!    used in the database. These are defined in the `db_types` module and are public.
//! 2. The payment engine public API ([`mod@vpe_api`]). This provides the settings store, the vendor resolver, the
//!    per-method payment gateways, the verification workflow and receipt uploads.
//! 3. Helpers, such as the order metadata keys the workflow reads and writes.
#[cfg(feature = "sqlite")]
mod sqlite;

pub mod db_types;
pub mod helpers;
pub mod traits;
pub mod vpe_api;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

#[cfg(feature = "sqlite")]
pub use sqlite::{SqliteDatabase, SqliteDatabaseError};
pub use traits::{
    OrderManagement,
    PaymentGatewayDatabase,
    PurgeSummary,
    StorageError,
    TransactionManagement,
    VendorDirectory,
    VendorPaymentBackend,
    VendorSettingsManagement,
};
pub use vpe_api::{
    errors::{ErrorKind, PaymentGatewayError, SettingsApiError},
    gateway::{PaymentGateway, PaymentGateways},
    maintenance_api::MaintenanceApi,
    method_descriptor::MethodDescriptor,
    payment_objects,
    receipt_api::ReceiptApi,
    receipt_store::{LocalReceiptStore, ReceiptStore, ReceiptStoreError},
    settings_api::SettingsApi,
    settings_objects,
    vendor_resolver::{VendorLinkageProvider, VendorResolver},
    verification_api::VerificationApi,
};
