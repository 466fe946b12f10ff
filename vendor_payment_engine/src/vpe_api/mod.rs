//! # Vendor payment engine public API
//!
//! The `vpe_api` module exposes the programmatic API for the vendor payment engine.
//! The API is modular, so that clients of the API can pick and choose the functionality they want.
//!
//! * [`settings_api`] stores and reads each vendor's payment method settings.
//! * [`vendor_resolver`] works out which vendor an order belongs to.
//! * [`gateway`] runs the buyer side of a manual payment: checkout, instructions and submission.
//! * [`verification_api`] lets the vendor confirm or reject a submitted payment.
//! * [`receipt_api`] validates and stores optional payment receipts.
//! * [`maintenance_api`] provides operator housekeeping, such as purging all payment data.
//!
//! # API usage
//!
//! Every API is created by supplying a database backend that implements the backend traits it needs. `SqliteDatabase`
//! implements all of them, and is cheap to clone.
//!
//! ```rust,ignore
//! use vendor_payment_engine::{PaymentGateways, SqliteDatabase, VendorResolver};
//! let db = SqliteDatabase::new_with_url(...).await?;
//! let resolver = VendorResolver::new(db.clone()).with_fallback_vendor(1);
//! let gateways = PaymentGateways::new(db, resolver);
//! let result = gateways.get(PaymentMethod::Nagad).unwrap().initiate(order_id).await?;
//! ```
pub mod errors;
pub mod gateway;
pub mod maintenance_api;
pub mod method_descriptor;
pub mod payment_objects;
pub mod receipt_api;
pub mod receipt_store;
pub mod settings_api;
pub mod settings_objects;
pub mod vendor_resolver;
pub mod verification_api;
