//! Types shared by the vendor payment engine and its HTTP server.
mod amount;
pub mod helpers;
pub mod op;
mod secret;

pub use amount::{Amount, AmountConversionError, DEFAULT_CURRENCY_CODE};
pub use secret::Secret;
