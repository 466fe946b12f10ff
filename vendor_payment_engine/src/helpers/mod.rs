mod mime;
pub mod order_meta;

pub use mime::{ReceiptMime, MAX_RECEIPT_SIZE};
