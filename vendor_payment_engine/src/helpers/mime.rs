/// Receipts larger than this are refused.
pub const MAX_RECEIPT_SIZE: usize = 5 * 1024 * 1024;

/// The file types accepted as payment receipts. The type is decided by the file's leading bytes, never by the name or
/// the client-declared content type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiptMime {
    Jpeg,
    Png,
    Gif,
    Pdf,
}

impl ReceiptMime {
    pub fn detect(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(Self::Jpeg)
        } else if bytes.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
            Some(Self::Png)
        } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
            Some(Self::Gif)
        } else if bytes.starts_with(b"%PDF-") {
            Some(Self::Pdf)
        } else {
            None
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ReceiptMime::Jpeg => "image/jpeg",
            ReceiptMime::Png => "image/png",
            ReceiptMime::Gif => "image/gif",
            ReceiptMime::Pdf => "application/pdf",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ReceiptMime::Jpeg => "jpg",
            ReceiptMime::Png => "png",
            ReceiptMime::Gif => "gif",
            ReceiptMime::Pdf => "pdf",
        }
    }
}
