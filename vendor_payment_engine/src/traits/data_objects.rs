use serde::{Deserialize, Serialize};

/// Counts of everything removed by a full purge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurgeSummary {
    pub transactions: u64,
    pub vendor_settings: u64,
    pub order_meta: u64,
}

impl PurgeSummary {
    pub fn total(&self) -> u64 {
        self.transactions + self.vendor_settings + self.order_meta
    }
}
