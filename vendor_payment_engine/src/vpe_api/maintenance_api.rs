use std::fmt::Debug;

use log::*;

use crate::{
    helpers::order_meta::PURGE_PREFIXES,
    traits::{PaymentGatewayDatabase, PurgeSummary, StorageError},
};

/// Housekeeping operations that are run by an operator rather than by the payment flow.
pub struct MaintenanceApi<B> {
    db: B,
}

impl<B: Debug> Debug for MaintenanceApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MaintenanceApi ({:?})", self.db)
    }
}

impl<B> MaintenanceApi<B>
where B: PaymentGatewayDatabase
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    /// Irreversibly removes every transaction, every vendor settings row and all payment metadata from orders.
    pub async fn purge_all(&self) -> Result<PurgeSummary, StorageError> {
        warn!("🗃️ Purging all vendor payment data from {}", self.db.url());
        let prefixes = PURGE_PREFIXES.map(String::from);
        self.db.purge_all(&prefixes).await
    }
}
