use crate::{
    db_types::{NewTransaction, OrderId, OrderUpdate, Transaction, TransactionStatus},
    traits::{PurgeSummary, StorageError},
};

/// This trait defines the write side of the vendor payment engine.
///
/// Each method touches several rows (order status, order metadata, notes, stock, carts and transactions). A backend
/// must apply all of them atomically: either every change is visible afterwards, or none is.
#[allow(async_fn_in_trait)]
pub trait PaymentGatewayDatabase: Clone {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Applies the update to the order. Fails with [`StorageError::OrderNotFound`] if the order does not exist.
    async fn update_order(&self, order_id: OrderId, update: OrderUpdate) -> Result<(), StorageError>;

    /// Records a new buyer payment transaction and applies the order update in the same atomic step.
    async fn update_order_with_transaction(
        &self,
        update: OrderUpdate,
        transaction: NewTransaction,
    ) -> Result<Transaction, StorageError>;

    /// Applies the order update and moves the order's most recent *pending* transaction to `status`, atomically.
    /// Returns the updated transaction, or `None` if the order had no pending transaction.
    async fn update_order_and_settle_transaction(
        &self,
        order_id: OrderId,
        update: OrderUpdate,
        status: TransactionStatus,
    ) -> Result<Option<Transaction>, StorageError>;

    /// Deletes every transaction and settings row, and every order metadata entry whose key starts with one of
    /// `meta_prefixes`.
    async fn purge_all(&self, meta_prefixes: &[String]) -> Result<PurgeSummary, StorageError>;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), StorageError> {
        Ok(())
    }
}
