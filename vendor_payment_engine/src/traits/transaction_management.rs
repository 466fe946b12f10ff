use crate::{
    db_types::{OrderId, Transaction},
    traits::StorageError,
};

#[allow(async_fn_in_trait)]
pub trait TransactionManagement {
    /// Fetches every transaction submitted against the order, oldest first.
    async fn fetch_transactions_for_order(&self, order_id: OrderId) -> Result<Vec<Transaction>, StorageError>;

    /// Fetches the most recently submitted transaction for the order, if any.
    async fn fetch_latest_transaction(&self, order_id: OrderId) -> Result<Option<Transaction>, StorageError> {
        let txs = self.fetch_transactions_for_order(order_id).await?;
        Ok(txs.into_iter().last())
    }
}
