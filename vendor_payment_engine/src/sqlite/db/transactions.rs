use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewTransaction, OrderId, Transaction, TransactionStatus},
    traits::StorageError,
};

/// Appends a new transaction with status `pending`. This is not atomic on its own; embed it in a transaction when it
/// must happen together with an order update.
pub async fn insert(tx: NewTransaction, conn: &mut SqliteConnection) -> Result<Transaction, StorageError> {
    let transaction: Transaction = sqlx::query_as(
        r#"
            INSERT INTO transactions (order_id, vendor_id, payment_method, transaction_id, amount, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *;
        "#,
    )
    .bind(tx.order_id)
    .bind(tx.vendor_id)
    .bind(tx.payment_method)
    .bind(tx.transaction_id)
    .bind(tx.amount)
    .bind(TransactionStatus::Pending)
    .fetch_one(conn)
    .await?;
    debug!(
        "🗃️ Transaction {} for order {} recorded as [{}] with amount {}",
        transaction.id, transaction.order_id, transaction.transaction_id, transaction.amount
    );
    Ok(transaction)
}

pub async fn fetch_for_order(order_id: OrderId, conn: &mut SqliteConnection) -> Result<Vec<Transaction>, StorageError> {
    let txs = sqlx::query_as("SELECT * FROM transactions WHERE order_id = $1 ORDER BY id")
        .bind(order_id)
        .fetch_all(conn)
        .await?;
    Ok(txs)
}

/// Moves the most recent pending transaction for the order to `status`. Returns `None` if there is no pending row.
pub async fn settle_latest_pending(
    order_id: OrderId,
    status: TransactionStatus,
    conn: &mut SqliteConnection,
) -> Result<Option<Transaction>, StorageError> {
    let tx = sqlx::query_as(
        r#"
            UPDATE transactions SET status = $1, updated_at = CURRENT_TIMESTAMP
            WHERE id = (
                SELECT id FROM transactions WHERE order_id = $2 AND status = $3 ORDER BY id DESC LIMIT 1
            )
            RETURNING *;
        "#,
    )
    .bind(status)
    .bind(order_id)
    .bind(TransactionStatus::Pending)
    .fetch_optional(conn)
    .await?;
    Ok(tx)
}

pub async fn delete_all(conn: &mut SqliteConnection) -> Result<u64, StorageError> {
    let result = sqlx::query("DELETE FROM transactions").execute(conn).await?;
    Ok(result.rows_affected())
}
