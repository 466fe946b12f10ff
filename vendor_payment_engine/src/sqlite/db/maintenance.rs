use log::debug;
use sqlx::{QueryBuilder, SqliteConnection};

use crate::traits::StorageError;

/// Deletes all order metadata whose key begins with any of the given prefixes. `LIKE` is avoided because `_` is a
/// wildcard there and every prefix starts with one.
pub async fn delete_order_meta_with_prefixes(prefixes: &[String], conn: &mut SqliteConnection) -> Result<u64, StorageError> {
    if prefixes.is_empty() {
        return Ok(0);
    }
    let mut qb = QueryBuilder::new("DELETE FROM order_meta WHERE ");
    let mut conditions = qb.separated(" OR ");
    for prefix in prefixes {
        conditions.push("instr(meta_key, ");
        conditions.push_bind_unseparated(prefix.clone());
        conditions.push_unseparated(") = 1");
    }
    let result = qb.build().execute(conn).await?;
    debug!("🗃️ Deleted {} order meta entries with prefixes {prefixes:?}", result.rows_affected());
    Ok(result.rows_affected())
}
