use chrono::{DateTime, Utc};
use log::{debug, trace};
use sqlx::{FromRow, SqliteConnection};

use crate::{
    db_types::{
        Amount,
        NewOrder,
        NewProduct,
        Order,
        OrderId,
        OrderItem,
        OrderMeta,
        OrderNote,
        OrderStatusType,
        OrderUpdate,
        Product,
        UserId,
        VendorId,
    },
    traits::StorageError,
};

/// Set on an order once its line items have been deducted from stock, so that repeating a checkout does not reduce
/// stock twice.
pub const STOCK_REDUCED_KEY: &str = "_order_stock_reduced";

#[derive(Debug, FromRow)]
struct OrderRow {
    id: OrderId,
    customer_id: Option<UserId>,
    status: OrderStatusType,
    total: Amount,
    currency: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl OrderRow {
    fn into_order(self, items: Vec<OrderItem>, meta: OrderMeta) -> Order {
        Order {
            id: self.id,
            customer_id: self.customer_id,
            status: self.status,
            total: self.total,
            currency: self.currency,
            created_at: self.created_at,
            updated_at: self.updated_at,
            items,
            meta,
        }
    }
}

async fn fetch_order_row(order_id: OrderId, conn: &mut SqliteConnection) -> Result<Option<OrderRow>, StorageError> {
    let row = sqlx::query_as("SELECT * FROM orders WHERE id = $1").bind(order_id).fetch_optional(conn).await?;
    Ok(row)
}

pub async fn fetch_items(order_id: OrderId, conn: &mut SqliteConnection) -> Result<Vec<OrderItem>, StorageError> {
    let items = sqlx::query_as("SELECT id, product_id, quantity FROM order_items WHERE order_id = $1 ORDER BY id")
        .bind(order_id)
        .fetch_all(conn)
        .await?;
    Ok(items)
}

pub async fn fetch_meta(order_id: OrderId, conn: &mut SqliteConnection) -> Result<OrderMeta, StorageError> {
    let rows: Vec<(String, String)> =
        sqlx::query_as("SELECT meta_key, meta_value FROM order_meta WHERE order_id = $1")
            .bind(order_id)
            .fetch_all(conn)
            .await?;
    Ok(rows.into_iter().collect())
}

/// Fetches the order together with its line items and metadata.
pub async fn fetch_order(order_id: OrderId, conn: &mut SqliteConnection) -> Result<Option<Order>, StorageError> {
    let row = match fetch_order_row(order_id, conn).await? {
        Some(row) => row,
        None => return Ok(None),
    };
    let items = fetch_items(order_id, conn).await?;
    let meta = fetch_meta(order_id, conn).await?;
    Ok(Some(row.into_order(items, meta)))
}

pub async fn fetch_product_owner(product_id: i64, conn: &mut SqliteConnection) -> Result<Option<VendorId>, StorageError> {
    let owner: Option<(VendorId,)> = sqlx::query_as("SELECT vendor_id FROM products WHERE id = $1")
        .bind(product_id)
        .fetch_optional(conn)
        .await?;
    Ok(owner.map(|(v,)| v))
}

pub async fn set_meta(order_id: OrderId, key: &str, value: &str, conn: &mut SqliteConnection) -> Result<(), StorageError> {
    sqlx::query(
        r#"
            INSERT INTO order_meta (order_id, meta_key, meta_value) VALUES ($1, $2, $3)
            ON CONFLICT (order_id, meta_key) DO UPDATE SET meta_value = excluded.meta_value
        "#,
    )
    .bind(order_id)
    .bind(key)
    .bind(value)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn delete_meta(order_id: OrderId, key: &str, conn: &mut SqliteConnection) -> Result<(), StorageError> {
    sqlx::query("DELETE FROM order_meta WHERE order_id = $1 AND meta_key = $2")
        .bind(order_id)
        .bind(key)
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn add_note(order_id: OrderId, note: &str, conn: &mut SqliteConnection) -> Result<(), StorageError> {
    sqlx::query("INSERT INTO order_notes (order_id, note) VALUES ($1, $2)").bind(order_id).bind(note).execute(conn).await?;
    Ok(())
}

pub async fn fetch_notes(order_id: OrderId, conn: &mut SqliteConnection) -> Result<Vec<OrderNote>, StorageError> {
    let notes =
        sqlx::query_as("SELECT * FROM order_notes WHERE order_id = $1 ORDER BY id").bind(order_id).fetch_all(conn).await?;
    Ok(notes)
}

async fn update_status(order_id: OrderId, status: OrderStatusType, conn: &mut SqliteConnection) -> Result<(), StorageError> {
    sqlx::query("UPDATE orders SET status = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2")
        .bind(status)
        .bind(order_id)
        .execute(conn)
        .await?;
    Ok(())
}

/// Deducts each line item's quantity from its product's stock. Products without tracked stock, or that no longer
/// exist, are skipped. Does nothing if stock has already been reduced for this order.
async fn reduce_stock(order_id: OrderId, conn: &mut SqliteConnection) -> Result<(), StorageError> {
    let meta = fetch_meta(order_id, conn).await?;
    if meta.contains_key(STOCK_REDUCED_KEY) {
        trace!("🗃️ Stock for order {order_id} has already been reduced");
        return Ok(());
    }
    for item in fetch_items(order_id, conn).await? {
        sqlx::query("UPDATE products SET stock = stock - $1 WHERE id = $2 AND stock IS NOT NULL")
            .bind(item.quantity)
            .bind(item.product_id)
            .execute(&mut *conn)
            .await?;
    }
    set_meta(order_id, STOCK_REDUCED_KEY, "yes", conn).await?;
    debug!("🗃️ Stock reduced for order {order_id}");
    Ok(())
}

async fn empty_cart(customer_id: UserId, conn: &mut SqliteConnection) -> Result<(), StorageError> {
    sqlx::query("DELETE FROM cart_items WHERE customer_id = $1").bind(customer_id).execute(conn).await?;
    Ok(())
}

/// Applies every part of the update to the order. This is not atomic; callers embed it in a transaction.
pub async fn apply_update(order_id: OrderId, update: OrderUpdate, conn: &mut SqliteConnection) -> Result<(), StorageError> {
    let order = fetch_order_row(order_id, conn).await?.ok_or(StorageError::OrderNotFound(order_id.value()))?;
    for (key, value) in &update.set_meta {
        set_meta(order_id, key, value, conn).await?;
    }
    for key in &update.delete_meta {
        delete_meta(order_id, key, conn).await?;
    }
    if let Some(status) = update.new_status {
        update_status(order_id, status, conn).await?;
        trace!("🗃️ Order {order_id} status {} -> {status}", order.status);
    }
    if let Some(note) = &update.note {
        add_note(order_id, note, conn).await?;
    }
    if update.reduce_stock {
        reduce_stock(order_id, conn).await?;
    }
    if update.empty_cart {
        match order.customer_id {
            Some(cid) => empty_cart(cid, conn).await?,
            None => trace!("🗃️ Order {order_id} is a guest order. There is no stored cart to empty."),
        }
    }
    Ok(())
}

pub async fn insert_order(order: NewOrder, conn: &mut SqliteConnection) -> Result<OrderId, StorageError> {
    let (id,): (OrderId,) =
        sqlx::query_as("INSERT INTO orders (customer_id, total, currency) VALUES ($1, $2, $3) RETURNING id")
            .bind(order.customer_id)
            .bind(order.total)
            .bind(order.currency)
            .fetch_one(&mut *conn)
            .await?;
    for (product_id, quantity) in order.items {
        sqlx::query("INSERT INTO order_items (order_id, product_id, quantity) VALUES ($1, $2, $3)")
            .bind(id)
            .bind(product_id)
            .bind(quantity)
            .execute(&mut *conn)
            .await?;
    }
    for (key, value) in order.meta {
        set_meta(id, &key, &value, conn).await?;
    }
    debug!("🗃️ Order {id} inserted");
    Ok(id)
}

pub async fn insert_product(product: NewProduct, conn: &mut SqliteConnection) -> Result<Product, StorageError> {
    let product = sqlx::query_as("INSERT INTO products (vendor_id, name, stock) VALUES ($1, $2, $3) RETURNING *")
        .bind(product.vendor_id)
        .bind(product.name)
        .bind(product.stock)
        .fetch_one(conn)
        .await?;
    Ok(product)
}

pub async fn fetch_product(product_id: i64, conn: &mut SqliteConnection) -> Result<Option<Product>, StorageError> {
    let product = sqlx::query_as("SELECT * FROM products WHERE id = $1").bind(product_id).fetch_optional(conn).await?;
    Ok(product)
}

pub async fn delete_product(product_id: i64, conn: &mut SqliteConnection) -> Result<(), StorageError> {
    sqlx::query("DELETE FROM products WHERE id = $1").bind(product_id).execute(conn).await?;
    Ok(())
}

pub async fn add_to_cart(
    customer_id: UserId,
    product_id: i64,
    quantity: i64,
    conn: &mut SqliteConnection,
) -> Result<(), StorageError> {
    sqlx::query(
        r#"
            INSERT INTO cart_items (customer_id, product_id, quantity) VALUES ($1, $2, $3)
            ON CONFLICT (customer_id, product_id) DO UPDATE SET quantity = quantity + excluded.quantity
        "#,
    )
    .bind(customer_id)
    .bind(product_id)
    .bind(quantity)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn cart_size(customer_id: UserId, conn: &mut SqliteConnection) -> Result<i64, StorageError> {
    let (n,): (i64,) = sqlx::query_as("SELECT COALESCE(SUM(quantity), 0) FROM cart_items WHERE customer_id = $1")
        .bind(customer_id)
        .fetch_one(conn)
        .await?;
    Ok(n)
}
