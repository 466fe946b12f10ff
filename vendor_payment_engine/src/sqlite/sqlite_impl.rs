//! `SqliteDatabase` is a concrete implementation of a vendor payment engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`traits`] module.
//! Multi-row writes run inside a single SQLite transaction, so a failure part-way through leaves nothing behind.
use std::fmt::Debug;

use log::*;
use sqlx::{migrate, SqlitePool};

use super::{
    db::{db_url, maintenance, new_pool, orders, transactions, vendor_settings, vendors},
    SqliteDatabaseError,
};
use crate::{
    db_types::{
        NewOrder,
        NewProduct,
        NewTransaction,
        NewVendorSetting,
        Order,
        OrderId,
        OrderNote,
        OrderUpdate,
        PaymentMethod,
        PaymentStat,
        Product,
        Transaction,
        TransactionStatus,
        UserId,
        VendorId,
        VendorPaymentSetting,
        VendorProfile,
    },
    traits::{
        OrderManagement,
        PaymentGatewayDatabase,
        PurgeSummary,
        StorageError,
        TransactionManagement,
        VendorDirectory,
        VendorSettingsManagement,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SqliteDatabase ({})", self.url)
    }
}

impl PaymentGatewayDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn update_order(&self, order_id: OrderId, update: OrderUpdate) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await?;
        trace!("🗃️ Order {order_id} updating with new values: {update:?}");
        orders::apply_update(order_id, update, &mut tx).await?;
        tx.commit().await?;
        trace!("🗃️ Order {order_id} has been updated.");
        Ok(())
    }

    async fn update_order_with_transaction(
        &self,
        update: OrderUpdate,
        transaction: NewTransaction,
    ) -> Result<Transaction, StorageError> {
        let mut tx = self.pool.begin().await?;
        let order_id = transaction.order_id;
        orders::apply_update(order_id, update, &mut tx).await?;
        let transaction = transactions::insert(transaction, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Order {order_id} updated and transaction {} recorded", transaction.id);
        Ok(transaction)
    }

    async fn update_order_and_settle_transaction(
        &self,
        order_id: OrderId,
        update: OrderUpdate,
        status: TransactionStatus,
    ) -> Result<Option<Transaction>, StorageError> {
        let mut tx = self.pool.begin().await?;
        orders::apply_update(order_id, update, &mut tx).await?;
        let settled = transactions::settle_latest_pending(order_id, status, &mut tx).await?;
        tx.commit().await?;
        match &settled {
            Some(t) => debug!("🗃️ Transaction {} for order {order_id} is now {status}", t.id),
            None => warn!("🗃️ Order {order_id} had no pending transaction to mark as {status}"),
        }
        Ok(settled)
    }

    async fn purge_all(&self, meta_prefixes: &[String]) -> Result<PurgeSummary, StorageError> {
        let mut tx = self.pool.begin().await?;
        let transactions = transactions::delete_all(&mut tx).await?;
        let vendor_settings = vendor_settings::delete_all(&mut tx).await?;
        let order_meta = maintenance::delete_order_meta_with_prefixes(meta_prefixes, &mut tx).await?;
        tx.commit().await?;
        let summary = PurgeSummary { transactions, vendor_settings, order_meta };
        info!("🗃️ Purged all vendor payment data: {summary:?}");
        Ok(summary)
    }

    async fn close(&mut self) -> Result<(), StorageError> {
        self.pool.close().await;
        Ok(())
    }
}

impl OrderManagement for SqliteDatabase {
    async fn fetch_order(&self, order_id: OrderId) -> Result<Option<Order>, StorageError> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_order(order_id, &mut conn).await
    }

    async fn fetch_product_owner(&self, product_id: i64) -> Result<Option<VendorId>, StorageError> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_product_owner(product_id, &mut conn).await
    }
}

impl TransactionManagement for SqliteDatabase {
    async fn fetch_transactions_for_order(&self, order_id: OrderId) -> Result<Vec<Transaction>, StorageError> {
        let mut conn = self.pool.acquire().await?;
        transactions::fetch_for_order(order_id, &mut conn).await
    }
}

impl VendorSettingsManagement for SqliteDatabase {
    async fn upsert_vendor_setting(&self, setting: NewVendorSetting) -> Result<VendorPaymentSetting, StorageError> {
        let mut conn = self.pool.acquire().await?;
        vendor_settings::upsert(setting, &mut conn).await
    }

    async fn fetch_vendor_settings(&self, vendor_id: VendorId) -> Result<Vec<VendorPaymentSetting>, StorageError> {
        let mut conn = self.pool.acquire().await?;
        vendor_settings::fetch_for_vendor(vendor_id, &mut conn).await
    }

    async fn fetch_vendor_setting(
        &self,
        vendor_id: VendorId,
        method: PaymentMethod,
    ) -> Result<Option<VendorPaymentSetting>, StorageError> {
        let mut conn = self.pool.acquire().await?;
        vendor_settings::fetch_one(vendor_id, method, &mut conn).await
    }

    async fn fetch_payment_stats(&self, vendor_id: VendorId) -> Result<Vec<PaymentStat>, StorageError> {
        let mut conn = self.pool.acquire().await?;
        vendor_settings::payment_stats(vendor_id, &mut conn).await
    }
}

impl VendorDirectory for SqliteDatabase {
    async fn fetch_vendor_profile(&self, vendor_id: VendorId) -> Result<Option<VendorProfile>, StorageError> {
        let mut conn = self.pool.acquire().await?;
        vendors::fetch_profile(vendor_id, &mut conn).await
    }
}

/// Connection management, plus storefront-side helpers that populate orders, products and users for tests and seeding.
impl SqliteDatabase {
    /// Creates a new database API object
    pub async fn new(max_connections: u32) -> Result<Self, SqliteDatabaseError> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, SqliteDatabaseError> {
        trace!("🗃️ Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Brings the schema up to date. Safe to call on every start-up.
    pub async fn run_migrations(&self) -> Result<(), SqliteDatabaseError> {
        migrate!("./src/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Database migrations complete");
        Ok(())
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn insert_order(&self, order: NewOrder) -> Result<OrderId, StorageError> {
        let mut tx = self.pool.begin().await?;
        let id = orders::insert_order(order, &mut tx).await?;
        tx.commit().await?;
        Ok(id)
    }

    pub async fn insert_product(&self, product: NewProduct) -> Result<Product, StorageError> {
        let mut conn = self.pool.acquire().await?;
        orders::insert_product(product, &mut conn).await
    }

    pub async fn fetch_product(&self, product_id: i64) -> Result<Option<Product>, StorageError> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_product(product_id, &mut conn).await
    }

    pub async fn delete_product(&self, product_id: i64) -> Result<(), StorageError> {
        let mut conn = self.pool.acquire().await?;
        orders::delete_product(product_id, &mut conn).await
    }

    pub async fn add_to_cart(&self, customer_id: UserId, product_id: i64, quantity: i64) -> Result<(), StorageError> {
        let mut conn = self.pool.acquire().await?;
        orders::add_to_cart(customer_id, product_id, quantity, &mut conn).await
    }

    pub async fn cart_size(&self, customer_id: UserId) -> Result<i64, StorageError> {
        let mut conn = self.pool.acquire().await?;
        orders::cart_size(customer_id, &mut conn).await
    }

    pub async fn fetch_order_notes(&self, order_id: OrderId) -> Result<Vec<OrderNote>, StorageError> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_notes(order_id, &mut conn).await
    }

    pub async fn upsert_user(&self, user_id: UserId, display_name: &str, email: &str) -> Result<(), StorageError> {
        let mut conn = self.pool.acquire().await?;
        vendors::upsert_user(user_id, display_name, email, &mut conn).await
    }

    pub async fn set_user_meta(&self, user_id: UserId, key: &str, value: &str) -> Result<(), StorageError> {
        let mut conn = self.pool.acquire().await?;
        vendors::set_user_meta(user_id, key, value, &mut conn).await
    }
}
