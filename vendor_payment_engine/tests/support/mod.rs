#![allow(dead_code)]
//! A throwaway storefront: a fresh, migrated database with a vendor, a buyer and a stocked product.
use log::*;
use sqlx::{migrate::MigrateDatabase, Sqlite};
use vendor_payment_engine::{
    db_types::{Amount, MethodExtra, NewOrder, NewProduct, NewVendorSetting, OrderId, PaymentMethod, UserId, VendorId},
    test_utils::prepare_env::{prepare_test_env, random_db_path},
    PaymentGatewayDatabase,
    SqliteDatabase,
    VendorResolver,
    VendorSettingsManagement,
};

pub const VENDOR: VendorId = 7;
pub const OTHER_VENDOR: VendorId = 8;
pub const BUYER: UserId = 42;
pub const BKASH_ACCOUNT: &str = "01711000000";

pub async fn setup() -> SqliteDatabase {
    let url = random_db_path();
    prepare_test_env(&url).await
}

pub async fn tear_down(mut db: SqliteDatabase) {
    let url = db.url().to_string();
    if let Err(e) = db.close().await {
        error!("🚀️ Failed to close database: {e}");
    }
    if let Err(e) = Sqlite::drop_database(&url).await {
        warn!("🚀️ Could not remove test database {url}: {e}");
    }
}

pub fn resolver(db: &SqliteDatabase) -> VendorResolver<SqliteDatabase> {
    VendorResolver::new(db.clone())
}

/// Enables bKash for `vendor` with the given account number.
pub async fn enable_bkash(db: &SqliteDatabase, vendor: VendorId, account: &str) {
    let setting = NewVendorSetting::new(vendor, PaymentMethod::Bkash, account, true);
    db.upsert_vendor_setting(setting).await.expect("Error saving bKash settings");
}

pub async fn set_method(db: &SqliteDatabase, vendor: VendorId, method: PaymentMethod, account: &str, enabled: bool) {
    let setting = NewVendorSetting::new(vendor, method, account, enabled).with_extra(MethodExtra::None);
    db.upsert_vendor_setting(setting).await.expect("Error saving settings");
}

/// A product of `vendor` with 10 units in stock, in the buyer's cart, and an order of 2 units for 1500 BDT.
pub async fn seed_order(db: &SqliteDatabase, vendor: VendorId, customer: Option<UserId>) -> (OrderId, i64) {
    let product = db
        .insert_product(NewProduct { vendor_id: vendor, name: "Nakshi Kantha".into(), stock: Some(10) })
        .await
        .expect("Error inserting product");
    if let Some(cid) = customer {
        db.add_to_cart(cid, product.id, 2).await.expect("Error adding to cart");
    }
    let order = NewOrder::new(customer, Amount::from_major(1500)).with_item(product.id, 2);
    let order_id = db.insert_order(order).await.expect("Error inserting order");
    (order_id, product.id)
}
