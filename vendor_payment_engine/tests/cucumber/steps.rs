use cucumber::{given, then, when};
use vendor_payment_engine::{
    db_types::{Amount, NewOrder, NewProduct, OrderStatusType, PaymentMethod, TransactionStatus, VerificationDecision},
    helpers::order_meta,
    payment_objects::Attestation,
    OrderManagement,
    TransactionManagement,
};

use crate::cucumber::{vendor_world::PaymentSystem, VendorWorld};

#[given("a fresh install")]
async fn fresh_install(world: &mut VendorWorld) {
    world.system = Some(PaymentSystem::new().await);
}

#[given(expr = "vendor {int} accepts {word} at account {word}")]
async fn vendor_accepts(world: &mut VendorWorld, vendor_id: i64, method: PaymentMethod, account: String) {
    let saved = world
        .system()
        .settings
        .upsert(vendor_id, method, true, &account, Default::default())
        .await
        .expect("Error saving settings");
    assert!(saved);
}

#[given(expr = "vendor {int} disables {word}")]
async fn vendor_disables(world: &mut VendorWorld, vendor_id: i64, method: PaymentMethod) {
    world.system().settings.upsert(vendor_id, method, false, "", Default::default()).await.expect("Error saving");
}

#[given(expr = "buyer {int} orders {int} units of a product from vendor {int} for {int} BDT as order {word}")]
async fn place_order(world: &mut VendorWorld, buyer: i64, qty: i64, vendor_id: i64, total: i64, label: String) {
    let db = &world.system().db;
    let product = db
        .insert_product(NewProduct { vendor_id, name: format!("Product for {label}"), stock: Some(100) })
        .await
        .expect("Error inserting product");
    let order = NewOrder::new(Some(buyer), Amount::from_major(total)).with_item(product.id, qty);
    let id = db.insert_order(order).await.expect("Error inserting order");
    world.orders.insert(label, id);
}

#[when(expr = "order {word} checks out with {word}")]
async fn checkout(world: &mut VendorWorld, label: String, method: PaymentMethod) {
    let order_id = world.order(&label);
    world.last_error = world.gateway(method).initiate(order_id).await.err();
}

#[when(expr = "{word} {int} submits {word} reference {word} for order {word}")]
async fn submit(world: &mut VendorWorld, who: String, id: i64, method: PaymentMethod, reference: String, label: String) {
    let order_id = world.order(&label);
    let actor = VendorWorld::actor(&format!("{who} {id}"));
    let result = world.gateway(method).submit_attestation(order_id, &actor, Attestation::new(reference)).await;
    world.last_error = result.err();
}

#[when(expr = "{word} {int} marks order {word} as {word}")]
async fn decide(world: &mut VendorWorld, who: String, id: i64, label: String, decision: VerificationDecision) {
    let order_id = world.order(&label);
    let actor = VendorWorld::actor(&format!("{who} {id}"));
    world.last_error = world.system().verification.verify(order_id, &actor, decision, "").await.err();
}

#[then("the request succeeds")]
async fn request_succeeds(world: &mut VendorWorld) {
    assert!(world.last_error.is_none(), "Unexpected error: {:?}", world.last_error);
}

#[then(expr = "the request fails with {string}")]
async fn request_fails(world: &mut VendorWorld, message: String) {
    let message = message.trim_matches('"');
    let err = world.last_error.as_ref().expect("Expected the request to fail");
    assert_eq!(err.to_string(), message);
}

#[then(expr = "order {word} has status {word}")]
async fn order_status(world: &mut VendorWorld, label: String, status: OrderStatusType) {
    let order = world.system().db.fetch_order(world.order(&label)).await.expect("Error fetching order");
    assert_eq!(order.expect("Order not found").status, status);
}

#[then(expr = "order {word} records vendor account {word}")]
async fn order_account(world: &mut VendorWorld, label: String, account: String) {
    let order = world.system().db.fetch_order(world.order(&label)).await.expect("Error fetching order");
    let order = order.expect("Order not found");
    assert_eq!(order.meta.get(order_meta::VENDOR_ACCOUNT), Some(account.as_str()));
}

#[then(expr = "order {word} has {int} transaction(s)")]
async fn transaction_count(world: &mut VendorWorld, label: String, count: usize) {
    let txs = world.system().db.fetch_transactions_for_order(world.order(&label)).await.expect("Error fetching");
    assert_eq!(txs.len(), count);
}

#[then(expr = "the latest transaction for order {word} is {word}")]
async fn latest_transaction(world: &mut VendorWorld, label: String, status: TransactionStatus) {
    let tx = world.system().db.fetch_latest_transaction(world.order(&label)).await.expect("Error fetching");
    assert_eq!(tx.expect("No transactions").status, status);
}
