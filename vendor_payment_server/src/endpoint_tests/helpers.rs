use std::path::Path;

use actix_web::{
    body::MessageBody,
    dev::ServiceResponse,
    http::StatusCode,
    test,
    test::TestRequest,
    web,
    App,
};
use chrono::{Duration, Utc};
use log::debug;
use serde_json::Value;
use vendor_payment_engine::{
    db_types::{
        Actor,
        MethodExtra,
        Order,
        OrderId,
        OrderItem,
        OrderMeta,
        OrderStatusType,
        PaymentMethod,
        Role,
        Roles,
        Transaction,
        TransactionStatus,
        UserId,
        VendorId,
        VendorPaymentSetting,
    },
    helpers::order_meta,
    LocalReceiptStore,
    PaymentGateways,
    ReceiptApi,
    SettingsApi,
    VendorResolver,
    VerificationApi,
};
use vpg_common::{Amount, Secret};

use super::mocks::{backend, MockBackend, Setup};
use crate::{
    auth::{TokenIssuer, TokenValidator, ACCESS_TOKEN_HEADER},
    config::{AuthConfig, NonceConfig},
    csrf::NonceIssuer,
    middleware::JwtMiddlewareFactory,
    routes::configure_api,
};

pub const VENDOR: VendorId = 7;
pub const OTHER_VENDOR: VendorId = 8;
pub const BUYER: UserId = 42;
pub const PRODUCT: i64 = 100;
pub const BKASH_ACCOUNT: &str = "01711000000";

// Test secrets. DO NOT re-use these anywhere.
pub fn auth_config() -> AuthConfig {
    AuthConfig { jwt_secret: Secret::new("endpoint-tests-jwt-secret-do-not-reuse-anywhere".to_string()) }
}

pub fn nonce_issuer() -> NonceIssuer {
    let config = NonceConfig {
        secret: Secret::new("endpoint-tests-nonce-secret".to_string()),
        lifetime: Duration::hours(24),
    };
    NonceIssuer::new(&config).unwrap()
}

pub fn issue_token(user_id: UserId, roles: Roles) -> String {
    TokenIssuer::new(&auth_config()).issue_token(user_id, roles, None).unwrap()
}

pub fn buyer_token() -> String {
    issue_token(BUYER, vec![Role::User])
}

pub fn vendor_token(vendor_id: VendorId) -> String {
    issue_token(vendor_id, vec![Role::User, Role::Vendor])
}

pub fn buyer() -> Actor {
    Actor::user(BUYER, vec![Role::User])
}

pub fn vendor(vendor_id: VendorId) -> Actor {
    Actor::user(vendor_id, vec![Role::User, Role::Vendor])
}

pub fn nonce_for(action: &str, actor: &Actor) -> String {
    nonce_issuer().create(action, actor)
}

pub fn with_token(req: TestRequest, token: &str) -> TestRequest {
    req.insert_header((ACCESS_TOKEN_HEADER, token))
}

/// Sends the request to a full `/api` scope backed by a mock configured with `setup`. Errors raised by middleware
/// are rendered the same way the server would render them.
pub async fn send(req: TestRequest, setup: Setup) -> (StatusCode, Value) {
    let receipts = tempfile::tempdir().unwrap();
    send_with_receipts(req, receipts.path(), setup).await
}

/// Like [`send`], but receipts are written to `receipts` so the test can inspect them afterwards.
pub async fn send_with_receipts(req: TestRequest, receipts: &Path, setup: Setup) -> (StatusCode, Value) {
    let db = backend(setup);
    let resolver = VendorResolver::new(db.clone()).with_fallback_vendor(1);
    let store = LocalReceiptStore::new(receipts, "/receipts");
    let app = App::new()
        .app_data(web::Data::new(PaymentGateways::new(db.clone(), resolver.clone())))
        .app_data(web::Data::new(VerificationApi::new(db.clone(), resolver)))
        .app_data(web::Data::new(SettingsApi::new(db.clone())))
        .app_data(web::Data::new(ReceiptApi::new(db, store)))
        .app_data(web::Data::new(nonce_issuer()))
        .service(
            web::scope("/api")
                .wrap(JwtMiddlewareFactory::new(TokenValidator::new(&auth_config())))
                .configure(configure_api::<MockBackend>),
        );
    let service = test::init_service(app).await;
    debug!("🚀️ Making request");
    let res = match test::try_call_service(&service, req.to_request()).await {
        Ok(res) => res,
        Err(e) => ServiceResponse::from_err(e, test::TestRequest::default().to_http_request()),
    };
    let status = res.status();
    let body = res.into_body().try_into_bytes().unwrap_or_default();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

pub fn message(body: &Value) -> &str {
    body["message"].as_str().unwrap_or_default()
}

//------------------------------------------   Fixtures   ------------------------------------------------------------

/// A 1500 BDT order for two units of [`PRODUCT`].
pub fn order(order_id: OrderId, customer_id: Option<UserId>, meta: &[(&str, &str)]) -> Order {
    let meta = meta.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect::<OrderMeta>();
    Order {
        id: order_id,
        customer_id,
        status: OrderStatusType::Pending,
        total: Amount::from_major(1500),
        currency: "BDT".to_string(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
        items: vec![OrderItem { id: 1, product_id: PRODUCT, quantity: 2 }],
        meta,
    }
}

/// An order that went through bKash checkout for [`VENDOR`].
pub fn checked_out_order(order_id: OrderId, customer_id: Option<UserId>) -> Order {
    order(order_id, customer_id, &[
        (order_meta::VENDOR_ID, "7"),
        (order_meta::PAYMENT_METHOD, "bkash"),
        (order_meta::VENDOR_ACCOUNT, BKASH_ACCOUNT),
    ])
}

/// A checked-out order for which the buyer has submitted a bKash reference.
pub fn submitted_order(order_id: OrderId) -> Order {
    let mut order = checked_out_order(order_id, Some(BUYER));
    order.status = OrderStatusType::OnHold;
    order.meta.insert("_bkash_transaction_id", "8N7A6D5XYZ");
    order.meta.insert("_bkash_payment_date", Utc::now().to_rfc3339());
    order
}

pub fn bkash_setting(vendor_id: VendorId, enabled: bool) -> VendorPaymentSetting {
    VendorPaymentSetting {
        id: 1,
        vendor_id,
        method: PaymentMethod::Bkash,
        account_number: BKASH_ACCOUNT.to_string(),
        enabled,
        extra: MethodExtra::None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub fn transaction(order_id: OrderId, reference: &str, status: TransactionStatus) -> Transaction {
    Transaction {
        id: 1,
        order_id,
        vendor_id: VENDOR,
        payment_method: PaymentMethod::Bkash,
        transaction_id: reference.to_string(),
        amount: Amount::from_major(1500),
        status,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

