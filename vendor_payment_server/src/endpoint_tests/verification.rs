use actix_web::{http::StatusCode, test::TestRequest};
use serde_json::json;
use vendor_payment_engine::{
    db_types::{OrderId, OrderStatusType, Role, TransactionStatus},
    helpers::order_meta,
    payment_objects::verify_action,
};

use super::helpers::*;

fn verify_request(token: &str, status: &str, nonce: &str) -> TestRequest {
    let body = json!({ "order_id": 5, "status": status, "notes": "Seen on statement", "nonce": nonce });
    with_token(TestRequest::post().uri("/api/verify").set_json(body), token)
}

#[actix_web::test]
async fn details_require_login() {
    let _ = env_logger::try_init().ok();
    let (status, body) = send(TestRequest::get().uri("/api/orders/5/payment"), |_| {}).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(message(&body), "You must be logged in");
}

#[actix_web::test]
async fn vendor_sees_payment_details() {
    let _ = env_logger::try_init().ok();
    let req = with_token(TestRequest::get().uri("/api/orders/5/payment"), &vendor_token(VENDOR));
    let (status, body) = send(req, |db| {
        db.expect_fetch_order().returning(|id| Ok(Some(submitted_order(id))));
    })
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let details = &body["data"]["details"];
    assert_eq!(details["state"], "awaiting_confirmation");
    assert_eq!(details["transaction_id"], "8N7A6D5XYZ");
    assert_eq!(details["verification_status"], "pending");
    assert_eq!(details["vendor_id"], VENDOR);
    let nonce = body["data"]["nonce"].as_str().unwrap();
    assert!(nonce_issuer().verify(nonce, &verify_action(OrderId(5)), &vendor(VENDOR)));
}

#[actix_web::test]
async fn other_vendors_cannot_see_details() {
    let _ = env_logger::try_init().ok();
    let req = with_token(TestRequest::get().uri("/api/orders/5/payment"), &vendor_token(OTHER_VENDOR));
    let (status, body) = send(req, |db| {
        db.expect_fetch_order().returning(|id| Ok(Some(submitted_order(id))));
    })
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(message(&body), "You do not have permission to verify this order");
}

#[actix_web::test]
async fn verification_needs_a_nonce() {
    let _ = env_logger::try_init().ok();
    let (status, body) = send(verify_request(&vendor_token(VENDOR), "verified", "not-a-nonce"), |_| {}).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(message(&body), "Security check failed.");
}

#[actix_web::test]
async fn unknown_decisions_are_refused() {
    let _ = env_logger::try_init().ok();
    let nonce = nonce_for(&verify_action(OrderId(5)), &vendor(VENDOR));
    let (status, body) = send(verify_request(&vendor_token(VENDOR), "maybe", &nonce), |_| {}).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(message(&body), "Invalid status");
}

#[actix_web::test]
async fn vendor_verifies_payment() {
    let _ = env_logger::try_init().ok();
    let nonce = nonce_for(&verify_action(OrderId(5)), &vendor(VENDOR));
    let (status, body) = send(verify_request(&vendor_token(VENDOR), "verified", &nonce), |db| {
        db.expect_fetch_order().returning(|id| Ok(Some(submitted_order(id))));
        db.expect_update_order_and_settle_transaction()
            .withf(|id, update, status| {
                *id == OrderId(5) &&
                    *status == TransactionStatus::Verified &&
                    update.new_status == Some(OrderStatusType::Processing) &&
                    update.set_meta.iter().any(|(k, v)| k == order_meta::VERIFIED_BY && v == "7")
            })
            .returning(|id, _, status| Ok(Some(transaction(id, "8N7A6D5XYZ", status))));
    })
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(message(&body), "Payment status updated successfully");
    assert_eq!(body["data"]["decision"], "verified");
    assert_eq!(body["data"]["order_status"], "processing");
    assert_eq!(body["data"]["transaction"]["status"], "verified");
}

#[actix_web::test]
async fn store_managers_may_verify_any_order() {
    let _ = env_logger::try_init().ok();
    let manager = vendor_payment_engine::db_types::Actor::user(1, vec![Role::ManageStore]);
    let nonce = nonce_for(&verify_action(OrderId(5)), &manager);
    let token = issue_token(1, vec![Role::ManageStore]);
    let (status, body) = send(verify_request(&token, "rejected", &nonce), |db| {
        db.expect_fetch_order().returning(|id| Ok(Some(submitted_order(id))));
        db.expect_update_order_and_settle_transaction()
            .returning(|id, _, status| Ok(Some(transaction(id, "8N7A6D5XYZ", status))));
    })
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["order_status"], "failed");
}

#[actix_web::test]
async fn payments_are_only_verified_once() {
    let _ = env_logger::try_init().ok();
    let nonce = nonce_for(&verify_action(OrderId(5)), &vendor(VENDOR));
    let (status, body) = send(verify_request(&vendor_token(VENDOR), "rejected", &nonce), |db| {
        db.expect_fetch_order().returning(|id| {
            let mut order = submitted_order(id);
            order.meta.insert(order_meta::VERIFICATION_STATUS, "verified");
            Ok(Some(order))
        });
    })
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(message(&body), "Payment has already been verified.");
}

#[actix_web::test]
async fn orders_paid_otherwise_are_not_applicable() {
    let _ = env_logger::try_init().ok();
    let req = with_token(TestRequest::get().uri("/api/orders/5/payment"), &vendor_token(VENDOR));
    let (status, body) = send(req, |db| {
        db.expect_fetch_order().returning(|id| Ok(Some(order(id, Some(BUYER), &[]))));
    })
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(message(&body), "Order 5 was not paid with a vendor payment method.");
}
