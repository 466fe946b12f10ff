use actix_web::{http::StatusCode, test::TestRequest};
use serde_json::json;
use vendor_payment_engine::{
    db_types::{Actor, OrderId, OrderStatusType, PaymentMethod, Role, TransactionStatus},
    helpers::order_meta,
    payment_objects::CHECKOUT_ACTION,
    MethodDescriptor,
};

use super::helpers::*;

fn submit_action() -> String {
    MethodDescriptor::for_method(PaymentMethod::Bkash).submit_action()
}

fn checkout_request(uri: &str, user_id: i64) -> TestRequest {
    let actor = Actor::user(user_id, vec![Role::User]);
    let body = json!({ "nonce": nonce_for(CHECKOUT_ACTION, &actor) });
    with_token(TestRequest::post().uri(uri).set_json(body), &issue_token(user_id, vec![Role::User]))
}

#[actix_web::test]
async fn checkout_refused_when_method_unavailable() {
    let _ = env_logger::try_init().ok();
    let req = checkout_request("/api/checkout/bkash/5", BUYER);
    let (status, body) = send(req, |db| {
        db.expect_fetch_order().returning(|id| Ok(Some(order(id, Some(BUYER), &[]))));
        db.expect_fetch_product_owner().returning(|_| Ok(Some(VENDOR)));
        db.expect_fetch_vendor_settings().returning(|_| Ok(vec![bkash_setting(VENDOR, false)]));
    })
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(message(&body), "bKash payment is not available for this order.");
}

#[actix_web::test]
async fn checkout_captures_the_vendor() {
    let _ = env_logger::try_init().ok();
    let req = checkout_request("/api/checkout/bkash/5", BUYER);
    let (status, body) = send(req, |db| {
        db.expect_fetch_order().returning(|id| Ok(Some(order(id, Some(BUYER), &[]))));
        db.expect_fetch_product_owner().returning(|_| Ok(Some(VENDOR)));
        db.expect_fetch_vendor_settings().returning(|_| Ok(vec![bkash_setting(VENDOR, true)]));
        db.expect_update_order()
            .withf(|id, update| {
                let meta = |k: &str| update.set_meta.iter().find(|(key, _)| key == k).map(|(_, v)| v.as_str());
                *id == OrderId(5) &&
                    meta(order_meta::VENDOR_ID) == Some("7") &&
                    meta(order_meta::VENDOR_ACCOUNT) == Some(BKASH_ACCOUNT) &&
                    update.new_status == Some(OrderStatusType::Pending) &&
                    update.reduce_stock &&
                    update.empty_cart
            })
            .returning(|_, _| Ok(()));
    })
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["vendor_id"], VENDOR);
    assert_eq!(body["data"]["redirect"], "/checkout/order-pay/5?pay_for_order=true");
}

#[actix_web::test]
async fn buyers_cannot_open_other_orders() {
    let _ = env_logger::try_init().ok();
    let req = checkout_request("/api/checkout/bkash/5", 99);
    let (status, body) = send(req, |db| {
        db.expect_fetch_order().returning(|id| Ok(Some(order(id, Some(BUYER), &[]))));
    })
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(message(&body), "You do not have permission to view this order.");
}

#[actix_web::test]
async fn checkout_needs_a_nonce() {
    let _ = env_logger::try_init().ok();
    let req = with_token(TestRequest::post().uri("/api/checkout/bkash/5").set_json(json!({})), &buyer_token());
    let (status, body) = send(req, |_| {}).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(message(&body), "Security check failed.");
}

#[actix_web::test]
async fn checkout_refused_once_payment_is_verified() {
    let _ = env_logger::try_init().ok();
    let req = checkout_request("/api/checkout/bkash/5", BUYER);
    let (status, body) = send(req, |db| {
        db.expect_fetch_order().returning(|id| {
            let mut order = submitted_order(id);
            order.status = OrderStatusType::Processing;
            order.meta.insert(order_meta::VERIFICATION_STATUS, "verified");
            Ok(Some(order))
        });
    })
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(message(&body), "Payment has already been verified.");
}

#[actix_web::test]
async fn unknown_methods_are_bad_requests() {
    let _ = env_logger::try_init().ok();
    let req = checkout_request("/api/checkout/paypal/5", BUYER);
    let (status, _) = send(req, |_| {}).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn missing_orders_are_not_found() {
    let _ = env_logger::try_init().ok();
    let req = with_token(TestRequest::get().uri("/api/checkout/bkash/404"), &buyer_token());
    let (status, body) = send(req, |db| {
        db.expect_fetch_order().returning(|_| Ok(None));
    })
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(message(&body), "Invalid order.");
}

#[actix_web::test]
async fn instructions_come_with_nonces() {
    let _ = env_logger::try_init().ok();
    let req = with_token(TestRequest::get().uri("/api/checkout/bkash/5"), &buyer_token());
    let (status, body) = send(req, |db| {
        db.expect_fetch_order().returning(|id| Ok(Some(checked_out_order(id, Some(BUYER)))));
        db.expect_fetch_vendor_profile().returning(|_| Ok(None));
    })
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let data = &body["data"];
    assert_eq!(data["instructions"]["vendor_account"], BKASH_ACCOUNT);
    assert_eq!(data["instructions"]["amount"], 150_000);
    assert_eq!(data["instructions"]["description"], "Pay securely using your bKash mobile wallet");
    assert_eq!(data["instructions"]["form"]["nonce_action"], "vpg_bkash_nonce");
    assert!(nonce_issuer().verify(data["nonce"].as_str().unwrap(), &submit_action(), &buyer()));
    assert!(nonce_issuer().verify(data["receipt_nonce"].as_str().unwrap(), "vpg_upload_receipt", &buyer()));
}

#[actix_web::test]
async fn submission_needs_a_nonce() {
    let _ = env_logger::try_init().ok();
    let body = json!({ "order_id": 5, "transaction_id": "8N7A6D5XYZ" });
    let req = with_token(TestRequest::post().uri("/api/payment/bkash").set_json(body), &buyer_token());
    let (status, body) = send(req, |_| {}).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(message(&body), "Security check failed.");
}

#[actix_web::test]
async fn submission_needs_a_reference() {
    let _ = env_logger::try_init().ok();
    let body = json!({ "order_id": 5, "transaction_id": "   ", "nonce": nonce_for(&submit_action(), &buyer()) });
    let req = with_token(TestRequest::post().uri("/api/payment/bkash").set_json(body), &buyer_token());
    let (status, body) = send(req, |_| {}).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(message(&body), "Transaction ID is required.");
}

#[actix_web::test]
async fn buyer_submits_payment() {
    let _ = env_logger::try_init().ok();
    let nonce = nonce_for(&submit_action(), &buyer());
    let form = [
        ("order_id", "5"),
        ("transaction_id", " 8N7A6D5XYZ "),
        ("sender_number", "01999000000"),
        ("nonce", nonce.as_str()),
    ];
    let req = with_token(TestRequest::post().uri("/api/payment/bkash").set_form(form), &buyer_token());
    let (status, body) = send(req, |db| {
        db.expect_fetch_order().returning(|id| Ok(Some(checked_out_order(id, Some(BUYER)))));
        db.expect_update_order_with_transaction()
            .withf(|update, tx| {
                update.new_status == Some(OrderStatusType::OnHold) &&
                    update.delete_meta.iter().any(|k| k == order_meta::VERIFICATION_STATUS) &&
                    tx.transaction_id == "8N7A6D5XYZ" &&
                    tx.vendor_id == VENDOR
            })
            .returning(|_, tx| Ok(transaction(tx.order_id, &tx.transaction_id, TransactionStatus::Pending)));
    })
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["transaction"]["transaction_id"], "8N7A6D5XYZ");
    assert_eq!(body["data"]["transaction"]["status"], "pending");
    assert_eq!(body["data"]["redirect"], "/checkout/order-received/5");
}

#[actix_web::test]
async fn only_the_buyer_may_submit() {
    let _ = env_logger::try_init().ok();
    let stranger = Actor::user(99, vec![]);
    let nonce = nonce_for(&submit_action(), &stranger);
    let body = json!({ "order_id": 5, "transaction_id": "8N7A6D5XYZ", "nonce": nonce });
    let req = with_token(TestRequest::post().uri("/api/payment/bkash").set_json(body), &issue_token(99, vec![]));
    let (status, body) = send(req, |db| {
        db.expect_fetch_order().returning(|id| Ok(Some(checked_out_order(id, Some(BUYER)))));
    })
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(message(&body), "You do not have permission to update this order.");
}

#[actix_web::test]
async fn guests_pay_for_guest_orders() {
    let _ = env_logger::try_init().ok();
    let nonce = nonce_for(&submit_action(), &Actor::guest());
    let body = json!({ "order_id": 6, "transaction_id": "GUEST1", "nonce": nonce });
    let req = TestRequest::post().uri("/api/payment/bkash").set_json(body);
    let (status, body) = send(req, |db| {
        db.expect_fetch_order().returning(|id| Ok(Some(checked_out_order(id, None))));
        db.expect_update_order_with_transaction()
            .returning(|_, tx| Ok(transaction(tx.order_id, &tx.transaction_id, TransactionStatus::Pending)));
    })
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
}

#[actix_web::test]
async fn thank_you_page_shows_the_reference() {
    let _ = env_logger::try_init().ok();
    let req = with_token(TestRequest::get().uri("/api/payment/bkash/5/thankyou"), &buyer_token());
    let (status, body) = send(req, |db| {
        db.expect_fetch_order().returning(|id| Ok(Some(submitted_order(id))));
    })
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["transaction_id"], "8N7A6D5XYZ");
    assert!(message(&body).starts_with("Thank you!"));
}
