use actix_web::{http::StatusCode, test::TestRequest};
use chrono::Utc;
use serde_json::json;
use vendor_payment_engine::{
    db_types::{PaymentMethod, PaymentStat, Role, VendorPaymentSetting},
    settings_objects::settings_action,
};
use vpg_common::{Amount, Secret};

use super::helpers::*;
use crate::{auth::TokenIssuer, config::AuthConfig};

#[actix_web::test]
async fn settings_require_login() {
    let _ = env_logger::try_init().ok();
    let (status, body) = send(TestRequest::get().uri("/api/settings"), |_| {}).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(message(&body), "You must be logged in");
    assert_eq!(body["success"], false);
}

#[actix_web::test]
async fn settings_require_vendor_role() {
    let _ = env_logger::try_init().ok();
    let req = with_token(TestRequest::get().uri("/api/settings"), &buyer_token());
    let (status, body) = send(req, |_| {}).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(message(&body).starts_with("Insufficient Permissions"));
}

#[actix_web::test]
async fn tokens_from_another_issuer_are_refused() {
    let _ = env_logger::try_init().ok();
    let config = AuthConfig { jwt_secret: Secret::new("someone-else-entirely-signed-this-token".to_string()) };
    let token = TokenIssuer::new(&config).issue_token(VENDOR, vec![Role::User, Role::Vendor], None).unwrap();
    let req = with_token(TestRequest::get().uri("/api/settings"), &token);
    let (status, _) = send(req, |_| {}).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn vendor_sees_own_settings() {
    let _ = env_logger::try_init().ok();
    let req = with_token(TestRequest::get().uri("/api/settings"), &vendor_token(VENDOR));
    let (status, body) = send(req, |db| {
        db.expect_fetch_vendor_settings().withf(|id| *id == VENDOR).returning(|_| Ok(vec![bkash_setting(VENDOR, true)]));
        db.expect_fetch_payment_stats().returning(|_| {
            Ok(vec![PaymentStat { payment_method: PaymentMethod::Bkash, count: 2, total: Amount::from_major(3000) }])
        });
        db.expect_fetch_vendor_profile().returning(|_| Ok(None));
    })
    .await;
    assert_eq!(status, StatusCode::OK);
    let data = &body["data"];
    assert_eq!(data["settings"]["bkash_enabled"], true);
    assert_eq!(data["settings"]["bkash_account"], BKASH_ACCOUNT);
    assert_eq!(data["settings"]["nagad_enabled"], false);
    assert_eq!(data["active_methods"], json!(["bkash"]));
    assert_eq!(data["stats"][0]["count"], 2);
    assert_eq!(data["stats"][0]["total"], 300_000);
    let nonce = data["nonce"].as_str().unwrap();
    assert!(nonce_issuer().verify(nonce, &settings_action(VENDOR), &vendor(VENDOR)));
}

#[actix_web::test]
async fn settings_update_needs_a_nonce() {
    let _ = env_logger::try_init().ok();
    let form = json!({ "bkash_enabled": true, "bkash_account": BKASH_ACCOUNT });
    let req = with_token(TestRequest::post().uri("/api/settings").set_json(form), &vendor_token(VENDOR));
    let (status, body) = send(req, |_| {}).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(message(&body), "Security check failed.");
}

#[actix_web::test]
async fn nonces_do_not_transfer_between_vendors() {
    let _ = env_logger::try_init().ok();
    let nonce = nonce_for(&settings_action(VENDOR), &vendor(VENDOR));
    let form = json!({ "bkash_enabled": true, "bkash_account": BKASH_ACCOUNT, "nonce": nonce });
    let req = with_token(TestRequest::post().uri("/api/settings").set_json(form), &vendor_token(OTHER_VENDOR));
    let (status, _) = send(req, |_| {}).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn settings_form_writes_every_method() {
    let _ = env_logger::try_init().ok();
    let nonce = nonce_for(&settings_action(VENDOR), &vendor(VENDOR));
    let form = [
        ("bkash_enabled", "on"),
        ("bkash_account", " 01711000000 "),
        ("bkash_type", "merchant"),
        ("nagad_account", "01811000000"),
        ("nonce", nonce.as_str()),
    ];
    let req = with_token(TestRequest::post().uri("/api/settings").set_form(form), &vendor_token(VENDOR));
    let (status, body) = send(req, |db| {
        db.expect_upsert_vendor_setting()
            .withf(|s| {
                s.vendor_id == VENDOR &&
                    match s.method {
                        PaymentMethod::Bkash => s.enabled && s.account_number == BKASH_ACCOUNT,
                        PaymentMethod::Nagad => !s.enabled && s.account_number == "01811000000",
                        _ => !s.enabled && s.account_number.is_empty(),
                    }
            })
            .returning(|s| {
                Ok(VendorPaymentSetting {
                    id: 1,
                    vendor_id: s.vendor_id,
                    method: s.method,
                    account_number: s.account_number,
                    enabled: s.enabled,
                    extra: s.extra,
                    created_at: Utc::now(),
                    updated_at: Utc::now(),
                })
            });
        db.expect_fetch_vendor_settings().returning(|_| Ok(vec![bkash_setting(VENDOR, true)]));
    })
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(message(&body), "Payment settings saved successfully.");
    assert_eq!(body["data"]["bkash_enabled"], true);
}

#[actix_web::test]
async fn guests_can_fetch_nonces() {
    let _ = env_logger::try_init().ok();
    let (status, body) = send(TestRequest::get().uri("/api/nonce/vpg_bkash_nonce"), |_| {}).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["action"], "vpg_bkash_nonce");
    let nonce = body["data"]["nonce"].as_str().unwrap();
    assert!(nonce_issuer().verify(nonce, "vpg_bkash_nonce", &vendor_payment_engine::db_types::Actor::guest()));
}
