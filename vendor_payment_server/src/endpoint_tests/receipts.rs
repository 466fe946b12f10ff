use actix_web::{http::StatusCode, test::TestRequest};
use vendor_payment_engine::{db_types::Actor, payment_objects::UPLOAD_RECEIPT_ACTION, traits::StorageError};

use super::helpers::*;

const BOUNDARY: &str = "----vpg-test-boundary";
const PNG_HEADER: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

fn multipart_body(fields: &[(&str, &str)], file: Option<(&str, &[u8])>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!("--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n").as_bytes(),
        );
    }
    if let Some((mime, bytes)) = file {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"receipt_file\"; filename=\"receipt\"\r\n\
                 Content-Type: {mime}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn upload_request(actor: &Actor, token: Option<&str>, file: Option<(&str, &[u8])>) -> TestRequest {
    let nonce = nonce_for(UPLOAD_RECEIPT_ACTION, actor);
    let body = multipart_body(&[("order_id", "5"), ("method", "bkash"), ("nonce", nonce.as_str())], file);
    let req = TestRequest::post()
        .uri("/api/receipt")
        .insert_header(("content-type", format!("multipart/form-data; boundary={BOUNDARY}")))
        .set_payload(body);
    match token {
        Some(token) => with_token(req, token),
        None => req,
    }
}

fn png(len: usize) -> Vec<u8> {
    let mut bytes = PNG_HEADER.to_vec();
    bytes.resize(len, 0);
    bytes
}

#[actix_web::test]
async fn receipt_is_stored_and_linked() {
    let _ = env_logger::try_init().ok();
    let file = png(4096);
    let req = upload_request(&buyer(), Some(&buyer_token()), Some(("image/png", &file)));
    let (status, body) = send(req, |db| {
        db.expect_fetch_order().returning(|id| Ok(Some(submitted_order(id))));
        db.expect_update_order()
            .withf(|_, update| {
                update.set_meta.iter().any(|(k, v)| k == "_bkash_receipt_file" && v.starts_with("/receipts/"))
            })
            .returning(|_, _| Ok(()));
    })
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(message(&body), "File uploaded successfully");
    assert_eq!(body["data"]["mime_type"], "image/png");
    assert_eq!(body["data"]["size"], 4096);
    assert!(body["data"]["filename"].as_str().unwrap().starts_with("vpg-receipt-order-5-bkash-"));
}

#[actix_web::test]
async fn unlinked_receipts_are_removed() {
    let _ = env_logger::try_init().ok();
    let dir = tempfile::tempdir().unwrap();
    let file = png(2048);
    let req = upload_request(&buyer(), Some(&buyer_token()), Some(("image/png", &file)));
    let (status, body) = send_with_receipts(req, dir.path(), |db| {
        db.expect_fetch_order().returning(|id| Ok(Some(submitted_order(id))));
        db.expect_update_order().returning(|_, _| Err(StorageError::DatabaseError("database is locked".into())));
    })
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{body}");
    let left_behind = std::fs::read_dir(dir.path()).unwrap().count();
    assert_eq!(left_behind, 0);
}

#[actix_web::test]
async fn uploads_need_a_valid_nonce() {
    let _ = env_logger::try_init().ok();
    let file = png(64);
    // A nonce issued to a guest is not valid for the logged-in buyer
    let req = upload_request(&Actor::guest(), Some(&buyer_token()), Some(("image/png", &file)));
    let (status, body) = send(req, |_| {}).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(message(&body), "Security check failed.");
}

#[actix_web::test]
async fn declared_type_is_not_trusted() {
    let _ = env_logger::try_init().ok();
    let file = b"#!/bin/sh\necho pwned\n".to_vec();
    let req = upload_request(&buyer(), Some(&buyer_token()), Some(("image/png", &file)));
    let (status, body) = send(req, |_| {}).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(message(&body), "Only images (JPG, PNG, GIF) and PDF files are allowed.");
}

#[actix_web::test]
async fn missing_file_is_refused() {
    let _ = env_logger::try_init().ok();
    let req = upload_request(&buyer(), Some(&buyer_token()), None);
    let (status, body) = send(req, |_| {}).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(message(&body), "File upload failed. Please try again.");
}

#[actix_web::test]
async fn oversized_receipts_are_refused() {
    let _ = env_logger::try_init().ok();
    let file = png(6 * 1024 * 1024);
    let req = upload_request(&buyer(), Some(&buyer_token()), Some(("image/png", &file)));
    let (status, body) = send(req, |_| {}).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(message(&body), "File size must be less than 5MB.");
}

#[actix_web::test]
async fn strangers_cannot_attach_receipts() {
    let _ = env_logger::try_init().ok();
    let stranger = Actor::user(99, vec![]);
    let file = png(64);
    let req = upload_request(&stranger, Some(&issue_token(99, vec![])), Some(("image/png", &file)));
    let (status, body) = send(req, |db| {
        db.expect_fetch_order().returning(|id| Ok(Some(submitted_order(id))));
    })
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(message(&body), "You do not have permission to upload files for this order.");
}
