//! Request handler definitions
//!
//! Define each route and its handler here.
//! Handlers that are more than a line or two MUST go into a separate function. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests. Any I/O (database access, writing receipts) must be awaited, never
//! done synchronously.
//!
//! Every state-changing route checks a form nonce before it touches an order or setting. Nonces are fetched from
//! `/api/nonce/{action}`, or come embedded in the page data the GET routes return.
use actix_multipart::Multipart;
use actix_web::{get, web, HttpResponse, Responder};
use futures::TryStreamExt;
use log::*;
use vendor_payment_engine::{
    db_types::{Actor, OrderId, PaymentMethod, Role, VerificationDecision},
    helpers::MAX_RECEIPT_SIZE,
    payment_objects::{verify_action, CHECKOUT_ACTION, UPLOAD_RECEIPT_ACTION},
    settings_objects::settings_action,
    LocalReceiptStore,
    OrderManagement,
    PaymentGateway,
    PaymentGatewayError,
    PaymentGateways,
    ReceiptApi,
    SettingsApi,
    VendorPaymentBackend,
    VerificationApi,
};

use crate::{
    auth::{JwtClaims, RequestActor},
    csrf::NonceIssuer,
    data_objects::{
        into_payload,
        CheckoutRequest,
        InstructionsPage,
        JsonOrForm,
        JsonResponse,
        NonceResponse,
        PaymentSubmission,
        ReceiptUpload,
        SettingsPage,
        SettingsSubmission,
        VerificationPage,
        VerifyRequest,
    },
    errors::ServerError,
};

/// Multipart field that carries the receipt file.
pub const RECEIPT_FIELD: &str = "receipt_file";
const MAX_TEXT_FIELD_SIZE: usize = 1024;

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };

    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+ where requires [$($roles:ty),*])  => {
        paste::paste! { pub struct [<$name:camel Route>]<A>(core::marker::PhantomData<fn() -> A>);}
        paste::paste! { impl<A> [<$name:camel Route>]<A> {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self(core::marker::PhantomData::<fn() -> A>)
            }
        }}
        paste::paste! { impl<A> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<A>
        where
            A: $($bounds)++ 'static,
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::<A>)
                    .wrap($crate::middleware::AclMiddlewareFactory::new(&[$($roles),+]));
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

/// Registers every `/api` route for the given backend. The caller wraps the scope in the JWT middleware.
pub fn configure_api<B: VendorPaymentBackend + 'static>(cfg: &mut web::ServiceConfig) {
    cfg.service(nonce)
        .service(MySettingsRoute::<B>::new())
        .service(UpdateSettingsRoute::<B>::new())
        .service(CheckoutRoute::<B>::new())
        .service(InstructionsRoute::<B>::new())
        .service(SubmitPaymentRoute::<B>::new())
        .service(ThankYouRoute::<B>::new())
        .service(UploadReceiptRoute::<B>::new())
        .service(PaymentDetailsRoute::<B>::new())
        .service(VerifyPaymentRoute::<B>::new());
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Nonces  ----------------------------------------------------
/// Issues a nonce for `action`, bound to the caller. Guests get nonces too, since guest checkout submits forms.
#[get("/nonce/{action}")]
pub async fn nonce(
    actor: RequestActor,
    path: web::Path<String>,
    nonces: web::Data<NonceIssuer>,
) -> Result<HttpResponse, ServerError> {
    let action = path.into_inner();
    trace!("💻️ Issuing nonce for {action}");
    let nonce = nonces.create(&action, &actor.into_inner());
    Ok(HttpResponse::Ok().json(JsonResponse::success("Nonce issued").with_data(&NonceResponse { action, nonce })))
}

//----------------------------------------------   Settings  ----------------------------------------------------
route!(my_settings => Get "/settings" impl VendorPaymentBackend where requires [Role::Vendor]);
/// The logged-in vendor's payment settings, with submission statistics and a nonce for the settings form.
pub async fn my_settings<B: VendorPaymentBackend>(
    claims: JwtClaims,
    api: web::Data<SettingsApi<B>>,
    nonces: web::Data<NonceIssuer>,
) -> Result<HttpResponse, ServerError> {
    let vendor_id = claims.sub;
    debug!("💻️ GET settings for vendor #{vendor_id}");
    let page = SettingsPage {
        vendor: api.vendor_info(vendor_id).await,
        settings: api.get_all(vendor_id).await,
        active_methods: api.active_payment_methods(vendor_id).await,
        stats: api.payment_stats(vendor_id).await?,
        nonce: nonces.create(&settings_action(vendor_id), &claims.actor()),
    };
    Ok(HttpResponse::Ok().json(JsonResponse::success("Payment settings").with_data(&page)))
}

route!(update_settings => Post "/settings" impl VendorPaymentBackend where requires [Role::Vendor]);
/// Saves the vendor dashboard's settings form. Every method is written, so an unticked box disables that method.
pub async fn update_settings<B: VendorPaymentBackend>(
    claims: JwtClaims,
    body: JsonOrForm<SettingsSubmission>,
    api: web::Data<SettingsApi<B>>,
    nonces: web::Data<NonceIssuer>,
) -> Result<HttpResponse, ServerError> {
    let vendor_id = claims.sub;
    let submission = into_payload(body);
    nonces.check(&submission.nonce, &settings_action(vendor_id), &claims.actor())?;
    debug!("💻️ POST settings for vendor #{vendor_id}");
    api.save_settings_form(vendor_id, &submission.form).await?;
    let settings = api.get_all(vendor_id).await;
    Ok(HttpResponse::Ok().json(JsonResponse::success("Payment settings saved successfully.").with_data(&settings)))
}

//----------------------------------------------   Checkout  ----------------------------------------------------
route!(checkout => Post "/checkout/{method}/{order_id}" impl VendorPaymentBackend);
/// Starts a manual payment for the order. The response carries the URL of the payment page.
pub async fn checkout<B: VendorPaymentBackend>(
    actor: RequestActor,
    path: web::Path<(String, OrderId)>,
    body: JsonOrForm<CheckoutRequest>,
    gateways: web::Data<PaymentGateways<B>>,
    nonces: web::Data<NonceIssuer>,
) -> Result<HttpResponse, ServerError> {
    let (method, order_id) = path.into_inner();
    let gateway = gateway_for(&gateways, &method)?;
    nonces.check(&into_payload(body).nonce, CHECKOUT_ACTION, &actor.0)?;
    authorize_buyer(gateway, order_id, &actor.0).await?;
    debug!("💻️ POST checkout for order {order_id} with {method}");
    let result = gateway.initiate(order_id).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success("Order placed. Please complete your payment.").with_data(&result)))
}

route!(instructions => Get "/checkout/{method}/{order_id}" impl VendorPaymentBackend);
/// The payment page: where to send the money, and the form to report the transaction.
pub async fn instructions<B: VendorPaymentBackend>(
    actor: RequestActor,
    path: web::Path<(String, OrderId)>,
    gateways: web::Data<PaymentGateways<B>>,
    nonces: web::Data<NonceIssuer>,
) -> Result<HttpResponse, ServerError> {
    let (method, order_id) = path.into_inner();
    let gateway = gateway_for(&gateways, &method)?;
    authorize_buyer(gateway, order_id, &actor.0).await?;
    debug!("💻️ GET payment instructions for order {order_id}");
    let instructions = gateway.render_instructions(order_id).await?;
    let page = InstructionsPage {
        nonce: nonces.create(&instructions.form.nonce_action, &actor.0),
        receipt_nonce: nonces.create(UPLOAD_RECEIPT_ACTION, &actor.0),
        instructions,
    };
    Ok(HttpResponse::Ok().json(JsonResponse::success("Payment instructions").with_data(&page)))
}

//----------------------------------------------   Payments  ----------------------------------------------------
route!(submit_payment => Post "/payment/{method}" impl VendorPaymentBackend);
/// The buyer reports the transaction they made. The order goes on hold until the vendor verifies it.
pub async fn submit_payment<B: VendorPaymentBackend>(
    actor: RequestActor,
    path: web::Path<String>,
    body: JsonOrForm<PaymentSubmission>,
    gateways: web::Data<PaymentGateways<B>>,
    nonces: web::Data<NonceIssuer>,
) -> Result<HttpResponse, ServerError> {
    let gateway = gateway_for(&gateways, &path.into_inner())?;
    let submission = into_payload(body);
    nonces.check(&submission.nonce, &gateway.descriptor().submit_action(), &actor.0)?;
    debug!("💻️ POST {} payment for order {}", gateway.descriptor().method, submission.order_id);
    let result = gateway.submit_attestation(submission.order_id, &actor.0, submission.attestation()).await?;
    let message = "Payment information submitted successfully. The vendor will verify your payment shortly.";
    Ok(HttpResponse::Ok().json(JsonResponse::success(message).with_data(&result)))
}

route!(thank_you => Get "/payment/{method}/{order_id}/thankyou" impl VendorPaymentBackend);
pub async fn thank_you<B: VendorPaymentBackend>(
    actor: RequestActor,
    path: web::Path<(String, OrderId)>,
    gateways: web::Data<PaymentGateways<B>>,
) -> Result<HttpResponse, ServerError> {
    let (method, order_id) = path.into_inner();
    let gateway = gateway_for(&gateways, &method)?;
    authorize_buyer(gateway, order_id, &actor.0).await?;
    let thank_you = gateway.render_thankyou(order_id).await?;
    let message = match &thank_you {
        Some(t) => t.message.clone(),
        None => "No payment has been submitted for this order.".to_string(),
    };
    Ok(HttpResponse::Ok().json(JsonResponse::success(message).with_data(&thank_you)))
}

//----------------------------------------------   Receipts  ----------------------------------------------------
route!(upload_receipt => Post "/receipt" impl VendorPaymentBackend);
/// Accepts a `multipart/form-data` upload with the fields `order_id`, `method`, `nonce` and `receipt_file`.
pub async fn upload_receipt<B: VendorPaymentBackend>(
    actor: RequestActor,
    payload: Multipart,
    api: web::Data<ReceiptApi<B, LocalReceiptStore>>,
    nonces: web::Data<NonceIssuer>,
) -> Result<HttpResponse, ServerError> {
    let upload = read_receipt_upload(payload).await?;
    nonces.check(upload.nonce.as_deref().unwrap_or_default(), UPLOAD_RECEIPT_ACTION, &actor.0)?;
    let order_id = upload
        .order_id
        .as_deref()
        .and_then(|s| s.parse::<OrderId>().ok())
        .ok_or_else(|| ServerError::InvalidRequestBody("order_id is missing or invalid".into()))?;
    let method = parse_method(upload.method.as_deref().unwrap_or_default())
        .map_err(|_| ServerError::InvalidRequestBody("method is missing or invalid".into()))?;
    debug!("💻️ POST receipt for order {order_id} ({} bytes)", upload.bytes.len());
    let receipt = api.upload(order_id, method, &upload.bytes, upload.declared_mime.as_deref(), &actor.0).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success("File uploaded successfully").with_data(&receipt)))
}

/// Reads every multipart field. At most one byte more than the receipt limit is kept, which is enough for the size
/// check to fail without holding an arbitrarily large upload in memory.
async fn read_receipt_upload(mut payload: Multipart) -> Result<ReceiptUpload, ServerError> {
    let mut upload = ReceiptUpload::default();
    while let Some(mut field) = payload.try_next().await.map_err(|e| ServerError::InvalidRequestBody(e.to_string()))? {
        let name = field.name().to_string();
        let limit = if name == RECEIPT_FIELD { MAX_RECEIPT_SIZE + 1 } else { MAX_TEXT_FIELD_SIZE };
        let mut bytes = Vec::new();
        while let Some(chunk) = field.try_next().await.map_err(|e| ServerError::InvalidRequestBody(e.to_string()))? {
            let room = limit.saturating_sub(bytes.len());
            bytes.extend_from_slice(&chunk[..chunk.len().min(room)]);
        }
        match name.as_str() {
            RECEIPT_FIELD => {
                upload.declared_mime = field.content_type().map(|m| m.to_string());
                upload.bytes = bytes;
            },
            "order_id" => upload.order_id = Some(field_text(&bytes)),
            "method" => upload.method = Some(field_text(&bytes)),
            "nonce" => upload.nonce = Some(field_text(&bytes)),
            other => trace!("💻️ Ignoring multipart field {other}"),
        }
    }
    Ok(upload)
}

fn field_text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).trim().to_string()
}

//----------------------------------------------   Verification  ----------------------------------------------------
route!(payment_details => Get "/orders/{order_id}/payment" impl VendorPaymentBackend);
/// What the buyer submitted for the order, for the vendor to check against their account statement.
pub async fn payment_details<B: VendorPaymentBackend>(
    actor: RequestActor,
    path: web::Path<OrderId>,
    api: web::Data<VerificationApi<B>>,
    nonces: web::Data<NonceIssuer>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    debug!("💻️ GET payment details for order {order_id}");
    let details = api.payment_details(order_id, &actor.0).await?;
    let page = VerificationPage { nonce: nonces.create(&details.nonce_action, &actor.0), details };
    Ok(HttpResponse::Ok().json(JsonResponse::success("Payment details").with_data(&page)))
}

route!(verify_payment => Post "/verify" impl VendorPaymentBackend);
/// The vendor confirms (`status=verified`) or rejects (`status=rejected`) the buyer's payment.
pub async fn verify_payment<B: VendorPaymentBackend>(
    actor: RequestActor,
    body: JsonOrForm<VerifyRequest>,
    api: web::Data<VerificationApi<B>>,
    nonces: web::Data<NonceIssuer>,
) -> Result<HttpResponse, ServerError> {
    let request = into_payload(body);
    let order_id = request.order_id;
    nonces.check(&request.nonce, &verify_action(order_id), &actor.0)?;
    let decision = request
        .status
        .parse::<VerificationDecision>()
        .map_err(|_| PaymentGatewayError::InvalidDecision(request.status.clone()))?;
    debug!("💻️ POST verify order {order_id} as {decision}");
    let outcome = api.verify(order_id, &actor.0, decision, &request.notes).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success("Payment status updated successfully").with_data(&outcome)))
}

//----------------------------------------------   Helpers  ----------------------------------------------------
fn parse_method(method: &str) -> Result<PaymentMethod, ServerError> {
    method.parse::<PaymentMethod>().map_err(|e| ServerError::InvalidRequestPath(e.to_string()))
}

fn gateway_for<'a, B>(gateways: &'a PaymentGateways<B>, method: &str) -> Result<&'a PaymentGateway<B>, ServerError>
where B: VendorPaymentBackend {
    let method = parse_method(method)?;
    gateways.get(method).ok_or_else(|| ServerError::InvalidRequestPath(format!("{method} is not a payment method")))
}

/// Buyer pages are only served to the order's customer, or to a store manager.
async fn authorize_buyer<B>(gateway: &PaymentGateway<B>, order_id: OrderId, actor: &Actor) -> Result<(), ServerError>
where B: VendorPaymentBackend {
    let order = gateway
        .db()
        .fetch_order(order_id)
        .await
        .map_err(PaymentGatewayError::from)?
        .ok_or(PaymentGatewayError::OrderNotFound(order_id))?;
    if actor.owns_order(&order) || actor.is_elevated() {
        Ok(())
    } else {
        info!("💻️ {actor:?} tried to open the payment pages of order {order_id}");
        Err(PaymentGatewayError::PermissionDenied("You do not have permission to view this order.").into())
    }
}
