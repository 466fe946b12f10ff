use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use log::*;
use vendor_payment_engine::{
    LocalReceiptStore,
    PaymentGateways,
    ReceiptApi,
    SettingsApi,
    SqliteDatabase,
    VendorResolver,
    VerificationApi,
};

use crate::{
    auth::TokenValidator,
    config::ServerConfig,
    csrf::NonceIssuer,
    errors::ServerError,
    middleware::JwtMiddlewareFactory,
    routes::{configure_api, health},
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, config.max_db_connections)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.run_migrations().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    tokio::fs::create_dir_all(&config.receipts.dir).await?;
    let srv = create_server_instance(config, db)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(config: ServerConfig, db: SqliteDatabase) -> Result<Server, ServerError> {
    let nonces = NonceIssuer::new(&config.nonces)?;
    let validator = TokenValidator::new(&config.auth);
    info!("🚀️ Orders without a known vendor will be paid to vendor #{}", config.fallback_vendor_id);
    let srv = HttpServer::new(move || {
        let resolver = VendorResolver::new(db.clone()).with_fallback_vendor(config.fallback_vendor_id);
        let gateways = PaymentGateways::new(db.clone(), resolver.clone());
        let verification_api = VerificationApi::new(db.clone(), resolver);
        let settings_api = SettingsApi::new(db.clone());
        let store = LocalReceiptStore::new(config.receipts.dir.clone(), &config.receipts.base_url);
        let receipt_api = ReceiptApi::new(db.clone(), store);
        let api_scope = web::scope("/api")
            .wrap(JwtMiddlewareFactory::new(validator.clone()))
            .configure(configure_api::<SqliteDatabase>);
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("vpg::access_log"))
            .app_data(web::Data::new(gateways))
            .app_data(web::Data::new(verification_api))
            .app_data(web::Data::new(settings_api))
            .app_data(web::Data::new(receipt_api))
            .app_data(web::Data::new(nonces.clone()))
            .service(health)
            .service(api_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}
