//! # Vendor payment server
//! This crate hosts the HTTP front end of the vendor payment gateway. It is responsible for:
//! * Serving the vendor dashboard's payment settings.
//! * Starting manual payments at checkout and showing buyers where to pay.
//! * Accepting the buyer's transaction reference and optional receipt.
//! * Letting the vendor confirm or reject the payment.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Authentication
//! Users are identified by a JWT issued by the storefront. See [auth](auth/index.html). State-changing requests also
//! carry a form nonce. See [csrf](csrf/index.html).
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/api/...`: The payment routes. See [routes](routes/index.html).

pub mod auth;
pub mod cli;
pub mod config;
pub mod csrf;
pub mod data_objects;
pub mod errors;
pub mod middleware;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
