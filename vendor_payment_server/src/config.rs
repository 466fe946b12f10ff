use std::{env, path::PathBuf, str::FromStr};

use chrono::Duration;
use log::*;
use rand::{distributions::Alphanumeric, thread_rng, Rng};
use vendor_payment_engine::db_types::VendorId;
use vpg_common::Secret;

use crate::errors::ServerError;

const DEFAULT_VPG_HOST: &str = "127.0.0.1";
const DEFAULT_VPG_PORT: u16 = 8360;
const DEFAULT_DATABASE_URL: &str = "sqlite://data/vendor_payments.db";
const DEFAULT_MAX_DB_CONNECTIONS: u32 = 25;
const DEFAULT_NONCE_LIFETIME: Duration = Duration::hours(24);
const DEFAULT_RECEIPT_DIR: &str = "data/receipts";
const DEFAULT_RECEIPT_BASE_URL: &str = "/receipts";
const DEFAULT_FALLBACK_VENDOR_ID: VendorId = 1;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub max_db_connections: u32,
    pub auth: AuthConfig,
    pub nonces: NonceConfig,
    pub receipts: ReceiptConfig,
    /// The vendor that receives orders for which no other vendor can be found.
    pub fallback_vendor_id: VendorId,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_VPG_HOST.to_string(),
            port: DEFAULT_VPG_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            max_db_connections: DEFAULT_MAX_DB_CONNECTIONS,
            auth: AuthConfig::default(),
            nonces: NonceConfig::default(),
            receipts: ReceiptConfig::default(),
            fallback_vendor_id: DEFAULT_FALLBACK_VENDOR_ID,
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("VPG_HOST").ok().unwrap_or_else(|| DEFAULT_VPG_HOST.into());
        let port = parse_env_or("VPG_PORT", DEFAULT_VPG_PORT);
        let database_url = env::var("VPG_DATABASE_URL").ok().unwrap_or_else(|| {
            warn!("🪛️ VPG_DATABASE_URL is not set. Using {DEFAULT_DATABASE_URL}");
            DEFAULT_DATABASE_URL.to_string()
        });
        let max_db_connections = parse_env_or("VPG_MAX_DB_CONNECTIONS", DEFAULT_MAX_DB_CONNECTIONS);
        let auth = AuthConfig::try_from_env().unwrap_or_else(|e| {
            warn!(
                "🪛️ Could not load the authentication configuration from environment variables. {e}. Reverting to the \
                 default configuration."
            );
            AuthConfig::default()
        });
        let nonces = NonceConfig::from_env_or_default();
        let receipts = ReceiptConfig::from_env_or_default();
        let fallback_vendor_id = match parse_env_or("VPG_FALLBACK_VENDOR_ID", DEFAULT_FALLBACK_VENDOR_ID) {
            id if id > 0 => id,
            id => {
                error!("🪛️ VPG_FALLBACK_VENDOR_ID must be positive, not {id}. Using {DEFAULT_FALLBACK_VENDOR_ID}.");
                DEFAULT_FALLBACK_VENDOR_ID
            },
        };
        Self { host, port, database_url, max_db_connections, auth, nonces, receipts, fallback_vendor_id }
    }
}

/// Reads and parses an environment variable. Missing or unparseable values fall back to `default`.
fn parse_env_or<T>(name: &str, default: T) -> T
where
    T: FromStr + std::fmt::Display,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(s) => s.trim().parse::<T>().unwrap_or_else(|e| {
            error!("🪛️ {s} is not a valid value for {name}. {e} Using the default, {default}, instead.");
            default
        }),
        Err(_) => default,
    }
}

fn random_secret() -> Secret<String> {
    let s = thread_rng().sample_iter(&Alphanumeric).take(48).map(char::from).collect::<String>();
    Secret::new(s)
}

//-------------------------------------------------  AuthConfig  -------------------------------------------------------
#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// The HS256 key that access tokens are signed with.
    pub jwt_secret: Secret<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        warn!(
            "🚨️🚨️🚨️ The JWT secret has not been set. I'm using a random value for this session. Tokens issued by \
             your storefront will not be accepted. Set VPG_JWT_SECRET. 🚨️🚨️🚨️"
        );
        Self { jwt_secret: random_secret() }
    }
}

impl AuthConfig {
    pub fn try_from_env() -> Result<Self, ServerError> {
        let secret =
            env::var("VPG_JWT_SECRET").map_err(|e| ServerError::ConfigurationError(format!("{e} [VPG_JWT_SECRET]")))?;
        if secret.len() < 32 {
            return Err(ServerError::ConfigurationError("VPG_JWT_SECRET must be at least 32 characters".into()));
        }
        Ok(Self { jwt_secret: Secret::new(secret) })
    }
}

//-------------------------------------------------  NonceConfig  ------------------------------------------------------
#[derive(Clone, Debug)]
pub struct NonceConfig {
    pub secret: Secret<String>,
    /// A nonce is accepted for at least half of this, and at most all of it.
    pub lifetime: Duration,
}

impl Default for NonceConfig {
    fn default() -> Self {
        Self { secret: random_secret(), lifetime: DEFAULT_NONCE_LIFETIME }
    }
}

impl NonceConfig {
    pub fn from_env_or_default() -> Self {
        let secret = env::var("VPG_NONCE_SECRET").ok().filter(|s| !s.is_empty()).map(Secret::new).unwrap_or_else(|| {
            info!("🪛️ VPG_NONCE_SECRET is not set. Nonces issued before a restart will not be accepted.");
            random_secret()
        });
        let hours = parse_env_or("VPG_NONCE_LIFETIME_HOURS", DEFAULT_NONCE_LIFETIME.num_hours());
        let lifetime = if hours > 0 {
            Duration::hours(hours)
        } else {
            warn!("🪛️ VPG_NONCE_LIFETIME_HOURS must be positive. Using {} hrs.", DEFAULT_NONCE_LIFETIME.num_hours());
            DEFAULT_NONCE_LIFETIME
        };
        Self { secret, lifetime }
    }
}

//------------------------------------------------  ReceiptConfig  -----------------------------------------------------
#[derive(Clone, Debug)]
pub struct ReceiptConfig {
    /// Uploaded receipts are written here.
    pub dir: PathBuf,
    /// The public URL prefix that `dir` is served under.
    pub base_url: String,
}

impl Default for ReceiptConfig {
    fn default() -> Self {
        Self { dir: PathBuf::from(DEFAULT_RECEIPT_DIR), base_url: DEFAULT_RECEIPT_BASE_URL.to_string() }
    }
}

impl ReceiptConfig {
    pub fn from_env_or_default() -> Self {
        let dir = env::var("VPG_RECEIPT_DIR").map(PathBuf::from).unwrap_or_else(|_| PathBuf::from(DEFAULT_RECEIPT_DIR));
        let base_url = env::var("VPG_RECEIPT_BASE_URL").unwrap_or_else(|_| DEFAULT_RECEIPT_BASE_URL.to_string());
        info!("🪛️ Receipts will be stored in {} and served from {base_url}", dir.display());
        Self { dir, base_url }
    }
}
