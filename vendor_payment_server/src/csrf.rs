//! Form nonces.
//!
//! Every state-changing request carries a nonce bound to an action string (e.g. `vpg_verify_42`) and to the user who
//! requested it. A nonce is an HMAC-SHA256 over `tick|action|user` where the tick advances every half lifetime, and
//! the nonces for the current and previous tick are both accepted.
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use log::*;
use sha2::Sha256;
use vendor_payment_engine::db_types::Actor;

use crate::{config::NonceConfig, errors::ServerError};

type HmacSha256 = Hmac<Sha256>;

#[derive(Clone)]
pub struct NonceIssuer {
    mac: HmacSha256,
    half_life_secs: i64,
}

impl NonceIssuer {
    pub fn new(config: &NonceConfig) -> Result<Self, ServerError> {
        let mac = HmacSha256::new_from_slice(config.secret.reveal().as_bytes())
            .map_err(|e| ServerError::ConfigurationError(format!("Invalid nonce secret. {e}")))?;
        let half_life_secs = (config.lifetime.num_seconds() / 2).max(1);
        Ok(Self { mac, half_life_secs })
    }

    fn tick(&self, now: DateTime<Utc>) -> i64 {
        now.timestamp().div_euclid(self.half_life_secs)
    }

    fn mac_for(&self, tick: i64, action: &str, actor: &Actor) -> HmacSha256 {
        let mut mac = self.mac.clone();
        mac.update(format!("{tick}|{action}|{}", actor.user_id.unwrap_or(0)).as_bytes());
        mac
    }

    pub fn create(&self, action: &str, actor: &Actor) -> String {
        self.create_at(action, actor, Utc::now())
    }

    pub fn create_at(&self, action: &str, actor: &Actor, now: DateTime<Utc>) -> String {
        let tag = self.mac_for(self.tick(now), action, actor).finalize().into_bytes();
        base64::encode_config(tag, base64::URL_SAFE_NO_PAD)
    }

    pub fn verify(&self, nonce: &str, action: &str, actor: &Actor) -> bool {
        self.verify_at(nonce, action, actor, Utc::now())
    }

    pub fn verify_at(&self, nonce: &str, action: &str, actor: &Actor, now: DateTime<Utc>) -> bool {
        let Ok(tag) = base64::decode_config(nonce.trim(), base64::URL_SAFE_NO_PAD) else {
            return false;
        };
        let tick = self.tick(now);
        let valid = [tick, tick - 1].into_iter().any(|t| self.mac_for(t, action, actor).verify_slice(&tag).is_ok());
        if !valid {
            debug!("🔐️ Nonce for {action} was refused for {actor:?}");
        }
        valid
    }

    /// Fails with [`ServerError::InvalidNonce`] unless `nonce` is valid for the action and actor.
    pub fn check(&self, nonce: &str, action: &str, actor: &Actor) -> Result<(), ServerError> {
        if self.verify(nonce, action, actor) {
            Ok(())
        } else {
            Err(ServerError::InvalidNonce)
        }
    }
}
