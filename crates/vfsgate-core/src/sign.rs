//! Link signing
//!
//! Signatures have the form `{base64url(hmac_sha256(key, "{data}:{expire}"))}:{expire}`
//! where `expire` is a unix timestamp, or `0` for a signature that never
//! expires.

use crate::error::{Result, SignError};
use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Produces and checks signatures over virtual paths
pub trait Signer: Send + Sync {
    fn sign(&self, data: &str) -> String;

    fn verify(&self, data: &str, sign: &str) -> Result<()>;
}

/// HMAC-SHA256 signer with optional expiry
#[derive(Clone)]
pub struct HmacSigner {
    mac: HmacSha256,
    expiration: Option<chrono::Duration>,
}

impl HmacSigner {
    pub fn new(secret: &[u8], expiration: Option<chrono::Duration>) -> Result<Self> {
        let mac = HmacSha256::new_from_slice(secret)
            .map_err(|e| SignError::InvalidKey(e.to_string()))?;
        Ok(Self { mac, expiration })
    }

    fn sign_with_expire(&self, data: &str, expire: i64) -> String {
        let mut mac = self.mac.clone();
        mac.update(format!("{}:{}", data, expire).as_bytes());
        let digest = URL_SAFE.encode(mac.finalize().into_bytes());
        format!("{}:{}", digest, expire)
    }
}

impl Signer for HmacSigner {
    fn sign(&self, data: &str) -> String {
        let expire = self
            .expiration
            .map(|ttl| (chrono::Utc::now() + ttl).timestamp())
            .unwrap_or(0);
        self.sign_with_expire(data, expire)
    }

    fn verify(&self, data: &str, sign: &str) -> Result<()> {
        let (digest, expire) = sign.rsplit_once(':').ok_or(SignError::Malformed)?;
        let expire: i64 = expire.parse().map_err(|_| SignError::Malformed)?;
        if expire != 0 && chrono::Utc::now().timestamp() > expire {
            return Err(SignError::Expired.into());
        }

        let expected = URL_SAFE.decode(digest).map_err(|_| SignError::Malformed)?;
        let mut mac = self.mac.clone();
        mac.update(format!("{}:{}", data, expire).as_bytes());
        mac.verify_slice(&expected)
            .map_err(|_| SignError::Mismatch.into())
    }
}
