//! HMAC-SHA512 signing for Kraken's private endpoints.
//!
//! `API-Sign = base64(HMAC-SHA512(path || SHA256(nonce || body), base64decode(secret)))`

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256, Sha512};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::ConfigError;

type HmacSha512 = Hmac<Sha512>;

pub const API_KEY_HEADER: &str = "API-Key";
pub const API_SIGN_HEADER: &str = "API-Sign";

/// API key plus decoded secret for one account.
pub struct KrakenSigner {
    api_key: String,
    api_secret: Vec<u8>,
    last_nonce: AtomicU64,
}

impl KrakenSigner {
    /// `api_secret_b64` is the secret exactly as Kraken displays it (base64).
    pub fn new(
        api_key: impl Into<String>,
        api_secret_b64: impl AsRef<str>,
    ) -> Result<Self, ConfigError> {
        let api_secret = BASE64
            .decode(api_secret_b64.as_ref().trim())
            .map_err(|e| ConfigError::InvalidSecret(e.to_string()))?;

        Ok(Self {
            api_key: api_key.into(),
            api_secret,
            last_nonce: AtomicU64::new(0),
        })
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// A strictly increasing nonce, even for calls within the same microsecond.
    pub fn next_nonce(&self) -> u64 {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_micros() as u64)
            .unwrap_or_default();

        let mut prev = self.last_nonce.load(Ordering::Relaxed);
        loop {
            let next = now.max(prev + 1);
            match self.last_nonce.compare_exchange_weak(
                prev,
                next,
                Ordering::SeqCst,
                Ordering::Relaxed,
            ) {
                Ok(_) => return next,
                Err(actual) => prev = actual,
            }
        }
    }

    /// Signature for the `API-Sign` header. `post_data` must contain the same nonce.
    pub fn sign(&self, uri_path: &str, post_data: &str, nonce: u64) -> String {
        let mut sha256 = Sha256::new();
        sha256.update(nonce.to_string().as_bytes());
        sha256.update(post_data.as_bytes());
        let digest = sha256.finalize();

        // HMAC accepts keys of any length, so this cannot fail.
        let mut mac = match HmacSha512::new_from_slice(&self.api_secret) {
            Ok(mac) => mac,
            Err(_) => return String::new(),
        };
        mac.update(uri_path.as_bytes());
        mac.update(&digest);

        BASE64.encode(mac.finalize().into_bytes())
    }
}

impl std::fmt::Debug for KrakenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KrakenSigner")
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // base64("test_secret_key_12345")
    const TEST_SECRET_B64: &str = "dGVzdF9zZWNyZXRfa2V5XzEyMzQ1";

    #[test]
    fn test_invalid_base64_secret() {
        assert!(KrakenSigner::new("key", "not-valid-base64!!!").is_err());
    }

    #[test]
    fn test_nonces_strictly_increase() {
        let signer = KrakenSigner::new("key", TEST_SECRET_B64).unwrap();
        let mut prev = signer.next_nonce();
        for _ in 0..1000 {
            let next = signer.next_nonce();
            assert!(next > prev);
            prev = next;
        }
    }

    #[test]
    fn test_signature_is_deterministic() {
        let signer = KrakenSigner::new("key", TEST_SECRET_B64).unwrap();
        let a = signer.sign("/0/private/Ledgers", "nonce=1&ofs=0", 1);
        let b = signer.sign("/0/private/Ledgers", "nonce=1&ofs=0", 1);
        assert_eq!(a, b);
    }

    #[test]
    fn test_signature_depends_on_path_and_body() {
        let signer = KrakenSigner::new("key", TEST_SECRET_B64).unwrap();
        let base = signer.sign("/0/private/Ledgers", "nonce=1&ofs=0", 1);
        assert_ne!(base, signer.sign("/0/private/TradesHistory", "nonce=1&ofs=0", 1));
        assert_ne!(base, signer.sign("/0/private/Ledgers", "nonce=1&ofs=50", 1));
    }

    #[test]
    fn test_signature_is_64_bytes_of_base64() {
        let signer = KrakenSigner::new("key", TEST_SECRET_B64).unwrap();
        let sig = signer.sign("/0/private/Ledgers", "nonce=7", 7);
        assert_eq!(BASE64.decode(sig).unwrap().len(), 64);
    }

    #[test]
    fn test_debug_redacts_secret() {
        let signer = KrakenSigner::new("key", TEST_SECRET_B64).unwrap();
        let dbg = format!("{:?}", signer);
        assert!(dbg.contains("<redacted>"));
        assert!(!dbg.contains(TEST_SECRET_B64));
    }
}
