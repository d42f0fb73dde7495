//! `X-Hub-Signature-256` verification.
//!
//! WhatsApp signs every POST body with HMAC-SHA256 keyed by the app secret
//! and sends the lower-case hex digest as `sha256=<hex>`.

use crate::utils::error::{Result, WebhookError};
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "x-hub-signature-256";
const SIGNATURE_PREFIX: &str = "sha256=";

fn mac_for(app_secret: &str, body: &[u8]) -> HmacSha256 {
    let mut mac =
        HmacSha256::new_from_slice(app_secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(body);
    mac
}

/// Checks `header` against the HMAC of `body`. The digest comparison is
/// constant-time.
pub fn verify_signature(app_secret: &str, header: Option<&str>, body: &[u8]) -> Result<()> {
    let header = header.ok_or_else(|| WebhookError::invalid_signature("missing header"))?;

    let hex_digest = header
        .strip_prefix(SIGNATURE_PREFIX)
        .ok_or_else(|| WebhookError::invalid_signature("expected 'sha256=' prefix"))?;

    let expected = hex::decode(hex_digest.trim())
        .map_err(|_| WebhookError::invalid_signature("digest is not valid hex"))?;

    mac_for(app_secret, body)
        .verify_slice(&expected)
        .map_err(|_| WebhookError::invalid_signature("hashes do not match"))
}

/// Header value for `body`, in the same form WhatsApp sends.
pub fn sign(app_secret: &str, body: &[u8]) -> String {
    let digest = mac_for(app_secret, body).finalize().into_bytes();
    format!("{}{}", SIGNATURE_PREFIX, hex::encode(digest))
}
