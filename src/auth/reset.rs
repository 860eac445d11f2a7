use rand::RngCore;
use sha2::{Digest, Sha256};
use time::{Duration, OffsetDateTime};

/// Freshly issued password-reset token. The raw value goes to the user
/// out-of-band; only the digest and expiry are persisted.
pub struct ResetToken {
    pub raw: String,
    pub digest: String,
    pub expires_at: OffsetDateTime,
}

pub fn generate(ttl_minutes: i64) -> ResetToken {
    let mut bytes = [0u8; 20];
    rand::thread_rng().fill_bytes(&mut bytes);
    let raw = hex::encode(bytes);
    ResetToken {
        digest: digest(&raw),
        raw,
        expires_at: OffsetDateTime::now_utc() + Duration::minutes(ttl_minutes),
    }
}

/// SHA-256 hex digest of a presented raw token. Matched against the
/// stored `reset_token_hash` column during the reset flow.
pub fn digest(raw: &str) -> String {
    hex::encode(Sha256::digest(raw.as_bytes()))
}
