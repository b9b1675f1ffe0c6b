//! Epoch-second expiry arithmetic.
//!
//! Expiries are stored as unix seconds (`i64`) so they serialize as plain
//! numbers in persisted records and wire payloads.

use time::OffsetDateTime;

/// Current wall-clock time as unix seconds.
#[must_use]
pub fn epoch_now() -> i64 {
    OffsetDateTime::now_utc().unix_timestamp()
}

/// Absolute expiry for a lifetime of `ttl_seconds` starting now.
#[must_use]
pub fn expiration_from(ttl_seconds: i64) -> i64 {
    epoch_now() + ttl_seconds
}

/// Whether an absolute epoch-second expiry has passed.
#[must_use]
pub fn is_expired(expires_at: i64) -> bool {
    expires_at <= epoch_now()
}
