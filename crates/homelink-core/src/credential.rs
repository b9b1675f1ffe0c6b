//! Random credential and identifier generation.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;

/// Generates a cryptographically random credential string.
///
/// Returns `len_bytes` of randomness encoded as base64url without padding,
/// suitable for authorization codes and bearer tokens.
#[must_use]
pub fn generate_credential(len_bytes: usize) -> String {
    let mut bytes = vec![0u8; len_bytes];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Generates an opaque external device identifier.
///
/// External ids are immutable once assigned and unique per account.
#[must_use]
pub fn generate_external_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
