//! Credential store configuration.

/// Configuration for [`CredentialStore`](crate::CredentialStore).
///
/// Constructed once by the caller and injected; nothing here is read from
/// ambient process state.
#[derive(Debug, Clone)]
pub struct CredentialConfig {
    /// Authorization code lifetime in seconds. Codes are single-use and
    /// independent of the token ttl they will grant.
    /// Default: 300.
    pub code_lifetime_seconds: i64,

    /// Random bytes per authorization code (base64url-encoded).
    /// Default: 12 (16 characters).
    pub code_len_bytes: usize,

    /// Random bytes per access/refresh token (base64url-encoded).
    /// Default: 18 (24 characters).
    pub token_len_bytes: usize,

    /// Token type reported to clients.
    /// Default: "Bearer".
    pub token_type: String,
}

impl Default for CredentialConfig {
    fn default() -> Self {
        Self {
            code_lifetime_seconds: 300,
            code_len_bytes: 12,
            token_len_bytes: 18,
            token_type: "Bearer".to_string(),
        }
    }
}

impl CredentialConfig {
    /// Overrides the authorization code lifetime.
    #[must_use]
    pub fn with_code_lifetime(mut self, seconds: i64) -> Self {
        self.code_lifetime_seconds = seconds;
        self
    }
}
