//! Persisted record model.
//!
//! The connector keeps every entity in one keyed table. A record is
//! addressed by [`RecordKey`] and discriminated by the [`StoredRecord`]
//! variant it was stored as, so a lookup never has to guess what it found.
//!
//! Sort keys follow a fixed scheme: `account`, `code`, `token`,
//! `refresh_token`, `device-{external_id}`, `websocket`. Credential
//! partitions are the opaque credential strings themselves; device
//! partitions are the owning username; connection partitions carry a `ws:`
//! prefix to keep them out of the credential keyspace.

use serde::{Deserialize, Serialize};

use homelink_core::{Account, Device};

/// Address of one record: `(partition, sort)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordKey {
    pub partition: String,
    pub sort: String,
}

impl RecordKey {
    #[must_use]
    pub fn new(partition: impl Into<String>, sort: impl Into<String>) -> Self {
        Self {
            partition: partition.into(),
            sort: sort.into(),
        }
    }

    /// Key of an account record.
    #[must_use]
    pub fn account(username: &str) -> Self {
        Self::new(username, "account")
    }

    /// Key of an authorization code record.
    #[must_use]
    pub fn auth_code(code: &str) -> Self {
        Self::new(code, "code")
    }

    /// Key of an access token record.
    #[must_use]
    pub fn access_token(token: &str) -> Self {
        Self::new(token, "token")
    }

    /// Key of a refresh token record.
    #[must_use]
    pub fn refresh_token(token: &str) -> Self {
        Self::new(token, "refresh_token")
    }

    /// Key of a device record.
    #[must_use]
    pub fn device(username: &str, external_id: &str) -> Self {
        Self::new(username, format!("device-{external_id}"))
    }

    /// Key of a live connection record.
    #[must_use]
    pub fn connection(connection_id: &str) -> Self {
        Self::new(format!("ws:{connection_id}"), "websocket")
    }
}

/// Entity discriminator, used to filter owner-index queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordTag {
    Account,
    AuthCode,
    AccessToken,
    RefreshToken,
    Device,
    Connection,
}

/// A single-use authorization code.
///
/// `token_ttl` is the lifetime the eventual access token will get; the
/// code's own lifetime (`expires_at`) is fixed and much shorter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthCodeRecord {
    pub code: String,
    pub username: String,
    pub token_type: String,
    pub token_ttl: i64,
    pub expires_at: i64,
}

/// One half of an access/refresh pair.
///
/// Both halves are independently addressable records carrying the same
/// payload, so a refresh token resolves its pair in one read. Every write
/// that touches a pair rewrites both records together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenRecord {
    /// This record's own credential string.
    pub token: String,

    /// The other half of the pair.
    pub paired_token: String,

    pub username: String,
    pub token_type: String,
    pub ttl_seconds: i64,

    /// Absolute expiry. Set on access tokens only; refresh tokens do not
    /// expire on their own.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,

    /// Present once callback access has been granted for this pair.
    /// Absent means pull-mode: the holder is excluded from fan-out.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription: Option<SubscriptionRegistration>,
}

/// Callback registration embedded in a token pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionRegistration {
    pub auth: CallbackAuth,
    pub callback_urls: CallbackUrls,
}

/// Opaque credential for calling a subscriber back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallbackAuth {
    pub access_token: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,

    /// Lifetime as reported by the subscriber, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<i64>,

    /// Absolute expiry, computed from `expires_in` when the registration
    /// is stored.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
}

/// Endpoints registered by a subscriber.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallbackUrls {
    /// Where state updates and discovery payloads are delivered.
    pub state_callback: String,

    /// Token endpoint for refreshing the callback credential.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oauth_token: Option<String>,
}

/// An ephemeral live-view connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionRecord {
    pub connection_id: String,
    pub username: String,
}

/// Tagged union over every persisted entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "entity", rename_all = "snake_case")]
pub enum StoredRecord {
    Account(Account),
    AuthCode(AuthCodeRecord),
    AccessToken(TokenRecord),
    RefreshToken(TokenRecord),
    Device(Device),
    Connection(ConnectionRecord),
}

impl StoredRecord {
    /// The entity discriminator of this record.
    #[must_use]
    pub fn tag(&self) -> RecordTag {
        match self {
            Self::Account(_) => RecordTag::Account,
            Self::AuthCode(_) => RecordTag::AuthCode,
            Self::AccessToken(_) => RecordTag::AccessToken,
            Self::RefreshToken(_) => RecordTag::RefreshToken,
            Self::Device(_) => RecordTag::Device,
            Self::Connection(_) => RecordTag::Connection,
        }
    }

    /// The owning username, which feeds the secondary index.
    #[must_use]
    pub fn owner(&self) -> &str {
        match self {
            Self::Account(account) => &account.username,
            Self::AuthCode(code) => &code.username,
            Self::AccessToken(token) | Self::RefreshToken(token) => &token.username,
            // Device partitions are the username itself; the record does not
            // repeat it, so the index keys devices through their partition.
            Self::Device(_) => "",
            Self::Connection(connection) => &connection.username,
        }
    }
}

/// One element of an atomic multi-item write set.
#[derive(Debug, Clone)]
pub enum WriteOp {
    Put(RecordKey, StoredRecord),
    Delete(RecordKey),
}
