//! The credential store: code issuance, redemption, rotation, revocation,
//! and subscription registration.

use serde::Serialize;
use tracing::debug;

use homelink_core::{expiration_from, generate_credential, is_expired};
use homelink_storage::{
    AuthCodeRecord, CallbackAuth, CallbackUrls, DynKeyedStore, RecordKey, RecordTag, StoredRecord,
    SubscriptionRegistration, TokenRecord, WriteOp,
};

use crate::config::CredentialConfig;
use crate::error::{AuthError, AuthResult};

/// Result of redeeming a code or rotating a refresh token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RedeemedTokens {
    pub username: String,
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
    pub token_type: String,
}

/// Persists authorization codes and access/refresh token pairs.
///
/// Every access token has an independently addressable refresh record (and
/// vice versa); the two are always written and deleted together, so a
/// rotation or redemption is one atomic multi-item set against the store.
/// The read that precedes such a set is not covered by it: two concurrent
/// rotations of the same refresh token can both succeed, each leaving a
/// live pair behind. There is no optimistic-concurrency guard.
#[derive(Clone)]
pub struct CredentialStore {
    store: DynKeyedStore,
    config: CredentialConfig,
}

impl CredentialStore {
    #[must_use]
    pub fn new(store: DynKeyedStore, config: CredentialConfig) -> Self {
        Self { store, config }
    }

    /// Issues a fresh single-use authorization code for `username`.
    ///
    /// `token_ttl` is the lifetime the eventual access token will carry;
    /// the code itself expires after the configured code lifetime.
    pub async fn issue_authorization_code(
        &self,
        username: &str,
        token_ttl: i64,
    ) -> AuthResult<String> {
        let code = generate_credential(self.config.code_len_bytes);
        let record = AuthCodeRecord {
            code: code.clone(),
            username: username.to_string(),
            token_type: self.config.token_type.clone(),
            token_ttl,
            expires_at: expiration_from(self.config.code_lifetime_seconds),
        };

        self.store
            .put(RecordKey::auth_code(&code), StoredRecord::AuthCode(record))
            .await?;
        debug!(username, "issued authorization code");
        Ok(code)
    }

    /// Redeems an authorization code for a fresh token pair.
    ///
    /// Writes both token records and deletes the code in one atomic set, so
    /// a code redeems exactly once.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidGrant` if the code is absent, expired, or
    /// already consumed.
    pub async fn redeem_code(&self, code: &str) -> AuthResult<RedeemedTokens> {
        let code_key = RecordKey::auth_code(code);
        let record = match self.store.get(&code_key).await? {
            Some(StoredRecord::AuthCode(record)) => record,
            _ => return Err(AuthError::invalid_grant("unknown authorization code")),
        };
        if is_expired(record.expires_at) {
            return Err(AuthError::invalid_grant("authorization code expired"));
        }

        let (access, refresh) = self.new_pair(
            &record.username,
            &record.token_type,
            record.token_ttl,
            None,
        );
        self.store
            .batch_write(vec![
                WriteOp::Put(
                    RecordKey::access_token(&access.token),
                    StoredRecord::AccessToken(access.clone()),
                ),
                WriteOp::Put(
                    RecordKey::refresh_token(&refresh.token),
                    StoredRecord::RefreshToken(refresh.clone()),
                ),
                WriteOp::Delete(code_key),
            ])
            .await?;

        debug!(username = record.username, "redeemed authorization code");
        Ok(RedeemedTokens {
            username: record.username,
            access_token: access.token,
            refresh_token: refresh.token,
            expires_in: record.token_ttl,
            token_type: record.token_type,
        })
    }

    /// Rotates an access/refresh pair.
    ///
    /// The new pair inherits username, ttl, token type, and any callback
    /// subscription. Both old records are deleted in the same atomic set
    /// that writes the new ones, so the old access token becomes
    /// unresolvable the moment rotation commits.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidGrant` if the refresh token is unknown.
    pub async fn rotate(&self, refresh_token: &str) -> AuthResult<RedeemedTokens> {
        let old_key = RecordKey::refresh_token(refresh_token);
        let old = match self.store.get(&old_key).await? {
            Some(StoredRecord::RefreshToken(record)) => record,
            _ => return Err(AuthError::invalid_grant("unknown refresh token")),
        };

        let (access, refresh) = self.new_pair(
            &old.username,
            &old.token_type,
            old.ttl_seconds,
            old.subscription.clone(),
        );
        self.store
            .batch_write(vec![
                WriteOp::Put(
                    RecordKey::access_token(&access.token),
                    StoredRecord::AccessToken(access.clone()),
                ),
                WriteOp::Put(
                    RecordKey::refresh_token(&refresh.token),
                    StoredRecord::RefreshToken(refresh.clone()),
                ),
                WriteOp::Delete(RecordKey::access_token(&old.paired_token)),
                WriteOp::Delete(old_key),
            ])
            .await?;

        debug!(username = old.username, "rotated token pair");
        Ok(RedeemedTokens {
            username: old.username,
            access_token: access.token,
            refresh_token: refresh.token,
            expires_in: old.ttl_seconds,
            token_type: old.token_type,
        })
    }

    /// Resolves an access token to its record.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NotFound` if the token is absent or expired.
    pub async fn lookup_by_access_token(&self, access_token: &str) -> AuthResult<TokenRecord> {
        let key = RecordKey::access_token(access_token);
        let record = match self.store.get(&key).await? {
            Some(StoredRecord::AccessToken(record)) => record,
            _ => return Err(AuthError::not_found("access token")),
        };
        match record.expires_at {
            Some(expires_at) if is_expired(expires_at) => Err(AuthError::not_found("access token")),
            _ => Ok(record),
        }
    }

    /// Deletes the access/refresh pair reachable from `access_token`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NotFound` if the access token is absent.
    pub async fn revoke(&self, access_token: &str) -> AuthResult<()> {
        let key = RecordKey::access_token(access_token);
        let record = match self.store.get(&key).await? {
            Some(StoredRecord::AccessToken(record)) => record,
            _ => return Err(AuthError::not_found("access token")),
        };

        self.store
            .batch_write(vec![
                WriteOp::Delete(key),
                WriteOp::Delete(RecordKey::refresh_token(&record.paired_token)),
            ])
            .await?;
        debug!(username = record.username, "revoked token pair");
        Ok(())
    }

    /// Embeds a callback registration into the pair reachable from
    /// `access_token`.
    ///
    /// If `auth` carries its own `expires_in`, the absolute expiry is
    /// computed here and stored with it. Both records of the pair are
    /// rewritten in one set.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NotFound` if the access token is absent.
    pub async fn attach_subscription(
        &self,
        access_token: &str,
        auth: CallbackAuth,
        callback_urls: CallbackUrls,
    ) -> AuthResult<()> {
        let subscription = SubscriptionRegistration {
            auth: with_absolute_expiry(auth),
            callback_urls,
        };
        self.rewrite_pair(access_token, subscription).await
    }

    /// Replaces the callback credential of an existing registration,
    /// preserving its callback URLs.
    ///
    /// Called when a delivery reports a transparently refreshed credential.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NotFound` if the access token is absent or
    /// carries no registration.
    pub async fn refresh_subscription_credential(
        &self,
        access_token: &str,
        new_auth: CallbackAuth,
    ) -> AuthResult<()> {
        let record = self.read_access_record(access_token).await?;
        let Some(existing) = record.subscription else {
            return Err(AuthError::not_found("callback registration"));
        };

        let subscription = SubscriptionRegistration {
            auth: with_absolute_expiry(new_auth),
            callback_urls: existing.callback_urls,
        };
        self.rewrite_pair(access_token, subscription).await
    }

    /// Deletes expired, unredeemed authorization codes for one account.
    ///
    /// Nothing schedules this; redemption already rejects expired codes, so
    /// this only reclaims storage.
    pub async fn purge_expired_codes(&self, username: &str) -> AuthResult<u64> {
        let records = self
            .store
            .query_owner(username, RecordTag::AuthCode)
            .await?;
        let mut purged = 0;
        for record in records {
            if let StoredRecord::AuthCode(code) = record
                && is_expired(code.expires_at)
            {
                self.store.delete(&RecordKey::auth_code(&code.code)).await?;
                purged += 1;
            }
        }
        Ok(purged)
    }

    async fn read_access_record(&self, access_token: &str) -> AuthResult<TokenRecord> {
        match self.store.get(&RecordKey::access_token(access_token)).await? {
            Some(StoredRecord::AccessToken(record)) => Ok(record),
            _ => Err(AuthError::not_found("access token")),
        }
    }

    /// Rewrites both halves of a pair with a new subscription registration,
    /// leaving every other field as stored.
    async fn rewrite_pair(
        &self,
        access_token: &str,
        subscription: SubscriptionRegistration,
    ) -> AuthResult<()> {
        let record = self.read_access_record(access_token).await?;

        let mut access = record.clone();
        access.subscription = Some(subscription.clone());

        let refresh = TokenRecord {
            token: record.paired_token.clone(),
            paired_token: record.token.clone(),
            expires_at: None,
            subscription: Some(subscription),
            ..record
        };

        self.store
            .batch_write(vec![
                WriteOp::Put(
                    RecordKey::access_token(&access.token),
                    StoredRecord::AccessToken(access),
                ),
                WriteOp::Put(
                    RecordKey::refresh_token(&refresh.token),
                    StoredRecord::RefreshToken(refresh),
                ),
            ])
            .await?;
        Ok(())
    }

    fn new_pair(
        &self,
        username: &str,
        token_type: &str,
        ttl_seconds: i64,
        subscription: Option<SubscriptionRegistration>,
    ) -> (TokenRecord, TokenRecord) {
        let access_token = generate_credential(self.config.token_len_bytes);
        let refresh_token = generate_credential(self.config.token_len_bytes);

        let access = TokenRecord {
            token: access_token.clone(),
            paired_token: refresh_token.clone(),
            username: username.to_string(),
            token_type: token_type.to_string(),
            ttl_seconds,
            expires_at: Some(expiration_from(ttl_seconds)),
            subscription: subscription.clone(),
        };
        let refresh = TokenRecord {
            token: refresh_token,
            paired_token: access_token,
            username: username.to_string(),
            token_type: token_type.to_string(),
            ttl_seconds,
            expires_at: None,
            subscription,
        };
        (access, refresh)
    }
}

fn with_absolute_expiry(mut auth: CallbackAuth) -> CallbackAuth {
    if let Some(expires_in) = auth.expires_in {
        auth.expires_at = Some(expiration_from(expires_in));
    }
    auth
}
