//! Read view over the credential store for fan-out.

use tracing::debug;

use homelink_core::Account;
use homelink_storage::{
    CallbackAuth, CallbackUrls, DynKeyedStore, RecordKey, RecordTag, StoredRecord,
};

use crate::error::{AuthError, AuthResult};

/// One qualifying subscription for an account.
#[derive(Debug, Clone, PartialEq)]
pub struct SubscriptionEntry {
    /// The access token the registration is embedded in. Compared against
    /// the origin token during fan-out.
    pub access_token: String,
    pub auth: CallbackAuth,
    pub callback_urls: CallbackUrls,
}

/// Exposes only the tokens that carry a granted callback registration.
///
/// Pull-mode tokens (no registration) never appear here and therefore
/// never receive proactive notifications.
#[derive(Clone)]
pub struct SubscriptionDirectory {
    store: DynKeyedStore,
}

impl SubscriptionDirectory {
    #[must_use]
    pub fn new(store: DynKeyedStore) -> Self {
        Self { store }
    }

    /// Every subscription registered for `username`.
    pub async fn list_for_account(&self, username: &str) -> AuthResult<Vec<SubscriptionEntry>> {
        let records = self
            .store
            .query_owner(username, RecordTag::AccessToken)
            .await?;

        let entries: Vec<SubscriptionEntry> = records
            .into_iter()
            .filter_map(|record| match record {
                StoredRecord::AccessToken(token) => token.subscription.map(|subscription| {
                    SubscriptionEntry {
                        access_token: token.token,
                        auth: subscription.auth,
                        callback_urls: subscription.callback_urls,
                    }
                }),
                _ => None,
            })
            .collect();
        debug!(username, count = entries.len(), "subscriptions found");
        Ok(entries)
    }

    /// Resolves the account that owns `access_token`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Unauthorized` if the token resolves to no
    /// account, which is how an upstream integration deletion surfaces.
    pub async fn account_for_token(&self, access_token: &str) -> AuthResult<Account> {
        let username = match self
            .store
            .get(&RecordKey::access_token(access_token))
            .await?
        {
            Some(StoredRecord::AccessToken(token)) => token.username,
            _ => return Err(AuthError::unauthorized("token resolves to no account")),
        };
        self.account(&username).await
    }

    /// Resolves the account that owns an unredeemed authorization code.
    pub async fn account_for_code(&self, code: &str) -> AuthResult<Account> {
        let username = match self.store.get(&RecordKey::auth_code(code)).await? {
            Some(StoredRecord::AuthCode(record)) => record.username,
            _ => return Err(AuthError::not_found("authorization code")),
        };
        self.account(&username).await
    }

    async fn account(&self, username: &str) -> AuthResult<Account> {
        match self.store.get(&RecordKey::account(username)).await? {
            Some(StoredRecord::Account(account)) => Ok(account),
            _ => Err(AuthError::unauthorized("account no longer exists")),
        }
    }
}
