//! Shared fixture for sync integration tests: in-memory store, recording
//! fakes for the push transport and the callback gateway, and a fully
//! wired engine + connector.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use homelink_auth::{CredentialConfig, CredentialStore, SubscriptionDirectory};
use homelink_core::Account;
use homelink_storage::{
    CallbackAuth, CallbackUrls, DeviceStore, KeyedStore, MemoryStore, RecordKey, StoredRecord,
};
use homelink_sync::{
    CallbackGateway, CallbackResult, Connector, DeliveryOutcome, DeviceState, DiscoveryDevice,
    GatewayError, LiveConnectionRegistry, PassthroughMapper, PushTransport, Pusher,
    StateSyncEngine,
};

/// One recorded callback delivery.
#[derive(Debug, Clone)]
pub enum Delivery {
    States {
        url: String,
        token: String,
        device_states: Vec<DeviceState>,
    },
    Discovery {
        url: String,
        token: String,
        device: DiscoveryDevice,
    },
}

impl Delivery {
    pub fn url(&self) -> &str {
        match self {
            Self::States { url, .. } | Self::Discovery { url, .. } => url,
        }
    }
}

/// Gateway fake: records every call, fails scripted URLs, and reports a
/// scripted refreshed credential for others.
#[derive(Default)]
pub struct RecordingGateway {
    deliveries: Mutex<Vec<Delivery>>,
    fail_urls: Mutex<HashSet<String>>,
    refresh_urls: Mutex<HashMap<String, CallbackAuth>>,
}

impl RecordingGateway {
    pub fn deliveries(&self) -> Vec<Delivery> {
        self.deliveries.lock().unwrap().clone()
    }

    pub fn urls_delivered(&self) -> Vec<String> {
        self.deliveries()
            .iter()
            .map(|d| d.url().to_string())
            .collect()
    }

    pub fn fail_for(&self, url: &str) {
        self.fail_urls.lock().unwrap().insert(url.to_string());
    }

    pub fn refresh_for(&self, url: &str, auth: CallbackAuth) {
        self.refresh_urls
            .lock()
            .unwrap()
            .insert(url.to_string(), auth);
    }

    fn outcome(&self, url: &str) -> Result<CallbackResult, GatewayError> {
        if self.fail_urls.lock().unwrap().contains(url) {
            return Err(GatewayError::Request("connection refused".to_string()));
        }
        Ok(CallbackResult {
            refreshed_auth: self.refresh_urls.lock().unwrap().get(url).cloned(),
        })
    }
}

#[async_trait]
impl CallbackGateway for RecordingGateway {
    async fn send_state_update(
        &self,
        urls: &CallbackUrls,
        auth: &CallbackAuth,
        device_states: &[DeviceState],
    ) -> Result<CallbackResult, GatewayError> {
        self.deliveries.lock().unwrap().push(Delivery::States {
            url: urls.state_callback.clone(),
            token: auth.access_token.clone(),
            device_states: device_states.to_vec(),
        });
        self.outcome(&urls.state_callback)
    }

    async fn send_discovery(
        &self,
        urls: &CallbackUrls,
        auth: &CallbackAuth,
        device: &DiscoveryDevice,
    ) -> Result<CallbackResult, GatewayError> {
        self.deliveries.lock().unwrap().push(Delivery::Discovery {
            url: urls.state_callback.clone(),
            token: auth.access_token.clone(),
            device: device.clone(),
        });
        self.outcome(&urls.state_callback)
    }
}

/// Transport fake: accepts everything and records payloads per connection.
#[derive(Default)]
pub struct RecordingTransport {
    pub pushed: Mutex<Vec<(String, Vec<u8>)>>,
}

impl RecordingTransport {
    pub fn pushed_to(&self, connection_id: &str) -> usize {
        self.pushed
            .lock()
            .unwrap()
            .iter()
            .filter(|(id, _)| id == connection_id)
            .count()
    }
}

#[async_trait]
impl PushTransport for RecordingTransport {
    async fn deliver(&self, connection_id: &str, bytes: &[u8]) -> DeliveryOutcome {
        self.pushed
            .lock()
            .unwrap()
            .push((connection_id.to_string(), bytes.to_vec()));
        DeliveryOutcome::Delivered
    }
}

pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub credentials: CredentialStore,
    pub directory: SubscriptionDirectory,
    pub devices: DeviceStore,
    pub registry: LiveConnectionRegistry,
    pub transport: Arc<RecordingTransport>,
    pub gateway: Arc<RecordingGateway>,
    pub engine: Arc<StateSyncEngine>,
    pub connector: Connector,
}

pub fn harness() -> Harness {
    let store = Arc::new(MemoryStore::new());
    let credentials = CredentialStore::new(store.clone(), CredentialConfig::default());
    let directory = SubscriptionDirectory::new(store.clone());
    let devices = DeviceStore::new(store.clone());
    let registry = LiveConnectionRegistry::new(store.clone());
    let transport = Arc::new(RecordingTransport::default());
    let gateway = Arc::new(RecordingGateway::default());
    let mapper = Arc::new(PassthroughMapper);

    let pusher = Pusher::new(registry.clone(), transport.clone());
    let engine = Arc::new(StateSyncEngine::new(
        directory.clone(),
        credentials.clone(),
        devices.clone(),
        pusher,
        gateway.clone(),
        mapper.clone(),
    ));
    let connector = Connector::new(
        credentials.clone(),
        directory.clone(),
        devices.clone(),
        engine.clone(),
        mapper,
    );

    Harness {
        store,
        credentials,
        directory,
        devices,
        registry,
        transport,
        gateway,
        engine,
        connector,
    }
}

impl Harness {
    pub async fn seed_account(&self, username: &str) {
        self.store
            .put(
                RecordKey::account(username),
                StoredRecord::Account(Account {
                    username: username.to_string(),
                    password_hash: "hash".to_string(),
                    salt: "salt".to_string(),
                }),
            )
            .await
            .unwrap();
    }

    /// Redeems a fresh pair for `username` and grants it callback access
    /// pointed at `url`. Returns the pair's access token.
    pub async fn subscriber(&self, username: &str, url: &str) -> String {
        let code = self
            .credentials
            .issue_authorization_code(username, 3600)
            .await
            .unwrap();
        let redeemed = self.credentials.redeem_code(&code).await.unwrap();
        self.credentials
            .attach_subscription(
                &redeemed.access_token,
                CallbackAuth {
                    access_token: format!("cb-{url}"),
                    refresh_token: Some(format!("cbr-{url}")),
                    token_type: Some("Bearer".to_string()),
                    expires_in: None,
                    expires_at: None,
                },
                CallbackUrls {
                    state_callback: url.to_string(),
                    oauth_token: None,
                },
            )
            .await
            .unwrap();
        redeemed.access_token
    }
}
