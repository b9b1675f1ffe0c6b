//! Delivery to live connections.

use std::sync::Arc;

use serde::Serialize;
use serde_json::{Value, json};
use tracing::{debug, error, warn};

use crate::connections::LiveConnectionRegistry;
use crate::transport::{DeliveryOutcome, PushTransport};

/// A payload bound for the live view.
///
/// `body` is the bulky portion; when the transport rejects a payload for
/// size, delivery is retried once with `body` replaced by a short notice
/// and every other field preserved.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LivePayload {
    /// What happened: `state-update`, `device-added`, `device-removed`.
    pub event: String,

    /// The bulky portion: device states or discovery data.
    pub body: Value,

    /// Small routing/context fields, preserved verbatim in the fallback.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}

impl LivePayload {
    #[must_use]
    pub fn new(event: impl Into<String>, body: Value) -> Self {
        Self {
            event: event.into(),
            body,
            meta: None,
        }
    }

    #[must_use]
    pub fn with_meta(mut self, meta: Value) -> Self {
        self.meta = Some(meta);
        self
    }

    /// The fallback shape sent when the full payload exceeds the transport
    /// limit.
    #[must_use]
    pub fn oversize_notice(&self) -> Self {
        Self {
            event: self.event.clone(),
            body: json!({ "notice": "payload too large to show" }),
            meta: self.meta.clone(),
        }
    }
}

/// Pushes payloads to every live connection of an account.
///
/// Best-effort by design: size-exceeded payloads get one truncated retry,
/// gone connections are deregistered, and every other failure is logged
/// and skipped. `push` never fails the caller.
#[derive(Clone)]
pub struct Pusher {
    registry: LiveConnectionRegistry,
    transport: Arc<dyn PushTransport>,
}

impl Pusher {
    #[must_use]
    pub fn new(registry: LiveConnectionRegistry, transport: Arc<dyn PushTransport>) -> Self {
        Self {
            registry,
            transport,
        }
    }

    /// Serializes `payload` and attempts delivery to each connection of
    /// `username`.
    pub async fn push(&self, username: &str, payload: &LivePayload) {
        let Ok(bytes) = serde_json::to_vec(payload) else {
            error!(username, "live payload failed to serialize");
            return;
        };

        for connection_id in self.registry.connections_for(username).await {
            match self.transport.deliver(&connection_id, &bytes).await {
                DeliveryOutcome::Delivered => {
                    debug!(connection_id, event = payload.event, "pushed");
                }
                DeliveryOutcome::SizeExceeded => {
                    self.push_notice(&connection_id, payload).await;
                }
                DeliveryOutcome::RecipientGone => {
                    debug!(connection_id, "connection gone, deregistering");
                    if let Err(err) = self.registry.on_disconnect(&connection_id).await {
                        error!(connection_id, %err, "failed to deregister connection");
                    }
                }
                DeliveryOutcome::Failed(reason) => {
                    warn!(connection_id, reason, "push failed");
                }
            }
        }
    }

    async fn push_notice(&self, connection_id: &str, payload: &LivePayload) {
        let notice = payload.oversize_notice();
        let Ok(bytes) = serde_json::to_vec(&notice) else {
            return;
        };
        match self.transport.deliver(connection_id, &bytes).await {
            DeliveryOutcome::Delivered | DeliveryOutcome::RecipientGone => {}
            outcome => error!(connection_id, ?outcome, "fallback push failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use homelink_storage::MemoryStore;

    use super::*;

    /// Records every delivery and replies from a scripted outcome list.
    struct ScriptedTransport {
        outcomes: Mutex<Vec<DeliveryOutcome>>,
        deliveries: Mutex<Vec<(String, Vec<u8>)>>,
    }

    impl ScriptedTransport {
        fn new(outcomes: Vec<DeliveryOutcome>) -> Self {
            Self {
                outcomes: Mutex::new(outcomes),
                deliveries: Mutex::new(Vec::new()),
            }
        }

        fn delivered(&self) -> Vec<(String, Vec<u8>)> {
            self.deliveries.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PushTransport for ScriptedTransport {
        async fn deliver(&self, connection_id: &str, bytes: &[u8]) -> DeliveryOutcome {
            self.deliveries
                .lock()
                .unwrap()
                .push((connection_id.to_string(), bytes.to_vec()));
            let mut outcomes = self.outcomes.lock().unwrap();
            if outcomes.is_empty() {
                DeliveryOutcome::Delivered
            } else {
                outcomes.remove(0)
            }
        }
    }

    async fn pusher_with(
        outcomes: Vec<DeliveryOutcome>,
    ) -> (Pusher, Arc<ScriptedTransport>, LiveConnectionRegistry) {
        let registry = LiveConnectionRegistry::new(Arc::new(MemoryStore::new()));
        let transport = Arc::new(ScriptedTransport::new(outcomes));
        (
            Pusher::new(registry.clone(), transport.clone()),
            transport,
            registry,
        )
    }

    fn payload() -> LivePayload {
        LivePayload::new("state-update", json!([{ "switch": "on" }]))
            .with_meta(json!({ "deviceId": "d-1" }))
    }

    #[tokio::test]
    async fn test_push_reaches_each_connection() {
        let (pusher, transport, registry) = pusher_with(vec![]).await;
        registry.on_connect("conn1", "alice").await.unwrap();
        registry.on_connect("conn2", "alice").await.unwrap();

        pusher.push("alice", &payload()).await;

        assert_eq!(transport.delivered().len(), 2);
    }

    #[tokio::test]
    async fn test_size_exceeded_retries_with_notice() {
        let (pusher, transport, registry) =
            pusher_with(vec![DeliveryOutcome::SizeExceeded]).await;
        registry.on_connect("conn1", "alice").await.unwrap();

        pusher.push("alice", &payload()).await;

        let deliveries = transport.delivered();
        assert_eq!(deliveries.len(), 2);
        let fallback: Value = serde_json::from_slice(&deliveries[1].1).unwrap();
        assert_eq!(fallback["body"]["notice"], "payload too large to show");
        // Other fields are preserved.
        assert_eq!(fallback["event"], "state-update");
        assert_eq!(fallback["meta"]["deviceId"], "d-1");
    }

    #[tokio::test]
    async fn test_gone_connection_is_deregistered() {
        let (pusher, _, registry) = pusher_with(vec![DeliveryOutcome::RecipientGone]).await;
        registry.on_connect("conn1", "alice").await.unwrap();

        pusher.push("alice", &payload()).await;

        assert!(registry.connections_for("alice").await.is_empty());
    }

    #[tokio::test]
    async fn test_failed_delivery_continues_to_next_connection() {
        let (pusher, transport, registry) =
            pusher_with(vec![DeliveryOutcome::Failed("boom".to_string())]).await;
        registry.on_connect("conn1", "alice").await.unwrap();
        registry.on_connect("conn2", "alice").await.unwrap();

        pusher.push("alice", &payload()).await;

        // Both connections were attempted despite the first failing.
        assert_eq!(transport.delivered().len(), 2);
        assert_eq!(registry.connections_for("alice").await.len(), 2);
    }
}
