//! The live push transport seam.

use async_trait::async_trait;

/// Outcome of one delivery attempt to one live connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// The payload reached the connection.
    Delivered,

    /// The transport rejected the payload for size; the caller may retry
    /// with a smaller one.
    SizeExceeded,

    /// The connection no longer exists and should be deregistered.
    RecipientGone,

    /// Any other delivery failure.
    Failed(String),
}

/// Delivers serialized payloads to individual live connections.
///
/// Implementations wrap whatever real-time transport the deployment uses;
/// timeouts are theirs, this layer imposes none.
#[async_trait]
pub trait PushTransport: Send + Sync {
    async fn deliver(&self, connection_id: &str, bytes: &[u8]) -> DeliveryOutcome;
}
