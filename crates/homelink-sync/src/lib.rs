//! # homelink-sync
//!
//! The proactive fan-out engine. On every device-state change the engine
//! builds one normalized update and delivers it to everyone currently
//! interested in the account: the browser live view, unconditionally, and
//! each externally registered webhook subscriber, minus at most one origin
//! token whose own command caused the change.
//!
//! Delivery is at most once per recipient per event. There is no retry
//! queue and no outbox; a failing subscriber loses the event and every
//! other recipient is unaffected.
//!
//! The crate also carries the protocol dispatch layer: inbound protocol
//! requests decoded by the wire library arrive here as
//! [`ProtocolRequest`] variants and are handled by [`Connector`].

mod connections;
mod connector;
mod engine;
mod error;
mod gateway;
mod http;
mod mapper;
mod protocol;
mod pusher;
mod transport;

pub use connections::LiveConnectionRegistry;
pub use connector::Connector;
pub use engine::StateSyncEngine;
pub use error::SyncError;
pub use gateway::{
    CallbackGateway, CallbackResult, DeviceErrorEntry, DeviceErrorType, DeviceState,
    DiscoveryDevice, GatewayError,
};
pub use http::HttpCallbackGateway;
pub use mapper::{PassthroughMapper, StateMapper};
pub use protocol::{
    CommandEntry, CommandTarget, GlobalErrorType, ProtocolRequest, ProtocolResponse,
};
pub use pusher::{LivePayload, Pusher};
pub use transport::{DeliveryOutcome, PushTransport};
