//! # homelink-storage
//!
//! Storage abstraction for the Homelink connector.
//!
//! Everything the connector persists lives in one keyed record store
//! addressed by `(partition, sort)`, with a secondary index over the owning
//! username. This crate defines:
//!
//! - [`KeyedStore`] — the store trait backends implement
//! - [`StoredRecord`] — a tagged union with one variant per persisted entity
//! - [`MemoryStore`] — the in-process backend used by tests and local runs
//! - [`DeviceStore`] — the typed device repository layered over the store
//!
//! ## Atomicity
//!
//! [`KeyedStore::batch_write`] applies a mixed put/delete set as one unit.
//! Credential rotation and redemption lean on that guarantee; nothing in
//! this layer takes in-process locks across requests.

mod devices;
mod error;
mod memory;
mod records;
mod traits;

pub use devices::DeviceStore;
pub use error::StorageError;
pub use memory::MemoryStore;
pub use records::{
    AuthCodeRecord, CallbackAuth, CallbackUrls, ConnectionRecord, RecordKey, RecordTag,
    StoredRecord, SubscriptionRegistration, TokenRecord, WriteOp,
};
pub use traits::{DynKeyedStore, KeyedStore};
