//! # homelink-core
//!
//! Shared domain types for the Homelink connector: device and account
//! records, schemaless state maps, credential generation, and epoch-second
//! expiry arithmetic.
//!
//! This crate has no I/O. Storage and delivery live in `homelink-storage`
//! and `homelink-sync`.

pub mod credential;
pub mod device;
pub mod error;
pub mod state;
pub mod time;

pub use credential::{generate_credential, generate_external_id};
pub use device::{Account, Device, validate_identifier};
pub use error::{CoreError, Result};
pub use state::{StateMap, merge_states, remove_state_keys};
pub use time::{epoch_now, expiration_from, is_expired};
