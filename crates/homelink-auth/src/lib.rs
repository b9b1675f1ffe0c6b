//! # homelink-auth
//!
//! Credential lifecycle for third-party client integrations.
//!
//! A client integration starts from a short-lived single-use authorization
//! code, redeems it for an access/refresh token pair, and rotates that pair
//! for as long as the integration lives. Once a subscriber is granted
//! callback access, the registration rides along inside the token pair and
//! survives every rotation.
//!
//! The state machine per credential pair:
//!
//! ```text
//! Issued(code) --redeem--> Active(pair) --rotate--> Active(new pair) --revoke--> Revoked
//! ```
//!
//! Rotation makes both halves of the old pair unresolvable in the same
//! atomic write set that creates the new pair.

mod config;
mod credentials;
mod directory;
mod error;

pub use config::CredentialConfig;
pub use credentials::{CredentialStore, RedeemedTokens};
pub use directory::{SubscriptionDirectory, SubscriptionEntry};
pub use error::{AuthError, AuthResult};
