//! Session store: the single source of truth for "are we logged in".
//!
//! Holds the credential pair and the authenticated identity, mirrors them to
//! durable storage and owns the single-flight renewal protocol.

mod events;
mod store;

pub use events::SessionEvent;
pub use store::{RenewalFailure, RenewedCredentials, Renewer, SessionStore};
