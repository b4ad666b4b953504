//! Session-authenticated data access for the Spendwise expense tracking API.
//!
//! Three components, from the network edge inward:
//!
//! - [`session::SessionStore`] holds the credential pair and identity and
//!   owns the single-flight renewal protocol.
//! - [`pipeline::RequestPipeline`] attaches the access credential to every
//!   call and retries once after renewing on an authorization failure.
//! - [`cache::CacheSynchronizer`] caches reads per resource family and
//!   parameter set and invalidates families after successful writes.
//!
//! [`Client`] wires them together and exposes the typed resource APIs.

pub mod api;
pub mod cache;
mod client;
pub mod config;
pub mod infra;
pub mod pipeline;
pub mod session;
pub mod util;

pub use client::Client;
pub use spendwise_api_types as types;
