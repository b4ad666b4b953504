//! Spendwise result cache.
//!
//! Query results are cached per resource family and exact parameter set.
//! Writes invalidate whole families through a declarative
//! [`Mutation`] map:
//!
//! | mutation | invalidates |
//! |---|---|
//! | expense create / update / delete | `expenses`, `expenses-summary` |
//! | budget create / update / delete | `budgets` |
//! | preferences update | nothing |
//!
//! ## Configuration
//!
//! ```toml
//! [cache]
//! enabled = true
//! stale_after_seconds = 60
//! max_entries = 256
//! ```

mod config;
mod keys;
mod planner;
mod store;
mod sync;

pub use config::CacheConfig;
pub use keys::{CacheKey, QueryParams, RECORD_PARAM, Resource, hash_value};
pub use planner::Mutation;
pub use store::{CacheStore, CachedValue, EntryStatus, Epoch};
pub use sync::{CacheSynchronizer, QueryState};
