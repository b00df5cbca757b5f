//! # monaco-client
//!
//! Client contracts consumed by the configuration-as-code deploy core.
//!
//! The core never speaks HTTP itself; it dispatches to the narrow contracts
//! defined here, one per configuration family:
//!
//! - [`ClassicClient`]: name-keyed classic configuration endpoints
//! - [`SettingsClient`]: id-keyed settings 2.0 objects
//! - [`AutomationClient`]: id-keyed automation resources (OAuth)
//! - [`BucketClient`]: name-keyed Grail buckets (OAuth)
//!
//! Cross-cutting concerns live alongside the contracts:
//!
//! - [`limit`]: per-tenant request concurrency bounding
//! - [`retry`]: exponential backoff for idempotent calls
//! - [`memory`]: in-memory fake tenants for tests

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]

pub mod automation;
pub mod bucket;
pub mod classic;
pub mod error;
pub mod limit;
pub mod memory;
pub mod retry;
pub mod settings;
pub mod types;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::automation::AutomationClient;
    pub use crate::bucket::BucketClient;
    pub use crate::classic::ClassicClient;
    pub use crate::error::{Error, Result};
    pub use crate::limit::{RateLimited, RequestLimiter};
    pub use crate::retry::{RetryPolicy, retry_idempotent};
    pub use crate::types::{
        AutomationObject, BucketObject, RemoteObject, SettingsObject, SettingsUpsert,
    };
}

pub use automation::AutomationClient;
pub use bucket::BucketClient;
pub use classic::ClassicClient;
pub use error::{Error, Result};
pub use limit::{RateLimited, RequestLimiter};
pub use retry::{RetryPolicy, retry_idempotent};
pub use settings::SettingsClient;
pub use types::{AutomationObject, BucketObject, RemoteObject, SettingsObject, SettingsUpsert};
