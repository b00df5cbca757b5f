//! # monaco-core
//!
//! Shared primitives for the configuration-as-code deploy core.
//!
//! This crate provides the foundational types used across all components:
//!
//! - **Coordinates**: the `(project, type, configId)` identity of every
//!   configuration
//! - **Parameters**: the closed set of parameter variants with reference
//!   extraction and resolution
//! - **Manifest records**: environments, projects and loaded configurations
//!   as yielded by the external loader
//! - **API catalog**: the read-only table of classic configuration endpoints
//! - **Feature flags**: environment-variable-backed behavior toggles
//! - **Deterministic ids**: settings external ids and non-unique-name UUIDs
//!
//! ## Crate Boundary
//!
//! `monaco-core` performs no I/O and holds no clients; it is the only crate
//! allowed to define shared primitives.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]

pub mod api;
pub mod config;
pub mod coordinate;
pub mod entity;
pub mod error;
pub mod externalid;
pub mod featureflags;
pub mod manifest;
pub mod observability;
pub mod parameter;
pub mod template;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::api::{Api, ApiCatalog};
    pub use crate::config::{AutomationResource, Config, ConfigType};
    pub use crate::coordinate::Coordinate;
    pub use crate::entity::{EntityMap, ResolvedEntity};
    pub use crate::error::{Error, Result};
    pub use crate::featureflags::FeatureFlag;
    pub use crate::manifest::{Auth, Environment, Manifest, OAuthCredentials, Project};
    pub use crate::parameter::{Parameter, PropertyReference, ResolveContext};
}

// Re-export key types at crate root for ergonomics.
pub use api::{Api, ApiCatalog};
pub use config::{AutomationResource, Config, ConfigType};
pub use coordinate::Coordinate;
pub use entity::{EntityMap, ResolvedEntity};
pub use error::{Error, Result};
pub use featureflags::FeatureFlag;
pub use manifest::{Auth, Environment, Manifest, OAuthCredentials, Project};
pub use observability::{LogFormat, Redacted, init_logging};
pub use parameter::{EnvResolver, Parameter, ProcessEnv, PropertyReference, ResolveContext};
