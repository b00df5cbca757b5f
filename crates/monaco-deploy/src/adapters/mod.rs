//! Backend adapters.
//!
//! Four thin dispatchers, one per configuration family, each translating a
//! resolved configuration into an upsert against the matching client and
//! interpreting the response into a [`ResolvedEntity`]. The family set is
//! closed; dispatch is a plain `match`, not an open interface.

mod automation;
mod bucket;
mod classic;
mod settings;

use std::collections::BTreeMap;

use serde_json::Value;
use tokio_util::sync::CancellationToken;

use monaco_core::api::ApiCatalog;
use monaco_core::config::{Config, ConfigType};
use monaco_core::entity::ResolvedEntity;
use monaco_core::manifest::Environment;

use crate::clients::ClientSet;
use crate::error::Result;

/// Everything an adapter needs besides the configuration itself.
#[derive(Clone, Copy)]
pub(crate) struct AdapterContext<'a> {
    pub cancel: &'a CancellationToken,
    pub environment: &'a Environment,
    pub catalog: &'a ApiCatalog,
    pub clients: &'a ClientSet,
}

/// Dispatches a resolved configuration to its family adapter.
pub(crate) async fn upsert(
    ctx: AdapterContext<'_>,
    config: &Config,
    name: Option<&str>,
    payload: &str,
    properties: &BTreeMap<String, Value>,
) -> Result<ResolvedEntity> {
    match &config.config_type {
        ConfigType::ClassicApi { api } => {
            classic::upsert(ctx, config, api, name, payload, properties).await
        }
        ConfigType::Settings {
            schema,
            schema_version,
        } => {
            settings::upsert(
                ctx,
                config,
                schema,
                schema_version.as_deref(),
                name,
                payload,
                properties,
            )
            .await
        }
        ConfigType::Automation { resource } => {
            automation::upsert(ctx, config, *resource, name, payload, properties).await
        }
        ConfigType::Bucket => bucket::upsert(ctx, config, name, payload).await,
    }
}

/// Reads a string-valued property, e.g. an `id` or `scope` override.
pub(crate) fn string_property<'a>(
    properties: &'a BTreeMap<String, Value>,
    key: &str,
) -> Option<&'a str> {
    properties.get(key).and_then(Value::as_str)
}
