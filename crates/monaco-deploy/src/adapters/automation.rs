//! Adapter for id-keyed automation resources.

use std::collections::BTreeMap;

use serde_json::Value;

use monaco_core::config::{AutomationResource, Config};
use monaco_core::entity::ResolvedEntity;
use monaco_core::parameter::ID_PARAMETER;

use super::{AdapterContext, string_property};
use crate::error::{Error, Result};

pub(crate) async fn upsert(
    ctx: AdapterContext<'_>,
    config: &Config,
    resource: AutomationResource,
    name: Option<&str>,
    payload: &str,
    properties: &BTreeMap<String, Value>,
) -> Result<ResolvedEntity> {
    let coordinate = &config.coordinate;
    let Some(client) = &ctx.clients.automation else {
        return Err(Error::Auth {
            environment: ctx.environment.name.clone(),
            message: "automation resources require OAuth credentials".to_string(),
        });
    };

    // The configuration id is the remote id; upsert is idempotent on it.
    let id = string_property(properties, ID_PARAMETER).unwrap_or(&coordinate.config_id);
    let object = client
        .upsert(ctx.cancel, resource, id, payload)
        .await
        .map_err(|source| Error::Remote {
            coordinate: coordinate.clone(),
            source,
        })?;

    let entity_name = name
        .map(String::from)
        .unwrap_or_else(|| coordinate.config_id.clone());
    Ok(ResolvedEntity::deployed(
        coordinate.clone(),
        entity_name,
        properties.clone(),
        object.id,
    ))
}
