//! Adapter for name-keyed classic configuration APIs.

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::warn;

use monaco_client::retry::{RetryPolicy, retry_idempotent};
use monaco_client::types::RemoteObject;
use monaco_core::config::Config;
use monaco_core::entity::ResolvedEntity;
use monaco_core::externalid;
use monaco_core::parameter::{ID_PARAMETER, SCOPE_PARAMETER};

use super::{AdapterContext, string_property};
use crate::error::{Error, Result};

pub(crate) async fn upsert(
    ctx: AdapterContext<'_>,
    config: &Config,
    api: &str,
    name: Option<&str>,
    payload: &str,
    properties: &BTreeMap<String, Value>,
) -> Result<ResolvedEntity> {
    let coordinate = &config.coordinate;
    let Some(entry) = ctx.catalog.get(api) else {
        return Err(Error::UnknownApi {
            coordinate: coordinate.clone(),
            api: api.to_string(),
        });
    };
    if let Some(replacement) = &entry.deprecated_by {
        warn!(
            environment = ctx.environment.name.as_str(),
            coordinate = %coordinate,
            config_type = api,
            "API '{api}' is deprecated, use '{replacement}' instead"
        );
    }

    // Sub-path APIs live under a parent object whose id fills {SCOPE}.
    let entry = if entry.has_parent() {
        let Some(scope) = string_property(properties, SCOPE_PARAMETER) else {
            return Err(Error::MissingScope {
                coordinate: coordinate.clone(),
                api: api.to_string(),
            });
        };
        entry.resolve(scope)
    } else {
        entry.clone()
    };

    let client = &ctx.clients.classic;
    let object = if entry.single_configuration {
        retry_idempotent(RetryPolicy::default(), ctx.cancel, "update_single", || {
            client.update_single(ctx.cancel, &entry, payload)
        })
        .await
        .map_err(|source| Error::Remote {
            coordinate: coordinate.clone(),
            source,
        })?
    } else if entry.non_unique_name {
        // Identity is a deterministic UUID derived from the coordinate, or
        // an explicit id override.
        let id = string_property(properties, ID_PARAMETER)
            .map_or_else(|| externalid::non_unique_name_id(coordinate), String::from);
        retry_idempotent(RetryPolicy::default(), ctx.cancel, "update", || {
            client.update(ctx.cancel, &entry, &id, payload)
        })
        .await
        .map_err(|source| Error::Remote {
            coordinate: coordinate.clone(),
            source,
        })?
    } else {
        let name = name.ok_or_else(|| Error::MissingName {
            coordinate: coordinate.clone(),
        })?;
        let existing = retry_idempotent(RetryPolicy::default(), ctx.cancel, "list", || {
            client.list(ctx.cancel, &entry)
        })
        .await
        .map_err(|source| Error::Remote {
            coordinate: coordinate.clone(),
            source,
        })?;

        let matches: Vec<&RemoteObject> = existing
            .iter()
            .filter(|object| object.name.as_deref() == Some(name))
            .collect();
        match matches.as_slice() {
            [] => client
                .create(ctx.cancel, &entry, payload)
                .await
                .map_err(|source| Error::Remote {
                    coordinate: coordinate.clone(),
                    source,
                })?,
            [found] => {
                let id = found.id.clone();
                retry_idempotent(RetryPolicy::default(), ctx.cancel, "update", || {
                    client.update(ctx.cancel, &entry, &id, payload)
                })
                .await
                .map_err(|source| Error::Remote {
                    coordinate: coordinate.clone(),
                    source,
                })?
            }
            many => {
                return Err(Error::AmbiguousName {
                    coordinate: coordinate.clone(),
                    api: api.to_string(),
                    name: name.to_string(),
                    matches: many.len(),
                });
            }
        }
    };

    let entity_name = object
        .name
        .clone()
        .or_else(|| name.map(String::from))
        .unwrap_or_else(|| coordinate.config_id.clone());
    let mut entity_properties: BTreeMap<String, Value> =
        object.properties.clone().into_iter().collect();
    entity_properties.extend(properties.clone());
    Ok(ResolvedEntity::deployed(
        coordinate.clone(),
        entity_name,
        entity_properties,
        object.id,
    ))
}
