//! Adapter for id-keyed settings 2.0 objects.

use std::collections::BTreeMap;

use serde_json::Value;

use monaco_client::types::SettingsUpsert;
use monaco_core::config::Config;
use monaco_core::entity::ResolvedEntity;
use monaco_core::externalid;
use monaco_core::featureflags;
use monaco_core::parameter::SCOPE_PARAMETER;

use super::{AdapterContext, string_property};
use crate::error::{Error, Result};

/// Schema whose objects migrated from the numeric-id management-zone API.
const MANAGEMENT_ZONES_SCHEMA: &str = "builtin:management-zones";

/// Default scope for objects that do not target a specific entity.
const ENVIRONMENT_SCOPE: &str = "environment";

pub(crate) async fn upsert(
    ctx: AdapterContext<'_>,
    config: &Config,
    schema: &str,
    schema_version: Option<&str>,
    name: Option<&str>,
    payload: &str,
    properties: &BTreeMap<String, Value>,
) -> Result<ResolvedEntity> {
    let coordinate = &config.coordinate;
    let value: Value = serde_json::from_str(payload).map_err(|e| Error::InvalidPayload {
        coordinate: coordinate.clone(),
        message: format!("settings payload is not valid JSON: {e}"),
    })?;

    let external_id =
        externalid::settings_external_id(&coordinate.project, schema, &coordinate.config_id);
    let scope = string_property(properties, SCOPE_PARAMETER)
        .unwrap_or(ENVIRONMENT_SCOPE)
        .to_string();

    let object = ctx
        .clients
        .settings
        .upsert(
            ctx.cancel,
            SettingsUpsert {
                schema_id: schema.to_string(),
                schema_version: schema_version.map(String::from),
                external_id: external_id.clone(),
                scope: scope.clone(),
                value,
            },
        )
        .await
        .map_err(|source| Error::Remote {
            coordinate: coordinate.clone(),
            source,
        })?;

    // Management zones are addressed by their resolved numeric id when the
    // flag is on; every other schema exposes the object id.
    let id = if schema == MANAGEMENT_ZONES_SCHEMA
        && featureflags::MANAGEMENT_ZONE_NUMERIC_IDS.enabled()
    {
        object.legacy_id.clone().unwrap_or_else(|| object.object_id.clone())
    } else {
        object.object_id.clone()
    };

    let entity_name = name
        .map(String::from)
        .unwrap_or_else(|| coordinate.config_id.clone());
    let mut entity_properties = properties.clone();
    entity_properties.insert("objectId".to_string(), Value::String(object.object_id));
    entity_properties.insert("externalId".to_string(), Value::String(external_id));
    entity_properties.insert(SCOPE_PARAMETER.to_string(), Value::String(scope));
    Ok(ResolvedEntity::deployed(
        coordinate.clone(),
        entity_name,
        entity_properties,
        id,
    ))
}
