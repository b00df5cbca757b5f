//! Deletion of settings 2.0 objects.

use std::sync::Arc;

use tracing::{debug, info};

use monaco_client::settings::SettingsClient;
use monaco_core::externalid;
use tokio_util::sync::CancellationToken;

use super::pointer::DeletePointer;
use crate::error::{Error, Result};

pub(crate) async fn delete(
    cancel: &CancellationToken,
    client: &Arc<dyn SettingsClient>,
    schema: &str,
    pointers: &[DeletePointer],
) -> Result<()> {
    let objects = client
        .list(cancel, Some(schema))
        .await
        .map_err(|source| Error::Delete {
            config_type: schema.to_string(),
            identifier: "*".to_string(),
            source,
        })?;

    let mut errors = Vec::new();
    for pointer in pointers {
        let Some(coordinate) = pointer.coordinate() else {
            errors.push(Error::load(format!(
                "cannot delete settings object of schema '{schema}': a configId is required"
            )));
            continue;
        };
        let external_id = externalid::settings_external_id(
            &coordinate.project,
            schema,
            &coordinate.config_id,
        );
        let matches: Vec<_> = objects
            .iter()
            .filter(|object| object.external_id.as_deref() == Some(external_id.as_str()))
            .collect();
        if matches.is_empty() {
            info!(
                config_type = schema,
                identifier = %pointer.identifier(),
                "no settings object found to delete"
            );
            continue;
        }
        for object in matches {
            match client.delete(cancel, &object.object_id).await {
                Ok(()) => {}
                Err(error) if error.is_not_found() => {
                    debug!(object_id = object.object_id.as_str(), "already deleted");
                }
                Err(source) => errors.push(Error::Delete {
                    config_type: schema.to_string(),
                    identifier: pointer.identifier(),
                    source,
                }),
            }
        }
    }
    Error::aggregate(errors)
}

pub(crate) async fn delete_all(
    cancel: &CancellationToken,
    client: &Arc<dyn SettingsClient>,
) -> Result<()> {
    let objects = client
        .list(cancel, None)
        .await
        .map_err(|source| Error::Delete {
            config_type: "settings".to_string(),
            identifier: "*".to_string(),
            source,
        })?;

    let mut errors = Vec::new();
    for object in objects {
        match client.delete(cancel, &object.object_id).await {
            Ok(()) => {}
            Err(error) if error.is_not_found() => {}
            Err(source) => errors.push(Error::Delete {
                config_type: object.schema_id.clone(),
                identifier: object.object_id.clone(),
                source,
            }),
        }
    }
    Error::aggregate(errors)
}
