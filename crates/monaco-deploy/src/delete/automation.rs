//! Deletion of automation resources.

use std::sync::Arc;

use tracing::debug;

use monaco_client::automation::AutomationClient;
use monaco_core::config::AutomationResource;
use tokio_util::sync::CancellationToken;

use super::pointer::DeletePointer;
use crate::error::{Error, Result};

pub(crate) async fn delete(
    cancel: &CancellationToken,
    client: &Arc<dyn AutomationClient>,
    resource: AutomationResource,
    pointers: &[DeletePointer],
) -> Result<()> {
    let mut errors = Vec::new();
    for pointer in pointers {
        let Some(id) = &pointer.config_id else {
            errors.push(Error::load(format!(
                "cannot delete {}: an id is required",
                resource.type_id()
            )));
            continue;
        };
        match client.delete(cancel, resource, id).await {
            Ok(()) => {}
            Err(error) if error.is_not_found() => {
                // Deleting something that is already gone is not an error.
                debug!(config_type = resource.type_id(), id = id.as_str(), "nothing to delete");
            }
            Err(source) => errors.push(Error::Delete {
                config_type: resource.type_id().to_string(),
                identifier: id.clone(),
                source,
            }),
        }
    }
    Error::aggregate(errors)
}

pub(crate) async fn delete_all(
    cancel: &CancellationToken,
    client: &Arc<dyn AutomationClient>,
) -> Result<()> {
    let mut errors = Vec::new();
    for resource in AutomationResource::ALL {
        let objects = match client.list(cancel, resource).await {
            Ok(objects) => objects,
            Err(source) => {
                errors.push(Error::Delete {
                    config_type: resource.type_id().to_string(),
                    identifier: "*".to_string(),
                    source,
                });
                continue;
            }
        };
        for object in objects {
            match client.delete(cancel, resource, &object.id).await {
                Ok(()) => {}
                Err(error) if error.is_not_found() => {}
                Err(source) => errors.push(Error::Delete {
                    config_type: resource.type_id().to_string(),
                    identifier: object.id.clone(),
                    source,
                }),
            }
        }
    }
    Error::aggregate(errors)
}
