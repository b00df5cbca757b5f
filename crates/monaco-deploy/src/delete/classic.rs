//! Deletion of classic API configurations.

use std::sync::Arc;

use tracing::{debug, info, warn};

use monaco_client::classic::ClassicClient;
use monaco_client::retry::{RetryPolicy, retry_idempotent};
use monaco_client::types::RemoteObject;
use monaco_core::api::Api;
use monaco_core::externalid;
use tokio_util::sync::CancellationToken;

use super::pointer::DeletePointer;
use crate::error::{Error, Result};

pub(crate) async fn delete(
    cancel: &CancellationToken,
    client: &Arc<dyn ClassicClient>,
    api: &Api,
    pointers: &[DeletePointer],
) -> Result<()> {
    if api.single_configuration {
        warn!(
            config_type = api.id.as_str(),
            "environment-global settings cannot be deleted, skipping"
        );
        return Ok(());
    }

    let mut errors = Vec::new();
    // Sub-path APIs need a scope per pointer; list inside the loop for them.
    let shared_listing = if api.has_parent() {
        None
    } else {
        match list(cancel, client, api).await {
            Ok(objects) => Some(objects),
            Err(error) => return Err(error),
        }
    };

    for pointer in pointers {
        let resolved;
        let (api, objects) = if api.has_parent() {
            let Some(scope) = &pointer.scope else {
                errors.push(Error::load(format!(
                    "cannot delete {} '{}': sub-path API requires a scope",
                    api.id,
                    pointer.identifier()
                )));
                continue;
            };
            resolved = api.resolve(scope);
            match list(cancel, client, &resolved).await {
                Ok(objects) => (&resolved, objects),
                Err(error) => {
                    errors.push(error);
                    continue;
                }
            }
        } else {
            (
                api,
                shared_listing.clone().expect("listed for non-sub-path API"),
            )
        };

        let matches = match_pointer(api, pointer, &objects, &mut errors);
        if matches.is_empty() {
            info!(
                config_type = api.id.as_str(),
                identifier = %pointer.identifier(),
                "no configuration found to delete"
            );
            continue;
        }
        for object in matches {
            match client.delete(cancel, api, &object.id).await {
                Ok(()) => {}
                Err(error) if error.is_not_found() => {
                    debug!(
                        config_type = api.id.as_str(),
                        id = object.id.as_str(),
                        "already deleted"
                    );
                }
                Err(source) => errors.push(Error::Delete {
                    config_type: api.id.clone(),
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
    client: &Arc<dyn ClassicClient>,
    apis: impl Iterator<Item = &Api>,
) -> Result<()> {
    let mut errors = Vec::new();
    for api in apis {
        // Singleton settings cannot be deleted; sub-path objects go away
        // with their parent.
        if api.single_configuration || api.has_parent() {
            continue;
        }
        let objects = match list(cancel, client, api).await {
            Ok(objects) => objects,
            Err(error) => {
                errors.push(error);
                continue;
            }
        };
        for object in objects {
            match client.delete(cancel, api, &object.id).await {
                Ok(()) => {}
                Err(error) if error.is_not_found() => {}
                Err(source) => errors.push(Error::Delete {
                    config_type: api.id.clone(),
                    identifier: object.id.clone(),
                    source,
                }),
            }
        }
    }
    Error::aggregate(errors)
}

async fn list(
    cancel: &CancellationToken,
    client: &Arc<dyn ClassicClient>,
    api: &Api,
) -> Result<Vec<RemoteObject>> {
    retry_idempotent(RetryPolicy::default(), cancel, "list", || {
        client.list(cancel, api)
    })
    .await
    .map_err(|source| Error::Delete {
        config_type: api.id.clone(),
        identifier: "*".to_string(),
        source,
    })
}

/// Selects the objects a pointer identifies: by deterministic id for
/// non-unique-name APIs, by name otherwise.
fn match_pointer<'a>(
    api: &Api,
    pointer: &DeletePointer,
    objects: &'a [RemoteObject],
    errors: &mut Vec<Error>,
) -> Vec<&'a RemoteObject> {
    if api.non_unique_name {
        let Some(coordinate) = pointer.coordinate() else {
            errors.push(Error::load(format!(
                "cannot delete {}: non-unique-name API requires a configId",
                api.id
            )));
            return Vec::new();
        };
        let id = externalid::non_unique_name_id(&coordinate);
        objects.iter().filter(|object| object.id == id).collect()
    } else {
        let Some(name) = &pointer.name else {
            errors.push(Error::load(format!(
                "cannot delete {}: classic API requires a name",
                api.id
            )));
            return Vec::new();
        };
        objects
            .iter()
            .filter(|object| object.name.as_deref() == Some(name))
            .collect()
    }
}
