//! Deletion of Grail buckets.

use std::sync::Arc;

use tracing::{debug, info};

use monaco_client::bucket::BucketClient;
use tokio_util::sync::CancellationToken;

use super::pointer::DeletePointer;
use crate::error::{Error, Result};

pub(crate) async fn delete(
    cancel: &CancellationToken,
    client: &Arc<dyn BucketClient>,
    pointers: &[DeletePointer],
) -> Result<()> {
    let mut errors = Vec::new();
    for pointer in pointers {
        let Some(name) = pointer.name.as_ref().or(pointer.config_id.as_ref()) else {
            errors.push(Error::load(
                "cannot delete bucket: a name is required".to_string(),
            ));
            continue;
        };
        match client.delete(cancel, name).await {
            Ok(()) => {}
            Err(error) if error.is_not_found() => {
                info!(bucket = name.as_str(), "no bucket found to delete");
            }
            Err(source) => errors.push(Error::Delete {
                config_type: "bucket".to_string(),
                identifier: name.clone(),
                source,
            }),
        }
    }
    Error::aggregate(errors)
}

pub(crate) async fn delete_all(
    cancel: &CancellationToken,
    client: &Arc<dyn BucketClient>,
) -> Result<()> {
    let buckets = client.list(cancel).await.map_err(|source| Error::Delete {
        config_type: "bucket".to_string(),
        identifier: "*".to_string(),
        source,
    })?;

    let mut errors = Vec::new();
    for bucket in buckets {
        match client.delete(cancel, &bucket.bucket_name).await {
            Ok(()) => {}
            Err(error) if error.is_not_found() => {
                debug!(bucket = bucket.bucket_name.as_str(), "already deleted");
            }
            Err(source) => errors.push(Error::Delete {
                config_type: "bucket".to_string(),
                identifier: bucket.bucket_name.clone(),
                source,
            }),
        }
    }
    Error::aggregate(errors)
}
