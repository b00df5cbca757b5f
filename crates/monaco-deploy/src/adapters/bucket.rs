//! Adapter for name-keyed Grail buckets.

use monaco_core::config::Config;
use monaco_core::entity::ResolvedEntity;

use super::AdapterContext;
use crate::error::{Error, Result};

pub(crate) async fn upsert(
    ctx: AdapterContext<'_>,
    config: &Config,
    name: Option<&str>,
    payload: &str,
) -> Result<ResolvedEntity> {
    let coordinate = &config.coordinate;
    let Some(client) = &ctx.clients.buckets else {
        return Err(Error::Auth {
            environment: ctx.environment.name.clone(),
            message: "Grail buckets require OAuth credentials".to_string(),
        });
    };
    let name = name.ok_or_else(|| Error::MissingName {
        coordinate: coordinate.clone(),
    })?;

    let object = client
        .upsert(ctx.cancel, name, payload)
        .await
        .map_err(|source| Error::Remote {
            coordinate: coordinate.clone(),
            source,
        })?;

    Ok(ResolvedEntity::deployed(
        coordinate.clone(),
        object.bucket_name.clone(),
        std::collections::BTreeMap::new(),
        object.bucket_name,
    ))
}
