//! The deletion planner & executor.
//!
//! Consumes a parsed delete file (pointers grouped by type) and removes the
//! identified objects from an environment, honoring per-family identity
//! rules. Deletion is a separate, explicit operation; deploy never invokes
//! it.
//!
//! Hard rules enforced here:
//!
//! - `dashboard-share-settings` objects are never deleted; they go away with
//!   their owning dashboard.
//! - Automation and bucket groups without a client are skipped with a
//!   warning, never an error.
//! - Per-group errors are counted; the operation returns one aggregated
//!   error carrying the count.

mod automation;
mod bucket;
mod classic;
mod pointer;
mod settings;

pub use pointer::{DeleteEntries, DeletePointer};

use tokio_util::sync::CancellationToken;
use tracing::{Instrument, error, warn};

use monaco_core::api::{ApiCatalog, DASHBOARD_SHARE_SETTINGS};
use monaco_core::config::AutomationResource;
use monaco_core::observability::delete_span;

use crate::clients::ClientSet;
use crate::error::{Error, Result};

/// Removes all pointed-at configurations from the environment the clients
/// connect to.
///
/// # Errors
///
/// Returns one [`Error::Aggregate`] whose message carries the number of
/// groups that failed; individual failures are logged as they occur.
pub async fn delete_configs(
    cancel: &CancellationToken,
    environment: &str,
    clients: &ClientSet,
    catalog: &ApiCatalog,
    entries: &DeleteEntries,
) -> Result<()> {
    let mut failed_groups = Vec::new();

    for (entry_type, pointers) in entries {
        let span = delete_span(environment, entry_type);

        if entry_type == DASHBOARD_SHARE_SETTINGS {
            span.in_scope(|| {
                warn!(
                    "classic config of type {DASHBOARD_SHARE_SETTINGS} cannot be deleted; \
                     remove the associated dashboard instead"
                );
            });
            continue;
        }

        let result = if let Some(api) = catalog.get(entry_type) {
            classic::delete(cancel, &clients.classic, api, pointers)
                .instrument(span.clone())
                .await
        } else if let Some(resource) = AutomationResource::from_type_id(entry_type) {
            match &clients.automation {
                None => {
                    span.in_scope(|| {
                        warn!(
                            count = pointers.len(),
                            "skipped deletion of automation configurations: API client unavailable"
                        );
                    });
                    continue;
                }
                Some(client) => automation::delete(cancel, client, resource, pointers)
                    .instrument(span.clone())
                    .await,
            }
        } else if entry_type == "bucket" {
            match &clients.buckets {
                None => {
                    span.in_scope(|| {
                        warn!(
                            count = pointers.len(),
                            "skipped deletion of Grail bucket configurations: API client unavailable"
                        );
                    });
                    continue;
                }
                Some(client) => bucket::delete(cancel, client, pointers)
                    .instrument(span.clone())
                    .await,
            }
        } else {
            // Everything else is assumed to be a settings schema.
            settings::delete(cancel, &clients.settings, entry_type, pointers)
                .instrument(span.clone())
                .await
        };

        if let Err(group_error) = result {
            span.in_scope(|| error!(error = %group_error, "error during deletion"));
            failed_groups.push(group_error);
        }
    }

    Error::aggregate(failed_groups)
}

/// Collects and deletes ALL configuration objects reachable through the
/// client set, subject to the same skip rules as [`delete_configs`].
///
/// Intended for test-environment cleanup; never invoked implicitly.
///
/// # Errors
///
/// Returns one [`Error::Aggregate`] carrying the number of failed sections.
pub async fn delete_all(
    cancel: &CancellationToken,
    clients: &ClientSet,
    catalog: &ApiCatalog,
) -> Result<()> {
    let mut failed = Vec::new();

    if let Err(e) = classic::delete_all(cancel, &clients.classic, catalog.iter()).await {
        error!(error = %e, "failed to delete all classic API configurations");
        failed.push(e);
    }

    if let Err(e) = settings::delete_all(cancel, &clients.settings).await {
        error!(error = %e, "failed to delete all settings 2.0 objects");
        failed.push(e);
    }

    match &clients.automation {
        None => warn!("skipped deletion of automation configurations: API client unavailable"),
        Some(client) => {
            if let Err(e) = automation::delete_all(cancel, client).await {
                error!(error = %e, "failed to delete all automation configurations");
                failed.push(e);
            }
        }
    }

    match &clients.buckets {
        None => warn!("skipped deletion of Grail bucket configurations: API client unavailable"),
        Some(client) => {
            if let Err(e) = bucket::delete_all(cancel, client).await {
                error!(error = %e, "failed to delete all Grail bucket configurations");
                failed.push(e);
            }
        }
    }

    Error::aggregate(failed)
}
