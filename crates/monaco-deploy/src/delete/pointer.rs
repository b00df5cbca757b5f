//! Delete pointers: typed references identifying objects to remove.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use monaco_core::coordinate::Coordinate;

/// A single entry of a delete file.
///
/// For classic families `name` identifies the object; for settings,
/// automation and bucket types an explicit `config_id` identifies the
/// source-side coordinate and the backend adapter maps it to the remote
/// object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletePointer {
    /// The configuration type, e.g. `dashboard` or `builtin:alerting.profile`.
    pub config_type: String,
    /// Object name, required for classic families.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Source-side configuration id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_id: Option<String>,
    /// Project the configuration was defined in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    /// Scope for sub-path APIs (the parent object's id).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

impl DeletePointer {
    /// Reconstructs the source coordinate of this pointer, using an empty
    /// project when none was recorded. Requires a `config_id`.
    #[must_use]
    pub fn coordinate(&self) -> Option<Coordinate> {
        self.config_id.as_ref().map(|config_id| {
            Coordinate::new(
                self.project.clone().unwrap_or_default(),
                self.config_type.clone(),
                config_id.clone(),
            )
        })
    }

    /// A human-readable identifier for log and error messages.
    #[must_use]
    pub fn identifier(&self) -> String {
        self.name
            .clone()
            .or_else(|| self.config_id.clone())
            .unwrap_or_else(|| "<unnamed>".to_string())
    }
}

/// A parsed delete file: pointers grouped by configuration type.
pub type DeleteEntries = BTreeMap<String, Vec<DeletePointer>>;
