//! Wire-level value shapes shared by all client contracts.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A remote object as returned by classic list and upsert calls.
///
/// Extra response fields are kept so downstream references can read
/// arbitrary properties of a deployed object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteObject {
    /// Remote object identifier.
    pub id: String,
    /// Human-readable name, absent for a few endpoints.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// All further response fields.
    #[serde(flatten)]
    pub properties: Map<String, Value>,
}

impl RemoteObject {
    /// Creates a remote object with id and name only.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: Some(name.into()),
            properties: Map::new(),
        }
    }
}

/// An upsert request for a settings 2.0 object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsUpsert {
    /// Schema id, e.g. `builtin:alerting.profile`.
    pub schema_id: String,
    /// Schema version constraint, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_version: Option<String>,
    /// Deterministic external id keying the upsert.
    pub external_id: String,
    /// Scope the object lives in, e.g. `environment` or an entity id.
    pub scope: String,
    /// The settings value payload.
    pub value: Value,
}

/// A settings 2.0 object as returned by upsert and list calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsObject {
    /// Canonical object id assigned by the backend.
    pub object_id: String,
    /// External id the object was keyed on, if stored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    /// Schema the object belongs to.
    pub schema_id: String,
    /// Scope the object lives in.
    pub scope: String,
    /// Numeric legacy id, present for schemas that migrated a classic API
    /// (notably `builtin:management-zones`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legacy_id: Option<String>,
}

/// An automation resource object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutomationObject {
    /// Remote id; for upserts this equals the client-supplied id.
    pub id: String,
}

/// A Grail bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketObject {
    /// Bucket name; the identity of the bucket.
    pub bucket_name: String,
    /// Lifecycle status reported by the backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn remote_object_keeps_extra_fields() {
        let parsed: RemoteObject = serde_json::from_value(json!({
            "id": "abc",
            "name": "My Dashboard",
            "owner": "someone",
        }))
        .unwrap();
        assert_eq!(parsed.id, "abc");
        assert_eq!(parsed.properties.get("owner"), Some(&json!("someone")));
    }

    #[test]
    fn settings_object_serializes_camel_case() {
        let object = SettingsObject {
            object_id: "obj-1".into(),
            external_id: Some("ext".into()),
            schema_id: "builtin:x".into(),
            scope: "environment".into(),
            legacy_id: None,
        };
        let value = serde_json::to_value(&object).unwrap();
        assert_eq!(value["objectId"], "obj-1");
        assert_eq!(value["schemaId"], "builtin:x");
        assert!(value.get("legacyId").is_none());
    }
}
