//! The classic API catalog.
//!
//! A process-wide, read-only table describing every classic configuration
//! endpoint: its URL path, identity policy, deprecation, and special-case
//! handling. The table is constructed once per run via [`ApiCatalog::standard`]
//! and injected wherever needed, rather than accessed as a true global.

use std::collections::BTreeMap;

use crate::featureflags::{self, FeatureFlag};

/// Default property carrying the list payload of a get-all response.
pub const STANDARD_GET_ALL_PROPERTY: &str = "values";

/// Classic type that is never deleted directly; owned by its dashboard.
pub const DASHBOARD_SHARE_SETTINGS: &str = "dashboard-share-settings";

/// Post-fetch transform applied to downloaded payloads.
pub type TweakResponseFn = fn(&mut serde_json::Value);

/// Definition of one classic configuration endpoint.
#[derive(Debug, Clone)]
pub struct Api {
    /// Stable type id, e.g. `dashboard`.
    pub id: String,
    /// URL path under the environment base URL. May contain a `{SCOPE}`
    /// placeholder for sub-path APIs.
    pub url_path: String,
    /// Property of the get-all response that carries the value list.
    pub property_name_of_get_all_response: String,
    /// Environment-global singleton setting: upsert only, never deleted.
    pub single_configuration: bool,
    /// The name cannot be used as identity for this API.
    pub non_unique_name: bool,
    /// Type id of the API replacing this one, if deprecated.
    pub deprecated_by: Option<String>,
    /// The API cannot be meaningfully downloaded and re-uploaded.
    pub skip_download: bool,
    /// Optional post-fetch payload transform.
    pub tweak_response: Option<TweakResponseFn>,
    /// For sub-path APIs: the type id of the parent API whose object id
    /// fills `{SCOPE}`.
    pub parent: Option<String>,
    /// Feature flags that must all be enabled for this API to be usable.
    pub required_feature_flags: Vec<FeatureFlag>,
}

impl Api {
    /// Creates a new API definition with standard defaults.
    #[must_use]
    pub fn new(id: impl Into<String>, url_path: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url_path: url_path.into(),
            property_name_of_get_all_response: STANDARD_GET_ALL_PROPERTY.to_string(),
            single_configuration: false,
            non_unique_name: false,
            deprecated_by: None,
            skip_download: false,
            tweak_response: None,
            parent: None,
            required_feature_flags: Vec::new(),
        }
    }

    /// Overrides the get-all response property.
    #[must_use]
    pub fn with_get_all_property(mut self, property: impl Into<String>) -> Self {
        self.property_name_of_get_all_response = property.into();
        self
    }

    /// Marks the API as an environment-global singleton.
    #[must_use]
    pub const fn single_configuration(mut self) -> Self {
        self.single_configuration = true;
        self
    }

    /// Marks names as non-unique for this API.
    #[must_use]
    pub const fn non_unique_name(mut self) -> Self {
        self.non_unique_name = true;
        self
    }

    /// Records the API deprecating this one.
    #[must_use]
    pub fn deprecated_by(mut self, replacement: impl Into<String>) -> Self {
        self.deprecated_by = Some(replacement.into());
        self
    }

    /// Excludes the API from download.
    #[must_use]
    pub const fn skip_download(mut self) -> Self {
        self.skip_download = true;
        self
    }

    /// Registers a post-fetch payload transform.
    #[must_use]
    pub fn tweak_response(mut self, f: TweakResponseFn) -> Self {
        self.tweak_response = Some(f);
        self
    }

    /// Declares this API a sub-path API under the given parent type.
    #[must_use]
    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Requires feature flags for this API to be usable.
    #[must_use]
    pub fn requires_feature_flags(mut self, flags: Vec<FeatureFlag>) -> Self {
        self.required_feature_flags = flags;
        self
    }

    /// Returns the full URL of this API under an environment base URL.
    #[must_use]
    pub fn create_url(&self, environment_url: &str) -> String {
        format!("{}{}", environment_url.trim_end_matches('/'), self.url_path)
    }

    /// True if this API is parented under another API.
    #[must_use]
    pub const fn has_parent(&self) -> bool {
        self.parent.is_some()
    }

    /// True if the get-all response uses the standard `values` property.
    #[must_use]
    pub fn is_standard(&self) -> bool {
        self.property_name_of_get_all_response == STANDARD_GET_ALL_PROPERTY
    }

    /// Returns a copy with `{SCOPE}` substituted by the given value.
    ///
    /// Used when a sub-path API is addressed under a concrete parent object,
    /// e.g. key user actions under a specific mobile application.
    #[must_use]
    pub fn resolve(&self, scope: &str) -> Self {
        let mut resolved = self.clone();
        resolved.url_path = self.url_path.replace("{SCOPE}", scope);
        resolved
    }

    /// True if all required feature flags are enabled.
    #[must_use]
    pub fn available(&self) -> bool {
        self.required_feature_flags.iter().all(FeatureFlag::enabled)
    }
}

/// The table of all known classic APIs, keyed by type id.
#[derive(Debug, Clone, Default)]
pub struct ApiCatalog {
    apis: BTreeMap<String, Api>,
}

impl ApiCatalog {
    /// Creates an empty catalog. Mostly useful in tests.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the standard catalog of well-known classic endpoints.
    ///
    /// APIs whose required feature flags are disabled are filtered out.
    #[must_use]
    pub fn standard() -> Self {
        let mut catalog = Self::new();
        for api in standard_apis() {
            if api.available() {
                catalog.insert(api);
            }
        }
        catalog
    }

    /// Inserts an API definition, replacing any previous one with the same id.
    pub fn insert(&mut self, api: Api) {
        self.apis.insert(api.id.clone(), api);
    }

    /// Looks up an API by type id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Api> {
        self.apis.get(id)
    }

    /// True if the catalog knows the given type id.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.apis.contains_key(id)
    }

    /// Iterates over all APIs in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Api> {
        self.apis.values()
    }

    /// Number of APIs in the catalog.
    #[must_use]
    pub fn len(&self) -> usize {
        self.apis.len()
    }

    /// True if the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.apis.is_empty()
    }
}

fn remove_dashboard_metadata(payload: &mut serde_json::Value) {
    if let Some(object) = payload.as_object_mut() {
        object.remove("metadata");
        if let Some(dashboard_metadata) = object
            .get_mut("dashboardMetadata")
            .and_then(serde_json::Value::as_object_mut)
        {
            dashboard_metadata.remove("owner");
        }
    }
}

fn remove_synthetic_entity_id(payload: &mut serde_json::Value) {
    if let Some(object) = payload.as_object_mut() {
        object.remove("entityId");
    }
}

fn standard_apis() -> Vec<Api> {
    vec![
        Api::new("alerting-profile", "/api/config/v1/alertingProfiles")
            .deprecated_by("builtin:alerting.profile"),
        Api::new("auto-tag", "/api/config/v1/autoTags")
            .deprecated_by("builtin:tags.auto-tagging"),
        Api::new("dashboard", "/api/config/v1/dashboards")
            .with_get_all_property("dashboards")
            .tweak_response(remove_dashboard_metadata),
        Api::new(
            DASHBOARD_SHARE_SETTINGS,
            "/api/config/v1/dashboards/{SCOPE}/shareSettings",
        )
        .with_parent("dashboard")
        .non_unique_name()
        .single_configuration(),
        Api::new("management-zone", "/api/config/v1/managementZones")
            .deprecated_by("builtin:management-zones"),
        Api::new("notification", "/api/config/v1/notifications")
            .deprecated_by("builtin:problem.notifications"),
        Api::new("request-naming-service", "/api/config/v1/service/requestNaming")
            .non_unique_name(),
        Api::new("synthetic-location", "/api/v1/synthetic/locations")
            .with_get_all_property("locations")
            .skip_download()
            .tweak_response(remove_synthetic_entity_id),
        Api::new("synthetic-monitor", "/api/v1/synthetic/monitors")
            .with_get_all_property("monitors"),
        Api::new("mobile-application", "/api/config/v1/applications/mobile"),
        Api::new(
            "key-user-actions-mobile",
            "/api/config/v1/applications/mobile/{SCOPE}/keyUserActions",
        )
        .with_parent("mobile-application")
        .with_get_all_property("keyUserActions")
        .non_unique_name(),
        Api::new("app-detection-rule", "/api/config/v1/applicationDetectionRules")
            .non_unique_name(),
        Api::new(
            "service-detection-full-web-request",
            "/api/config/v1/service/detectionRules/FULL_WEB_REQUEST",
        ),
        Api::new("extension", "/api/config/v1/extensions").skip_download(),
        Api::new(
            "frequent-issue-detection",
            "/api/config/v1/frequentIssueDetection",
        )
        .single_configuration(),
        Api::new("data-privacy", "/api/config/v1/dataPrivacy").single_configuration(),
        Api::new("hosts-auto-update", "/api/config/v1/hosts/autoupdate")
            .single_configuration(),
        Api::new("calculated-metrics-log", "/api/config/v1/calculatedMetrics/log"),
        Api::new("entity-type", "/api/v2/entityTypes")
            .skip_download()
            .requires_feature_flags(vec![featureflags::ENTITIES]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn standard_catalog_contains_well_known_apis() {
        let catalog = ApiCatalog::standard();
        assert!(catalog.contains("dashboard"));
        assert!(catalog.contains("alerting-profile"));
        assert!(catalog.contains(DASHBOARD_SHARE_SETTINGS));
        assert!(!catalog.contains("workflow"));
        assert!(!catalog.contains("bucket"));
    }

    #[test]
    fn feature_flagged_apis_are_filtered_when_disabled() {
        // MONACO_FEAT_ENTITIES defaults to off.
        let catalog = ApiCatalog::standard();
        assert!(!catalog.contains("entity-type"));
    }

    #[test]
    fn resolve_substitutes_scope_placeholder() {
        let catalog = ApiCatalog::standard();
        let api = catalog.get("key-user-actions-mobile").unwrap();
        assert!(api.has_parent());
        assert_eq!(api.parent.as_deref(), Some("mobile-application"));

        let resolved = api.resolve("MOBILE_APPLICATION-1234");
        assert_eq!(
            resolved.url_path,
            "/api/config/v1/applications/mobile/MOBILE_APPLICATION-1234/keyUserActions"
        );
        // The original entry is unchanged.
        assert!(api.url_path.contains("{SCOPE}"));
    }

    #[test]
    fn create_url_joins_base_and_path() {
        let api = Api::new("dashboard", "/api/config/v1/dashboards");
        assert_eq!(
            api.create_url("https://tenant.example.com/"),
            "https://tenant.example.com/api/config/v1/dashboards"
        );
    }

    #[test]
    fn is_standard_reflects_get_all_property() {
        let catalog = ApiCatalog::standard();
        assert!(catalog.get("alerting-profile").unwrap().is_standard());
        assert!(!catalog.get("synthetic-location").unwrap().is_standard());
    }

    #[test]
    fn deprecation_chain_points_at_settings_schema() {
        let catalog = ApiCatalog::standard();
        assert_eq!(
            catalog.get("management-zone").unwrap().deprecated_by.as_deref(),
            Some("builtin:management-zones")
        );
    }

    #[test]
    fn dashboard_tweak_removes_metadata_and_owner() {
        let catalog = ApiCatalog::standard();
        let tweak = catalog.get("dashboard").unwrap().tweak_response.unwrap();
        let mut payload = json!({
            "metadata": {"clusterVersion": "1.290"},
            "dashboardMetadata": {"name": "board", "owner": "someone"},
            "tiles": []
        });
        tweak(&mut payload);
        assert!(payload.get("metadata").is_none());
        assert!(payload["dashboardMetadata"].get("owner").is_none());
        assert_eq!(payload["dashboardMetadata"]["name"], "board");
    }

    #[test]
    fn single_configuration_apis_are_marked() {
        let catalog = ApiCatalog::standard();
        assert!(catalog.get("data-privacy").unwrap().single_configuration);
        assert!(!catalog.get("dashboard").unwrap().single_configuration);
    }
}
