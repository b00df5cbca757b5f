//! Configuration records and the closed set of configuration families.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::coordinate::Coordinate;
use crate::parameter::{Parameter, PropertyReference};

/// The four configuration families.
///
/// This is a deliberately closed set; each family has exactly one backend
/// adapter. Adding a family is a change to the core, not an extension point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "camelCase")]
pub enum ConfigType {
    /// Name-keyed classic REST API.
    ClassicApi {
        /// The API id in the catalog, e.g. `dashboard`.
        api: String,
    },
    /// Id-keyed settings 2.0 schema.
    Settings {
        /// The schema id, e.g. `builtin:alerting.profiles`.
        schema: String,
        /// Schema version constraint, if any.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        schema_version: Option<String>,
    },
    /// Id-keyed automation resource; requires OAuth.
    Automation {
        /// The concrete automation resource kind.
        resource: AutomationResource,
    },
    /// Name-keyed Grail bucket; requires OAuth.
    Bucket,
}

impl ConfigType {
    /// The type id as it appears in coordinates and delete files.
    #[must_use]
    pub fn type_id(&self) -> &str {
        match self {
            Self::ClassicApi { api } => api,
            Self::Settings { schema, .. } => schema,
            Self::Automation { resource } => resource.type_id(),
            Self::Bucket => "bucket",
        }
    }

    /// True for the classic API family.
    #[must_use]
    pub const fn is_classic(&self) -> bool {
        matches!(self, Self::ClassicApi { .. })
    }

    /// True for families that can only be deployed with OAuth credentials.
    #[must_use]
    pub const fn requires_oauth(&self) -> bool {
        matches!(self, Self::Automation { .. } | Self::Bucket)
    }
}

/// The automation resource kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AutomationResource {
    /// Automation workflows.
    Workflow,
    /// Business calendars.
    BusinessCalendar,
    /// Scheduling rules.
    SchedulingRule,
}

impl AutomationResource {
    /// All automation resource kinds.
    pub const ALL: [Self; 3] = [Self::Workflow, Self::BusinessCalendar, Self::SchedulingRule];

    /// The type id as it appears in coordinates and delete files.
    #[must_use]
    pub const fn type_id(self) -> &'static str {
        match self {
            Self::Workflow => "workflow",
            Self::BusinessCalendar => "business-calendar",
            Self::SchedulingRule => "scheduling-rule",
        }
    }

    /// The remote resource path segment.
    #[must_use]
    pub const fn resource_path(self) -> &'static str {
        match self {
            Self::Workflow => "workflows",
            Self::BusinessCalendar => "business-calendars",
            Self::SchedulingRule => "scheduling-rules",
        }
    }

    /// Parses a type id back into a resource kind.
    #[must_use]
    pub fn from_type_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.type_id() == id)
    }
}

/// A single loaded configuration, bound to one environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Identity of this configuration.
    pub coordinate: Coordinate,
    /// The configuration family.
    pub config_type: ConfigType,
    /// Named parameters. The names `name`, `id` and `scope` are reserved.
    pub parameters: BTreeMap<String, Parameter>,
    /// The payload template with `{{ .param }}` placeholders.
    pub template: String,
    /// Name of the environment this instance targets.
    pub environment: String,
    /// Group of the target environment.
    pub group: String,
    /// True if this configuration must not be deployed.
    pub skip: bool,
    /// Source file the configuration was loaded from, for diagnostics.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_file: Option<PathBuf>,
}

impl Config {
    /// Returns the distinct references of all parameters, excluding
    /// intra-config references (those targeting this configuration itself).
    #[must_use]
    pub fn external_references(&self) -> BTreeSet<PropertyReference> {
        self.parameters
            .values()
            .flat_map(Parameter::references)
            .filter(|reference| reference.coordinate != self.coordinate)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameter::Parameter;

    fn config_with(parameters: BTreeMap<String, Parameter>) -> Config {
        Config {
            coordinate: Coordinate::new("p", "dashboard", "d"),
            config_type: ConfigType::ClassicApi {
                api: "dashboard".into(),
            },
            parameters,
            template: "{}".into(),
            environment: "dev".into(),
            group: "default".into(),
            skip: false,
            original_file: None,
        }
    }

    #[test]
    fn type_ids_cover_all_families() {
        assert_eq!(
            ConfigType::ClassicApi {
                api: "dashboard".into()
            }
            .type_id(),
            "dashboard"
        );
        assert_eq!(
            ConfigType::Settings {
                schema: "builtin:tags.auto-tagging".into(),
                schema_version: None,
            }
            .type_id(),
            "builtin:tags.auto-tagging"
        );
        assert_eq!(
            ConfigType::Automation {
                resource: AutomationResource::Workflow
            }
            .type_id(),
            "workflow"
        );
        assert_eq!(ConfigType::Bucket.type_id(), "bucket");
    }

    #[test]
    fn oauth_requirement_matches_families() {
        assert!(ConfigType::Bucket.requires_oauth());
        assert!(ConfigType::Automation {
            resource: AutomationResource::SchedulingRule
        }
        .requires_oauth());
        assert!(!ConfigType::ClassicApi {
            api: "dashboard".into()
        }
        .requires_oauth());
    }

    #[test]
    fn automation_resource_round_trips_type_id() {
        for resource in AutomationResource::ALL {
            assert_eq!(
                AutomationResource::from_type_id(resource.type_id()),
                Some(resource)
            );
        }
        assert_eq!(AutomationResource::from_type_id("dashboard"), None);
    }

    #[test]
    fn external_references_exclude_intra_config_targets() {
        let own = Coordinate::new("p", "dashboard", "d");
        let other = Coordinate::new("p", "management-zone", "z");
        let mut parameters = BTreeMap::new();
        parameters.insert("zone".to_string(), Parameter::reference(other.clone(), "id"));
        parameters.insert("self".to_string(), Parameter::reference(own, "zone"));

        let config = config_with(parameters);
        let refs = config.external_references();
        assert_eq!(refs.len(), 1);
        assert_eq!(refs.iter().next().unwrap().coordinate, other);
    }
}
