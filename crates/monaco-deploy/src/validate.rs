//! Pre-deploy validation of classic configuration names.
//!
//! Classic configurations are identified by name, so two configurations of
//! the same API resolving to the same name in one environment would silently
//! overwrite each other. The validator resolves every name that does not
//! depend on deployed entities (literals, environment variables, compounds
//! over them) and rejects duplicates before any HTTP call. Names built from
//! references only materialize during deployment and are left to the remote.

use std::collections::{BTreeMap, HashMap};

use serde_json::Value;

use monaco_core::api::ApiCatalog;
use monaco_core::config::{Config, ConfigType};
use monaco_core::coordinate::Coordinate;
use monaco_core::entity::EntityMap;
use monaco_core::parameter::{EnvResolver, NAME_PARAMETER, ProcessEnv, ResolveContext};

use crate::error::Error;

type EnvironmentName = String;
type ClassicEndpoint = String;

/// Checks that each classic API name is used at most once per environment.
#[derive(Debug, Default)]
pub struct UniqueNameValidator {
    seen: HashMap<(EnvironmentName, ClassicEndpoint), Vec<(Coordinate, String)>>,
}

impl UniqueNameValidator {
    /// Creates an empty validator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates one configuration, remembering its name for later checks.
    ///
    /// Resolves the `name` parameter against the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateName`] when another configuration of the
    /// same API and environment already claimed the name.
    pub fn validate(&mut self, catalog: &ApiCatalog, config: &Config) -> Result<(), Error> {
        self.validate_with_env(catalog, config, &ProcessEnv)
    }

    /// Like [`UniqueNameValidator::validate`], with an explicit environment
    /// variable source.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateName`] when another configuration of the
    /// same API and environment already claimed the name.
    pub fn validate_with_env(
        &mut self,
        catalog: &ApiCatalog,
        config: &Config,
        env: &dyn EnvResolver,
    ) -> Result<(), Error> {
        let ConfigType::ClassicApi { api } = &config.config_type else {
            return Ok(());
        };
        if catalog.get(api).is_some_and(|entry| entry.non_unique_name) {
            return Ok(());
        }
        let Some(name) = resolved_name(config, env) else {
            return Ok(());
        };

        let key = (config.environment.clone(), api.clone());
        let names = self.seen.entry(key).or_default();
        if let Some((first, _)) = names.iter().find(|(_, existing)| *existing == name) {
            return Err(Error::DuplicateName {
                api: api.clone(),
                name,
                first: first.clone(),
                second: config.coordinate.clone(),
            });
        }
        names.push((config.coordinate.clone(), name));
        Ok(())
    }

    /// Validates a whole configuration set and returns every violation.
    #[must_use]
    pub fn validate_all<'a>(
        catalog: &ApiCatalog,
        configs: impl IntoIterator<Item = &'a Config>,
    ) -> Vec<Error> {
        let mut validator = Self::new();
        configs
            .into_iter()
            .filter_map(|config| validator.validate(catalog, config).err())
            .collect()
    }
}

/// Resolves a configuration's name without deployment context.
///
/// Any name that carries no reference to another configuration (literal,
/// environment variable, or a compound over such parts) resolves here. A
/// name with references, an unset variable without default, or a non-string
/// result yields `None` and is checked at deploy time instead.
fn resolved_name(config: &Config, env: &dyn EnvResolver) -> Option<String> {
    let parameter = config.parameters.get(NAME_PARAMETER)?;
    if !parameter.references().is_empty() {
        return None;
    }

    let entities = EntityMap::new();
    let properties: BTreeMap<String, Value> = BTreeMap::new();
    let ctx = ResolveContext {
        coordinate: &config.coordinate,
        entities: &entities,
        properties: &properties,
        env,
    };
    match parameter.resolve(&ctx) {
        Ok(Value::String(name)) => Some(name),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use monaco_core::parameter::Parameter;
    use std::collections::BTreeMap;

    fn named_config(api: &str, id: &str, name: Parameter, environment: &str) -> Config {
        let mut parameters = BTreeMap::new();
        parameters.insert(NAME_PARAMETER.to_string(), name);
        Config {
            coordinate: Coordinate::new("p", api, id),
            config_type: ConfigType::ClassicApi { api: api.into() },
            parameters,
            template: "{}".into(),
            environment: environment.into(),
            group: "default".into(),
            skip: false,
            original_file: None,
        }
    }

    fn validate_with(
        configs: &[Config],
        env: &BTreeMap<String, String>,
    ) -> Vec<Error> {
        let catalog = ApiCatalog::standard();
        let mut validator = UniqueNameValidator::new();
        configs
            .iter()
            .filter_map(|config| validator.validate_with_env(&catalog, config, env).err())
            .collect()
    }

    #[test]
    fn duplicate_names_for_same_api_and_environment_are_rejected() {
        let configs = vec![
            named_config("dashboard", "one", Parameter::value("Overview"), "dev"),
            named_config("dashboard", "two", Parameter::value("Overview"), "dev"),
        ];
        let errors = validate_with(&configs, &BTreeMap::new());
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], Error::DuplicateName { .. }));
    }

    #[test]
    fn same_name_in_different_environments_is_allowed() {
        let configs = vec![
            named_config("dashboard", "one", Parameter::value("Overview"), "dev"),
            named_config("dashboard", "one", Parameter::value("Overview"), "prod"),
        ];
        assert!(validate_with(&configs, &BTreeMap::new()).is_empty());
    }

    #[test]
    fn same_name_across_apis_is_allowed() {
        let configs = vec![
            named_config("dashboard", "one", Parameter::value("Overview"), "dev"),
            named_config("auto-tag", "one", Parameter::value("Overview"), "dev"),
        ];
        assert!(validate_with(&configs, &BTreeMap::new()).is_empty());
    }

    #[test]
    fn non_unique_name_apis_are_exempt() {
        let configs = vec![
            named_config(
                "request-naming-service",
                "one",
                Parameter::value("Same"),
                "dev",
            ),
            named_config(
                "request-naming-service",
                "two",
                Parameter::value("Same"),
                "dev",
            ),
        ];
        assert!(validate_with(&configs, &BTreeMap::new()).is_empty());
    }

    #[test]
    fn environment_variable_names_are_resolved_and_checked() {
        let mut env = BTreeMap::new();
        env.insert("DASH_NAME".to_string(), "Overview".to_string());

        let var_name = Parameter::Environment {
            name: "DASH_NAME".into(),
            default: None,
        };
        let configs = vec![
            named_config("dashboard", "one", var_name, "dev"),
            named_config("dashboard", "two", Parameter::value("Overview"), "dev"),
        ];
        let errors = validate_with(&configs, &env);
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], Error::DuplicateName { .. }));
    }

    #[test]
    fn environment_variable_defaults_participate() {
        let with_default = Parameter::Environment {
            name: "UNSET_NAME".into(),
            default: Some("Overview".into()),
        };
        let configs = vec![
            named_config("dashboard", "one", with_default, "dev"),
            named_config("dashboard", "two", Parameter::value("Overview"), "dev"),
        ];
        let errors = validate_with(&configs, &BTreeMap::new());
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn unset_variable_without_default_defers_to_deploy_time() {
        let unresolvable = Parameter::Environment {
            name: "UNSET_NAME".into(),
            default: None,
        };
        let configs = vec![
            named_config("dashboard", "one", unresolvable, "dev"),
            named_config("dashboard", "two", Parameter::value("x"), "dev"),
        ];
        assert!(validate_with(&configs, &BTreeMap::new()).is_empty());
    }

    #[test]
    fn compound_names_over_static_parts_are_resolved() {
        let mut env = BTreeMap::new();
        env.insert("STAGE".to_string(), "prod".to_string());

        let compound = |id: &str| {
            let mut parts = BTreeMap::new();
            parts.insert(
                "stage".to_string(),
                Parameter::Environment {
                    name: "STAGE".into(),
                    default: None,
                },
            );
            named_config(
                "dashboard",
                id,
                Parameter::Compound {
                    format: "Overview ({{ .stage }})".into(),
                    parameters: parts,
                },
                "dev",
            )
        };
        let errors = validate_with(&[compound("one"), compound("two")], &env);
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn reference_based_names_are_left_to_the_remote() {
        let reference = |id: &str| {
            named_config(
                "dashboard",
                id,
                Parameter::reference(Coordinate::new("p", "management-zone", "z"), "name"),
                "dev",
            )
        };
        let configs = vec![reference("one"), reference("two")];
        assert!(validate_with(&configs, &BTreeMap::new()).is_empty());
    }
}
