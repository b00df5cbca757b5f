//! The parameter system.
//!
//! Every configuration carries a map of named parameters. A parameter is one
//! of a small, closed set of variants:
//!
//! - **Value**: a constant, no references
//! - **Environment**: read from the process environment, optional default
//! - **Reference**: depends on another configuration being deployed first
//! - **Compound**: a format string interpolating nested parameters
//!
//! Parameters expose two operations: [`Parameter::references`], used by the
//! graph builder, and [`Parameter::resolve`], used by the executor once the
//! referenced entities exist.

use std::collections::{BTreeMap, VecDeque};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::coordinate::Coordinate;
use crate::entity::EntityMap;
use crate::error::{Error, Result};
use crate::template;

/// Reserved parameter name holding the human-readable configuration name.
pub const NAME_PARAMETER: &str = "name";

/// Reserved parameter name overriding the remote object id.
pub const ID_PARAMETER: &str = "id";

/// Reserved parameter name carrying the scope of sub-path and settings APIs.
pub const SCOPE_PARAMETER: &str = "scope";

/// A reference to a property of another (or the same) configuration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PropertyReference {
    /// Coordinate of the referenced configuration.
    pub coordinate: Coordinate,
    /// Property looked up on the referenced configuration's resolved entity.
    pub property: String,
}

/// A configuration parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Parameter {
    /// A constant value.
    Value {
        /// The literal value.
        value: Value,
    },

    /// A value read from the process environment.
    Environment {
        /// Name of the environment variable.
        name: String,
        /// Value used when the variable is absent.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        default: Option<String>,
    },

    /// A reference to a property of another configuration's resolved entity.
    ///
    /// When the target coordinate equals the owning configuration's
    /// coordinate, the reference is intra-config and resolves against the
    /// properties produced earlier in the same resolution pass.
    Reference {
        /// Coordinate of the referenced configuration.
        target: Coordinate,
        /// Property to read, e.g. `id`.
        property: String,
    },

    /// A format string interpolating nested parameters.
    ///
    /// The format uses the same `{{ .key }}` placeholder syntax as
    /// configuration templates; every placeholder must name a nested
    /// parameter.
    Compound {
        /// The format string.
        format: String,
        /// Nested parameters available to the format string.
        parameters: BTreeMap<String, Parameter>,
    },
}

impl Parameter {
    /// Convenience constructor for a constant string value.
    #[must_use]
    pub fn value(value: impl Into<Value>) -> Self {
        Self::Value {
            value: value.into(),
        }
    }

    /// Convenience constructor for a reference parameter.
    #[must_use]
    pub fn reference(target: Coordinate, property: impl Into<String>) -> Self {
        Self::Reference {
            target,
            property: property.into(),
        }
    }

    /// Returns all configuration references this parameter depends on.
    ///
    /// Compound parameters propagate the references of their nested
    /// parameters.
    #[must_use]
    pub fn references(&self) -> Vec<PropertyReference> {
        match self {
            Self::Value { .. } | Self::Environment { .. } => Vec::new(),
            Self::Reference { target, property } => vec![PropertyReference {
                coordinate: target.clone(),
                property: property.clone(),
            }],
            Self::Compound { parameters, .. } => parameters
                .values()
                .flat_map(Parameter::references)
                .collect(),
        }
    }

    /// Resolves the parameter to a concrete value.
    ///
    /// # Errors
    ///
    /// Returns an error if an environment variable is absent without a
    /// default, a reference cannot be satisfied from the context, or a
    /// compound format references an undefined nested parameter.
    pub fn resolve(&self, ctx: &ResolveContext<'_>) -> Result<Value> {
        match self {
            Self::Value { value } => Ok(value.clone()),

            Self::Environment { name, default } => match ctx.env.var(name) {
                Some(value) => Ok(Value::String(value)),
                None => default
                    .clone()
                    .map(Value::String)
                    .ok_or_else(|| Error::MissingEnvironmentVariable { name: name.clone() }),
            },

            Self::Reference { target, property } => {
                if target == ctx.coordinate {
                    return ctx.properties.get(property).cloned().ok_or_else(|| {
                        Error::UnresolvedReference {
                            target: target.clone(),
                            property: property.clone(),
                        }
                    });
                }
                let entity =
                    ctx.entities
                        .get(target)
                        .ok_or_else(|| Error::UnresolvedReference {
                            target: target.clone(),
                            property: property.clone(),
                        })?;
                entity.properties.get(property).cloned().ok_or_else(|| {
                    Error::UnresolvedReference {
                        target: target.clone(),
                        property: property.clone(),
                    }
                })
            }

            Self::Compound { format, parameters } => {
                let mut nested = BTreeMap::new();
                for (key, parameter) in parameters {
                    nested.insert(key.clone(), parameter.resolve(ctx)?);
                }
                let rendered = template::render(format, &nested)?;
                Ok(Value::String(rendered))
            }
        }
    }
}

/// Everything a parameter may consult while resolving.
#[derive(Clone, Copy)]
pub struct ResolveContext<'a> {
    /// Coordinate of the configuration owning the parameter.
    pub coordinate: &'a Coordinate,
    /// The resolved-entity table of the current run.
    pub entities: &'a EntityMap,
    /// Properties of the owning configuration resolved so far.
    pub properties: &'a BTreeMap<String, Value>,
    /// Source of environment variables.
    pub env: &'a dyn EnvResolver,
}

/// Source of environment variable values.
///
/// Exists so tests can substitute a fixed map for the process environment.
pub trait EnvResolver {
    /// Returns the value of the variable, if set.
    fn var(&self, name: &str) -> Option<String>;
}

/// Reads variables from the process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvResolver for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl EnvResolver for BTreeMap<String, String> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

/// Computes the order in which the parameters of a single configuration must
/// be resolved.
///
/// Parameters may reference each other within one configuration (a reference
/// whose target is the owning coordinate). The order is a topological sort of
/// that local graph with alphabetical tie-breaking, so later parameters see
/// the values of earlier ones.
///
/// # Errors
///
/// Returns [`Error::CyclicParameters`] naming the involved parameters when
/// the local graph is cyclic.
pub fn resolution_order<'a>(
    coordinate: &Coordinate,
    parameters: &'a BTreeMap<String, Parameter>,
) -> Result<Vec<(&'a str, &'a Parameter)>> {
    // Kahn's algorithm over parameter names. Dependencies are intra-config
    // references; references to parameters that do not exist locally are left
    // for resolve() to report with full context.
    let mut in_degree: BTreeMap<&str, usize> =
        parameters.keys().map(|name| (name.as_str(), 0)).collect();
    let mut dependents: BTreeMap<&str, Vec<&str>> = BTreeMap::new();

    for (name, parameter) in parameters {
        for reference in parameter.references() {
            if reference.coordinate == *coordinate {
                if let Some((dependency, _)) = parameters.get_key_value(&reference.property) {
                    dependents
                        .entry(dependency.as_str())
                        .or_default()
                        .push(name.as_str());
                    *in_degree.entry(name.as_str()).or_insert(0) += 1;
                }
            }
        }
    }

    let mut ready: VecDeque<&str> = in_degree
        .iter()
        .filter(|(_, degree)| **degree == 0)
        .map(|(name, _)| *name)
        .collect();

    let mut order = Vec::with_capacity(parameters.len());
    while let Some(name) = ready.pop_front() {
        let (key, parameter) = parameters
            .get_key_value(name)
            .expect("ordered names come from the parameter map");
        order.push((key.as_str(), parameter));
        if let Some(children) = dependents.get(name) {
            for child in children {
                let degree = in_degree
                    .get_mut(child)
                    .expect("dependents are parameter names");
                *degree -= 1;
                if *degree == 0 {
                    ready.push_back(child);
                }
            }
        }
    }

    if order.len() != parameters.len() {
        let involved: Vec<String> = in_degree
            .into_iter()
            .filter(|(_, degree)| *degree > 0)
            .map(|(name, _)| name.to_string())
            .collect();
        return Err(Error::CyclicParameters {
            coordinate: coordinate.clone(),
            involved,
        });
    }
    Ok(order)
}
