//! Reference resolution and per-environment dependency graphs.
//!
//! For one target environment, the builder indexes all loaded configurations
//! by coordinate, collects every parameter reference, rejects references to
//! coordinates outside the loaded set, and produces an immutable graph plus
//! a deterministic topological order. Edges point from the referenced
//! configuration to the referencing one, so the order deploys dependencies
//! first.

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};

use monaco_core::config::Config;
use monaco_core::coordinate::Coordinate;
use monaco_core::manifest::Manifest;

use crate::dag::Dag;
use crate::error::{Error, Result};

/// The immutable dependency graph of one environment.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    environment: String,
    configs: BTreeMap<Coordinate, Config>,
    dag: Dag<Coordinate>,
    order: Vec<Coordinate>,
}

impl DependencyGraph {
    /// Builds the graph for an environment from its loaded configurations.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Load`] on duplicate coordinates,
    /// [`Error::MissingReference`] for references to coordinates outside the
    /// set, and [`Error::CyclicDependency`] naming all cycle members.
    pub fn build(environment: impl Into<String>, configs: Vec<Config>) -> Result<Self> {
        let environment = environment.into();

        let mut index: BTreeMap<Coordinate, Config> = BTreeMap::new();
        for config in configs {
            if let Some(previous) = index.insert(config.coordinate.clone(), config) {
                return Err(Error::load(format!(
                    "duplicate coordinate {} in environment '{environment}'",
                    previous.coordinate
                )));
            }
        }

        let mut dag = Dag::new();
        for coordinate in index.keys() {
            dag.add_node(coordinate.clone());
        }
        for config in index.values() {
            for reference in config.external_references() {
                if !index.contains_key(&reference.coordinate) {
                    return Err(Error::MissingReference {
                        from: config.coordinate.clone(),
                        to: reference.coordinate,
                        property: reference.property,
                    });
                }
                dag.add_edge(&reference.coordinate, &config.coordinate);
            }
        }

        let order = dag
            .toposort()
            .map_err(|cycle| Error::CyclicDependency { cycle })?;

        Ok(Self {
            environment,
            configs: index,
            dag,
            order,
        })
    }

    /// Name of the environment this graph targets.
    #[must_use]
    pub fn environment(&self) -> &str {
        &self.environment
    }

    /// The deterministic topological order of all configurations.
    #[must_use]
    pub fn topological_order(&self) -> &[Coordinate] {
        &self.order
    }

    /// Looks up a configuration by coordinate.
    #[must_use]
    pub fn config(&self, coordinate: &Coordinate) -> Option<&Config> {
        self.configs.get(coordinate)
    }

    /// Iterates over all configurations in coordinate order.
    pub fn configs(&self) -> impl Iterator<Item = &Config> {
        self.configs.values()
    }

    /// Number of configurations in the graph.
    #[must_use]
    pub fn len(&self) -> usize {
        self.configs.len()
    }

    /// True if the graph has no configurations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }

    pub(crate) fn successors(&self, coordinate: &Coordinate) -> Vec<Coordinate> {
        self.dag.successors(coordinate)
    }

    pub(crate) fn descendants(&self, coordinate: &Coordinate) -> Vec<Coordinate> {
        self.dag.descendants(coordinate)
    }

    pub(crate) fn in_degrees(&self) -> HashMap<Coordinate, usize> {
        self.dag.in_degrees()
    }
}

/// Collects the configurations deployed to `environment`: those of the
/// selected projects plus the projects they transitively reference.
///
/// An empty selection means all projects.
///
/// # Errors
///
/// Returns [`Error::Load`] when a selected project id does not exist in the
/// manifest.
pub fn project_closure(
    manifest: &Manifest,
    selected_projects: &[String],
    environment: &str,
) -> Result<Vec<Config>> {
    let selection: Vec<String> = if selected_projects.is_empty() {
        manifest.projects.iter().map(|p| p.id.clone()).collect()
    } else {
        for id in selected_projects {
            if manifest.project(id).is_none() {
                return Err(Error::load(format!("project '{id}' is not defined")));
            }
        }
        selected_projects.to_vec()
    };

    let mut included: BTreeSet<String> = BTreeSet::new();
    let mut queue: VecDeque<String> = selection.into_iter().collect();
    let mut configs = Vec::new();

    while let Some(project_id) = queue.pop_front() {
        if !included.insert(project_id.clone()) {
            continue;
        }
        let Some(project) = manifest.project(&project_id) else {
            // Referenced but unknown projects surface as missing references
            // once the graph is built against the incomplete set.
            continue;
        };
        for config in project.configs_for_environment(environment) {
            for reference in config.external_references() {
                if !included.contains(&reference.coordinate.project) {
                    queue.push_back(reference.coordinate.project.clone());
                }
            }
            configs.push(config.clone());
        }
    }

    Ok(configs)
}
