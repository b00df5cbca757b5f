//! Resolved entities.
//!
//! A [`ResolvedEntity`] is the record produced after a configuration has been
//! applied to an environment (or intentionally skipped). Downstream
//! configurations read its properties to satisfy their references.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::coordinate::Coordinate;

/// Property key under which the remote object id is stored.
pub const ID_PROPERTY: &str = "id";

/// Property key under which the entity name is stored.
pub const NAME_PROPERTY: &str = "name";

/// The outcome of applying one configuration to an environment.
///
/// Entries are append-only: once inserted into an [`EntityMap`] under their
/// coordinate they are never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedEntity {
    /// Coordinate of the source configuration.
    pub coordinate: Coordinate,
    /// Human-readable name of the deployed object.
    pub entity_name: String,
    /// Properties exposed to downstream references. Contains at minimum
    /// [`ID_PROPERTY`] and [`NAME_PROPERTY`] for deployed entities.
    pub properties: BTreeMap<String, Value>,
    /// True if the configuration was skipped and no remote object exists.
    pub skip: bool,
}

impl ResolvedEntity {
    /// Creates an entity for a successfully deployed configuration.
    #[must_use]
    pub fn deployed(
        coordinate: Coordinate,
        entity_name: impl Into<String>,
        mut properties: BTreeMap<String, Value>,
        id: impl Into<String>,
    ) -> Self {
        let entity_name = entity_name.into();
        properties.insert(ID_PROPERTY.to_string(), Value::String(id.into()));
        properties
            .entry(NAME_PROPERTY.to_string())
            .or_insert_with(|| Value::String(entity_name.clone()));
        Self {
            coordinate,
            entity_name,
            properties,
            skip: false,
        }
    }

    /// Creates a placeholder entity for a skipped configuration.
    ///
    /// Skip entities expose no properties; references into them fail.
    #[must_use]
    pub fn skipped(coordinate: Coordinate) -> Self {
        let entity_name = coordinate.config_id.clone();
        Self {
            coordinate,
            entity_name,
            properties: BTreeMap::new(),
            skip: true,
        }
    }

    /// Returns the remote object id, if the entity carries one.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.properties.get(ID_PROPERTY).and_then(Value::as_str)
    }
}

/// The resolved-entity table, keyed by coordinate.
///
/// Ordered so that iteration (e.g. in reports) is deterministic.
pub type EntityMap = BTreeMap<Coordinate, ResolvedEntity>;
