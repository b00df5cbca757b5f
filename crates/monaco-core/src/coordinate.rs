//! Configuration coordinates.
//!
//! A [`Coordinate`] is the identity of a single configuration: the project it
//! belongs to, its type (a classic API id, a settings schema, an automation
//! resource, or `bucket`), and the configuration id chosen by the author.
//! Coordinates are the vertex identity of dependency graphs and the key of
//! the resolved-entity table.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Uniquely names a configuration as `(project, type, configId)`.
///
/// Equality, hashing and ordering consider all three components; the ordering
/// is lexicographic and is used as the deterministic tie-breaker wherever
/// configurations need a stable order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coordinate {
    /// Project the configuration belongs to.
    pub project: String,
    /// Type id, e.g. a classic API id or a settings schema id.
    pub config_type: String,
    /// Configuration id unique within `(project, config_type)`.
    pub config_id: String,
}

impl Coordinate {
    /// Creates a new coordinate.
    #[must_use]
    pub fn new(
        project: impl Into<String>,
        config_type: impl Into<String>,
        config_id: impl Into<String>,
    ) -> Self {
        Self {
            project: project.into(),
            config_type: config_type.into(),
            config_id: config_id.into(),
        }
    }

    /// Returns true if this coordinate points at the given type.
    #[must_use]
    pub fn is_type(&self, config_type: &str) -> bool {
        self.config_type == config_type
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.project, self.config_type, self.config_id)
    }
}

impl FromStr for Coordinate {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut parts = s.splitn(3, ':');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(project), Some(config_type), Some(config_id))
                if !project.is_empty() && !config_type.is_empty() && !config_id.is_empty() =>
            {
                Ok(Self::new(project, config_type, config_id))
            }
            _ => Err(Error::InvalidCoordinate {
                message: format!("expected 'project:type:configId', got '{s}'"),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coordinate_display_round_trips() {
        let c = Coordinate::new("infra", "dashboard", "overview");
        assert_eq!(c.to_string(), "infra:dashboard:overview");
        assert_eq!("infra:dashboard:overview".parse::<Coordinate>().unwrap(), c);
    }

    #[test]
    fn coordinate_parse_rejects_missing_parts() {
        assert!("only:two".parse::<Coordinate>().is_err());
        assert!("::".parse::<Coordinate>().is_err());
        assert!("".parse::<Coordinate>().is_err());
    }

    #[test]
    fn coordinate_parse_keeps_colons_in_config_id() {
        // Settings schema ids contain colons; only the first two separate.
        let c = "p:builtin:alerting.profile".parse::<Coordinate>().unwrap();
        assert_eq!(c.project, "p");
        assert_eq!(c.config_type, "builtin");
        assert_eq!(c.config_id, "alerting.profile");
    }

    #[test]
    fn ordering_is_lexicographic_over_all_components() {
        let a = Coordinate::new("a", "dashboard", "z");
        let b = Coordinate::new("a", "management-zone", "a");
        let c = Coordinate::new("b", "alerting-profile", "a");
        assert!(a < b);
        assert!(b < c);
    }
}
