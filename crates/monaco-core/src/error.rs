//! Error types and result aliases shared across the deploy core.

use crate::coordinate::Coordinate;

/// The result type used throughout `monaco-core`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by the shared primitives.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A coordinate string could not be parsed.
    #[error("invalid coordinate: {message}")]
    InvalidCoordinate {
        /// Description of what made the coordinate invalid.
        message: String,
    },

    /// An environment variable parameter had no value and no default.
    #[error("environment variable '{name}' is not set and no default is defined")]
    MissingEnvironmentVariable {
        /// Name of the missing variable.
        name: String,
    },

    /// A reference could not be satisfied from the resolved-entity table.
    #[error("could not resolve reference to '{target}' property '{property}'")]
    UnresolvedReference {
        /// Coordinate of the referenced configuration.
        target: Coordinate,
        /// Property path that was looked up.
        property: String,
    },

    /// Parameters of a single configuration reference each other cyclically.
    #[error("cyclic parameter definitions in {coordinate}: {involved:?}")]
    CyclicParameters {
        /// Configuration whose parameters form a cycle.
        coordinate: Coordinate,
        /// Names of the parameters involved in the cycle.
        involved: Vec<String>,
    },

    /// A parameter resolved to a value of an unusable type.
    #[error("parameter '{parameter}' of {coordinate} resolved to an invalid value: {message}")]
    InvalidParameterValue {
        /// Configuration the parameter belongs to.
        coordinate: Coordinate,
        /// Name of the parameter.
        parameter: String,
        /// Why the value is unusable.
        message: String,
    },

    /// A template referenced a key that is not among the resolved properties.
    #[error("template references undefined key '{key}'")]
    UndefinedTemplateKey {
        /// The key that was not found.
        key: String,
    },

    /// A template could not be parsed.
    #[error("malformed template: {message}")]
    MalformedTemplate {
        /// Description of the parse failure.
        message: String,
    },

    /// An environment record is unusable.
    #[error("invalid environment '{environment}': {message}")]
    InvalidEnvironment {
        /// Name of the environment.
        environment: String,
        /// Why the record is invalid.
        message: String,
    },
}
