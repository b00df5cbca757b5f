//! Error types for the deploy domain.

use monaco_core::coordinate::Coordinate;

/// The result type used throughout `monaco-deploy`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while compiling or executing a deployment.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Loaded project data is unusable.
    #[error("failed to load project configuration: {message}")]
    Load {
        /// Description of the failure.
        message: String,
    },

    /// Two classic configurations resolve to the same name.
    #[error(
        "duplicated config name found: configurations {first} and {second} \
         define the same 'name' \"{name}\" for API '{api}'"
    )]
    DuplicateName {
        /// The classic API both configurations target.
        api: String,
        /// The shared name.
        name: String,
        /// First configuration defining the name.
        first: Coordinate,
        /// Second configuration defining the name.
        second: Coordinate,
    },

    /// A parameter references a configuration that is not part of the
    /// loaded set for the environment.
    #[error("{from} references unknown configuration {to} (property '{property}')")]
    MissingReference {
        /// The referencing configuration.
        from: Coordinate,
        /// The referenced coordinate that could not be found.
        to: Coordinate,
        /// The property path of the reference.
        property: String,
    },

    /// The dependency graph contains a cycle.
    #[error("cyclic dependency between configurations: {cycle:?}")]
    CyclicDependency {
        /// All coordinates involved in the cycle.
        cycle: Vec<Coordinate>,
    },

    /// A parameter could not be resolved.
    #[error("parameter '{parameter}' of {coordinate} could not be resolved")]
    Parameter {
        /// Configuration the parameter belongs to.
        coordinate: Coordinate,
        /// Name of the parameter.
        parameter: String,
        /// The underlying resolution failure.
        #[source]
        source: monaco_core::Error,
    },

    /// The configuration template could not be rendered.
    #[error("failed to render template of {coordinate}")]
    Template {
        /// The configuration whose template failed.
        coordinate: Coordinate,
        /// The underlying rendering failure.
        #[source]
        source: monaco_core::Error,
    },

    /// The rendered payload is not usable by the backend.
    #[error("invalid payload of {coordinate}: {message}")]
    InvalidPayload {
        /// The configuration whose payload is invalid.
        coordinate: Coordinate,
        /// Why the payload is unusable.
        message: String,
    },

    /// A classic or bucket configuration has no usable `name` parameter.
    #[error("configuration {coordinate} defines no 'name' parameter")]
    MissingName {
        /// The configuration missing a name.
        coordinate: Coordinate,
    },

    /// A sub-path API configuration has no usable `scope` parameter.
    #[error("sub-path API '{api}' of {coordinate} requires a 'scope' parameter")]
    MissingScope {
        /// The configuration missing a scope.
        coordinate: Coordinate,
        /// The sub-path API.
        api: String,
    },

    /// More than one remote object carries the name used as identity.
    #[error("cannot deploy {coordinate}: {matches} objects of API '{api}' share the name \"{name}\"")]
    AmbiguousName {
        /// The configuration being deployed.
        coordinate: Coordinate,
        /// The classic API.
        api: String,
        /// The ambiguous name.
        name: String,
        /// Number of remote objects sharing the name.
        matches: usize,
    },

    /// A configuration targets an API the catalog does not know.
    #[error("unknown API '{api}' referenced by {coordinate}")]
    UnknownApi {
        /// The configuration referencing the API.
        coordinate: Coordinate,
        /// The unknown API id.
        api: String,
    },

    /// An environment cannot be used for this operation.
    #[error("environment '{environment}' is not usable: {message}")]
    Auth {
        /// Name of the environment.
        environment: String,
        /// Why the environment cannot be used.
        message: String,
    },

    /// The remote rejected or failed a call. Surfaced verbatim.
    #[error("deployment of {coordinate} failed")]
    Remote {
        /// The configuration whose call failed.
        coordinate: Coordinate,
        /// The underlying client failure.
        #[source]
        source: monaco_client::Error,
    },

    /// A configuration depends on a configuration that was skipped.
    #[error("{coordinate} depends on skipped configuration {dependency}")]
    ConfigSkipped {
        /// The configuration that cannot be deployed.
        coordinate: Coordinate,
        /// The skipped dependency.
        dependency: Coordinate,
    },

    /// A configuration was not deployed because a dependency failed.
    #[error("skipping deployment of {coordinate}: dependency {failed} failed")]
    DescendantBlocked {
        /// The configuration that was never dispatched.
        coordinate: Coordinate,
        /// The failed dependency blocking it.
        failed: Coordinate,
    },

    /// A remote object could not be deleted.
    #[error("failed to delete {config_type} '{identifier}'")]
    Delete {
        /// The configuration type being deleted.
        config_type: String,
        /// Name or id identifying the object.
        identifier: String,
        /// The underlying client failure.
        #[source]
        source: monaco_client::Error,
    },

    /// Several errors, aggregated.
    #[error("encountered {} errors", .errors.len())]
    Aggregate {
        /// The collected errors.
        errors: Vec<Error>,
    },

    /// An internal error that should not happen in normal operation.
    #[error("internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },

    /// An error from the shared primitives.
    #[error("core error: {0}")]
    Core(#[from] monaco_core::Error),
}

impl Error {
    /// Creates a load error.
    #[must_use]
    pub fn load(message: impl Into<String>) -> Self {
        Self::Load {
            message: message.into(),
        }
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Wraps a non-empty error list into an aggregate.
    ///
    /// Returns `Ok(())` for an empty list.
    pub fn aggregate(errors: Vec<Error>) -> Result<()> {
        if errors.is_empty() {
            Ok(())
        } else {
            Err(Self::Aggregate { errors })
        }
    }
}
