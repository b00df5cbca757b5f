//! Process-wide feature flags.
//!
//! A flag is a pair of environment variable name and default. The environment
//! is read lazily on each [`FeatureFlag::enabled`] call; flags are not
//! hot-swapped during a run, so callers that care may snapshot at run start.
//! Adding a flag is a single constant below.

/// An environment-variable-backed boolean flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureFlag {
    env_name: &'static str,
    default_enabled: bool,
}

impl FeatureFlag {
    /// Creates a new flag definition.
    #[must_use]
    pub const fn new(env_name: &'static str, default_enabled: bool) -> Self {
        Self {
            env_name,
            default_enabled,
        }
    }

    /// The environment variable backing this flag.
    #[must_use]
    pub const fn env_name(&self) -> &'static str {
        self.env_name
    }

    /// The value used when the variable is unset or unparsable.
    #[must_use]
    pub const fn default_enabled(&self) -> bool {
        self.default_enabled
    }

    /// Reads the flag from the process environment.
    ///
    /// Accepts the usual boolean spellings (`1`/`0`, `true`/`false`,
    /// `yes`/`no`, `on`/`off`, case-insensitive). Anything else falls back to
    /// the default.
    #[must_use]
    pub fn enabled(&self) -> bool {
        match std::env::var(self.env_name) {
            Ok(value) => match value.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => self.default_enabled,
            },
            Err(_) => self.default_enabled,
        }
    }
}

/// Dynatrace entities download/matching support. Slated for removal.
pub const ENTITIES: FeatureFlag = FeatureFlag::new("MONACO_FEAT_ENTITIES", false);

/// Verify the environment type (classic vs platform) before execution.
pub const VERIFY_ENVIRONMENT_TYPE: FeatureFlag =
    FeatureFlag::new("MONACO_FEAT_VERIFY_ENV_TYPE", true);

/// Address `builtin:management-zones` settings by their resolved numeric id
/// instead of the object id when they are referenced.
pub const MANAGEMENT_ZONE_NUMERIC_IDS: FeatureFlag =
    FeatureFlag::new("MONACO_FEAT_USE_MZ_NUMERIC_ID", true);

/// Generate UUIDs with consistent separator characters regardless of OS.
/// Exists to restore the old, technically buggy Windows behavior if needed.
pub const CONSISTENT_UUID_GENERATION: FeatureFlag =
    FeatureFlag::new("MONACO_FEAT_CONSISTENT_UUID_GENERATION", true);

/// Sort projects using dependency-graph data structures.
pub const GRAPH_SORT: FeatureFlag = FeatureFlag::new("MONACO_FEAT_GRAPH_SORT", true);

/// Use dependency graphs for deployment.
pub const GRAPH_DEPLOY: FeatureFlag = FeatureFlag::new("MONACO_FEAT_GRAPH_DEPLOY", true);

/// Deploy independent configurations of a graph in parallel.
pub const GRAPH_DEPLOY_PARALLEL: FeatureFlag =
    FeatureFlag::new("MONACO_FEAT_GRAPH_DEPLOY_PARALLEL", true);

/// Enable the Grail bucket configuration type.
pub const BUCKETS: FeatureFlag = FeatureFlag::new("MONACO_FEAT_BUCKETS", false);

/// Remove escape characters from v1 values when converting.
pub const UNESCAPE_ON_CONVERT: FeatureFlag =
    FeatureFlag::new("MONACO_FEAT_UNESCAPE_ON_CONVERT", true);
