//! Cache settings.

use std::collections::BTreeSet;

use baselayout_core::{ConfigError, Database, LayoutResult};
use serde::{Deserialize, Serialize};

/// Environment variable holding the global enabled flag.
pub const ENV_ENABLED: &str = "BASELAYOUT_CACHE_ENABLED";

/// Environment variable holding the comma separated active databases.
pub const ENV_DATABASES: &str = "BASELAYOUT_CACHE_DATABASES";

/// Process-wide settings of a [`BaseLayoutValueCache`](crate::BaseLayoutValueCache).
///
/// Databases outside `databases` are never populated and never targeted by
/// invalidation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheSettings {
    /// Initial value of the cache's enabled flag.
    pub enabled: bool,
    /// Databases for which caching and invalidation are active.
    pub databases: BTreeSet<Database>,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            databases: BTreeSet::from([Database::master(), Database::web()]),
        }
    }
}

impl CacheSettings {
    /// Create settings with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable the cache.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Add an active database.
    pub fn with_database(mut self, database: Database) -> Self {
        self.databases.insert(database);
        self
    }

    /// Replace the set of active databases.
    pub fn with_databases(mut self, databases: impl IntoIterator<Item = Database>) -> Self {
        self.databases = databases.into_iter().collect();
        self
    }

    /// True if caching is configured for `database`.
    ///
    /// Does not look at the enabled flag, which the cache can toggle at runtime.
    pub fn is_active(&self, database: &Database) -> bool {
        self.databases.contains(database)
    }

    /// Validate the settings.
    /// Returns Ok(()) if valid, Err(LayoutError::Config) if invalid.
    pub fn validate(&self) -> LayoutResult<()> {
        if self.enabled && self.databases.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "databases".to_string(),
                value: "[]".to_string(),
                reason: "an enabled cache needs at least one database".to_string(),
            }
            .into());
        }
        Ok(())
    }

    /// Load settings from the process environment.
    ///
    /// See [`CacheSettings::from_lookup`].
    pub fn from_env() -> LayoutResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load settings from a variable lookup.
    ///
    /// Unset or unrecognised values fall back to the defaults. The enabled
    /// flag accepts `true`/`false`/`1`/`0` in any case. Database labels are
    /// comma separated; blank entries are skipped and an invalid label is an
    /// error.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> LayoutResult<Self> {
        let mut settings = Self::default();

        if let Some(enabled) = lookup(ENV_ENABLED).as_deref().and_then(parse_flag) {
            settings.enabled = enabled;
        }

        if let Some(raw) = lookup(ENV_DATABASES) {
            let databases = raw
                .split(',')
                .map(str::trim)
                .filter(|label| !label.is_empty())
                .map(|label| {
                    Database::new(label).map_err(|err| ConfigError::InvalidValue {
                        field: ENV_DATABASES.to_string(),
                        value: label.to_string(),
                        reason: err.to_string(),
                    })
                })
                .collect::<Result<BTreeSet<_>, _>>()?;
            if !databases.is_empty() {
                settings.databases = databases;
            }
        }

        Ok(settings)
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}
