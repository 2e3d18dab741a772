//! Configuration for the director and reign sessions.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};
use sov_core::{EventId, RulesConfig};

use crate::error::{DirectorError, DirectorResult};

/// Tuning for event selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectorConfig {
    /// RNG seed for reproducible scorer pools.
    pub seed: u64,
    /// Maximum number of candidates shown to the scorer. At least 1.
    #[serde(deserialize_with = "at_least_one")]
    pub scorer_pool_size: usize,
    /// How long to wait for a scorer decision, in milliseconds.
    pub scorer_timeout_ms: u64,
    /// Catch-all event drawn when nothing else is feasible.
    pub fallback_event: Option<EventId>,
}

fn at_least_one<'de, D>(deserializer: D) -> Result<usize, D::Error>
where
    D: Deserializer<'de>,
{
    usize::deserialize(deserializer).map(|size| size.max(1))
}

impl Default for DirectorConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            scorer_pool_size: 5,
            scorer_timeout_ms: 8_000,
            fallback_event: None,
        }
    }
}

impl DirectorConfig {
    /// Set the RNG seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the scorer pool size (at least 1).
    pub fn with_scorer_pool_size(mut self, size: usize) -> Self {
        self.scorer_pool_size = size.max(1);
        self
    }

    /// Set the scorer timeout.
    pub fn with_scorer_timeout(mut self, timeout: Duration) -> Self {
        self.scorer_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Set the last-resort event.
    pub fn with_fallback_event(mut self, id: impl Into<String>) -> Self {
        self.fallback_event = Some(EventId::new(id));
        self
    }

    /// The scorer timeout as a [`Duration`].
    pub fn scorer_timeout(&self) -> Duration {
        Duration::from_millis(self.scorer_timeout_ms)
    }
}

/// Everything a [`ReignSession`](crate::ReignSession) needs besides content.
///
/// Usually read from a `sovereign.toml`:
///
/// ```toml
/// [rules]
/// theme_cooldown = 2
///
/// [rules.initial_resources]
/// treasury = 70
///
/// [director]
/// seed = 7
/// fallback_event = "quiet_year"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Game rules.
    pub rules: RulesConfig,
    /// Event selection tuning.
    pub director: DirectorConfig,
}

impl SessionConfig {
    /// Set the rules.
    pub fn with_rules(mut self, rules: RulesConfig) -> Self {
        self.rules = rules;
        self
    }

    /// Set the director config.
    pub fn with_director(mut self, director: DirectorConfig) -> Self {
        self.director = director;
        self
    }

    /// Parse a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(source: &str) -> DirectorResult<Self> {
        Ok(toml::from_str(source)?)
    }

    /// Read and parse a TOML file.
    pub fn load(path: &Path) -> DirectorResult<Self> {
        let source = std::fs::read_to_string(path).map_err(|source| DirectorError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&source)
    }
}
