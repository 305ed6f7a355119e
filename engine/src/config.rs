//! Merge configuration.

use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

/// Environment variable read by [`MergeConfig::from_env`].
pub const FIRST_SYNC_POLICY_ENV: &str = "LOFI_FIRST_SYNC_POLICY";

/// What to do with dirty fields when the local card has no sync snapshot.
///
/// Without a snapshot there is no common ancestor, so a remote change cannot
/// be told apart from a value that was always different.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FirstSyncPolicy {
    /// Treat the remote as unchanged and keep local values (default)
    #[default]
    PreferLocal,
    /// Flag a conflict for each dirty field whose remote value differs from local
    FlagConflict,
}

impl FromStr for FirstSyncPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "prefer-local" => Ok(FirstSyncPolicy::PreferLocal),
            "flag-conflict" => Ok(FirstSyncPolicy::FlagConflict),
            other => Err(ConfigError::InvalidFirstSyncPolicy(other.to_string())),
        }
    }
}

/// Options for the [`Resolver`](crate::Resolver).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MergeConfig {
    pub first_sync: FirstSyncPolicy,
}

impl MergeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_first_sync(mut self, policy: FirstSyncPolicy) -> Self {
        self.first_sync = policy;
        self
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let first_sync = match env::var(FIRST_SYNC_POLICY_ENV) {
            Ok(value) => value.parse()?,
            Err(_) => FirstSyncPolicy::default(),
        };

        Ok(Self { first_sync })
    }
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid LOFI_FIRST_SYNC_POLICY value '{0}': expected prefer-local or flag-conflict")]
    InvalidFirstSyncPolicy(String),
}
