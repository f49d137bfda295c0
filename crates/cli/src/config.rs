//! Configuration file loading and option precedence.
//!
//! Settings are resolved in order of decreasing priority: command-line flags,
//! the `METARESTORE_ACL_GRANT` environment variable, the JSON configuration
//! file, then built-in defaults.

use crate::arguments::ParsedArgs;
use logging::{SubsystemLevels, VerbosityConfig};
use metadata::{AclGrant, RestoreOptions};
use serde::Deserialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable overriding the configured DACL grant.
pub const ACL_GRANT_ENV: &str = "METARESTORE_ACL_GRANT";

/// Contents of a `--config` file. Every field is optional.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    /// Restore timestamps.
    pub restore_times: Option<bool>,
    /// Restore owners and groups.
    pub restore_ownership: Option<bool>,
    /// Apply ownership to ancestor directories.
    pub propagate_ancestors: Option<bool>,
    /// DACL grant after ownership changes.
    pub acl_grant: Option<AclGrant>,
    /// Destination directory for relative record paths.
    pub root: Option<PathBuf>,
    /// Equivalent to repeating `-v`.
    pub verbosity: Option<u8>,
    /// Minimum per-subsystem log levels.
    pub log_levels: Option<SubsystemLevels>,
}

/// Failure to build the effective settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read configuration '{}': {source}", path.display())]
    Read {
        /// Configuration path.
        path: PathBuf,
        /// Underlying failure.
        source: io::Error,
    },
    /// The configuration file is not valid JSON for [`FileConfig`].
    #[error("invalid configuration '{}': {source}", path.display())]
    Parse {
        /// Configuration path.
        path: PathBuf,
        /// Underlying failure.
        source: serde_json::Error,
    },
    /// The environment variable holds an unknown grant.
    #[error("invalid {ACL_GRANT_ENV}: {0}")]
    Environment(#[from] metadata::ParseAclGrantError),
}

impl FileConfig {
    /// Loads a configuration file.
    ///
    /// # Errors
    ///
    /// Fails when the file is unreadable or not a valid configuration.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Effective settings for one run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Settings {
    pub(crate) restore: RestoreOptions,
    pub(crate) verbosity: VerbosityConfig,
}

impl Settings {
    /// Combines parsed flags, the environment, and an optional file config.
    ///
    /// `env` looks up environment variables so callers and tests can supply
    /// their own view of the environment.
    ///
    /// # Errors
    ///
    /// Fails when the environment holds an invalid grant.
    pub(crate) fn resolve(
        parsed: &ParsedArgs,
        file: &FileConfig,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let env_grant = env(ACL_GRANT_ENV)
            .filter(|value| !value.trim().is_empty())
            .map(|value| value.parse::<AclGrant>())
            .transpose()?;

        let grant = parsed
            .acl_grant
            .or(env_grant)
            .or(file.acl_grant)
            .unwrap_or_default();
        let toggle = |disabled_by_flag: bool, from_file: Option<bool>| {
            !disabled_by_flag && from_file.unwrap_or(true)
        };

        let restore = RestoreOptions::new()
            .restore_times(toggle(parsed.no_times, file.restore_times))
            .restore_ownership(toggle(parsed.no_owner, file.restore_ownership))
            .propagate_ancestors(toggle(parsed.no_ancestors, file.propagate_ancestors))
            .acl_grant(grant)
            .root(parsed.root.clone().or_else(|| file.root.clone()));

        let level = if parsed.verbose > 0 {
            parsed.verbose
        } else {
            file.verbosity.unwrap_or(0)
        };
        let mut verbosity = VerbosityConfig::from_verbose_level(level);
        if let Some(levels) = &file.log_levels {
            verbosity.levels.raise_to(levels);
        }

        Ok(Self { restore, verbosity })
    }
}
