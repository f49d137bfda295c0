//! crates/logging/src/config.rs
//! Verbosity configuration and its translation into tracing filter directives.

use super::levels::{Subsystem, SubsystemLevels};

/// Combined verbosity configuration for every subsystem.
#[derive(Clone, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VerbosityConfig {
    /// Per-subsystem levels.
    pub levels: SubsystemLevels,
}

impl VerbosityConfig {
    /// Create a configuration from a `-v` count.
    ///
    /// - 0: warnings and errors only, plus the batch summary.
    /// - 1: per-record outcomes and ownership changes.
    /// - 2: timestamp writes, ACL merges, privilege scopes.
    /// - 3+: every dedup decision in the ancestor walk.
    pub fn from_verbose_level(level: u8) -> Self {
        let mut config = Self::default();
        config.levels.batch = 1;

        if level >= 1 {
            config.levels.owner = 1;
            config.levels.batch = 2;
        }
        if level >= 2 {
            config.levels.times = 2;
            config.levels.owner = 2;
            config.levels.acl = 2;
            config.levels.privilege = 2;
            config.levels.walk = 1;
        }
        if level >= 3 {
            for subsystem in Subsystem::ALL {
                config.levels.set(subsystem, 3);
            }
        }

        config
    }

    /// Renders the configuration as an `EnvFilter` directive string.
    ///
    /// The global default is `warn`; each subsystem with a non-zero level gets
    /// its own `target=level` directive.
    #[must_use]
    pub fn filter_directives(&self) -> String {
        let mut directives = String::from("warn");
        for subsystem in Subsystem::ALL {
            let level = match self.levels.get(subsystem) {
                0 => continue,
                1 => "info",
                2 => "debug",
                _ => "trace",
            };
            directives.push(',');
            directives.push_str(subsystem.target());
            directives.push('=');
            directives.push_str(level);
        }
        directives
    }
}
