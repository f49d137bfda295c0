//! crates/logging/src/levels.rs
//! Subsystems and their per-subsystem verbosity levels.

/// Diagnostic categories emitted by the restoration core.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Subsystem {
    /// Timestamp reads and writes.
    Times,
    /// Owner and group changes.
    Owner,
    /// Discretionary ACL merges.
    Acl,
    /// Ancestor-chain walking and dedup decisions.
    Walk,
    /// Privilege elevation and release.
    Privilege,
    /// Per-record batch progress and summaries.
    Batch,
}

impl Subsystem {
    /// Every subsystem, in display order.
    pub const ALL: [Self; 6] = [
        Self::Times,
        Self::Owner,
        Self::Acl,
        Self::Walk,
        Self::Privilege,
        Self::Batch,
    ];

    /// Returns the tracing target used for events of this subsystem.
    #[must_use]
    pub const fn target(self) -> &'static str {
        match self {
            Self::Times => "metarestore::times",
            Self::Owner => "metarestore::owner",
            Self::Acl => "metarestore::acl",
            Self::Walk => "metarestore::walk",
            Self::Privilege => "metarestore::privilege",
            Self::Batch => "metarestore::batch",
        }
    }

    /// Parses a subsystem from its short name (`times`, `owner`, ...).
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|subsystem| subsystem.target().rsplit("::").next() == Some(name))
    }
}

/// Verbosity level per subsystem.
///
/// Level 0 keeps only warnings and errors, 1 adds `info`, 2 adds `debug`,
/// and 3 or more adds `trace`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
pub struct SubsystemLevels {
    /// Timestamp reads and writes.
    pub times: u8,
    /// Owner and group changes.
    pub owner: u8,
    /// Discretionary ACL merges.
    pub acl: u8,
    /// Ancestor walking.
    pub walk: u8,
    /// Privilege elevation.
    pub privilege: u8,
    /// Batch progress.
    pub batch: u8,
}

impl SubsystemLevels {
    /// Returns the level configured for `subsystem`.
    #[must_use]
    pub const fn get(&self, subsystem: Subsystem) -> u8 {
        match subsystem {
            Subsystem::Times => self.times,
            Subsystem::Owner => self.owner,
            Subsystem::Acl => self.acl,
            Subsystem::Walk => self.walk,
            Subsystem::Privilege => self.privilege,
            Subsystem::Batch => self.batch,
        }
    }

    /// Sets the level for `subsystem`.
    pub fn set(&mut self, subsystem: Subsystem, level: u8) {
        let slot = match subsystem {
            Subsystem::Times => &mut self.times,
            Subsystem::Owner => &mut self.owner,
            Subsystem::Acl => &mut self.acl,
            Subsystem::Walk => &mut self.walk,
            Subsystem::Privilege => &mut self.privilege,
            Subsystem::Batch => &mut self.batch,
        };
        *slot = level;
    }

    /// Raises every subsystem to at least the level in `other`.
    pub fn raise_to(&mut self, other: &Self) {
        for subsystem in Subsystem::ALL {
            let level = self.get(subsystem).max(other.get(subsystem));
            self.set(subsystem, level);
        }
    }
}
