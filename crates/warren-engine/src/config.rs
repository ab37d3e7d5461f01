//! World configuration, validation, and error types.
//!
//! [`WorldConfig`] is the constructor input for a
//! [`NavWorld`](crate::NavWorld). [`validate()`](WorldConfig::validate)
//! checks both halves before any worker thread is spawned.

use std::error::Error;
use std::fmt;

use warren_hierarchy::{HierarchyConfig, HierarchyError};
use warren_jobs::{PoolError, TrackerConfig};

/// Complete configuration for a [`NavWorld`](crate::NavWorld).
#[derive(Clone, Debug, Default)]
pub struct WorldConfig {
    /// Dependency tracker and worker pool.
    pub tracker: TrackerConfig,
    /// Cluster sizing for the connectivity hierarchy.
    pub hierarchy: HierarchyConfig,
}

impl WorldConfig {
    /// A config that runs every job inline on the calling thread.
    pub fn linear() -> Self {
        Self {
            tracker: TrackerConfig::linear(),
            hierarchy: HierarchyConfig::default(),
        }
    }

    /// Check structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.tracker.validate()?;
        self.hierarchy.validate()?;
        Ok(())
    }
}

/// Errors detected while validating or applying a [`WorldConfig`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// Worker pool configuration rejected or pool start-up failed.
    Pool(PoolError),
    /// Hierarchy configuration rejected.
    Hierarchy(HierarchyError),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pool(e) => write!(f, "worker pool: {e}"),
            Self::Hierarchy(e) => write!(f, "hierarchy: {e}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Pool(e) => Some(e),
            Self::Hierarchy(e) => Some(e),
        }
    }
}

impl From<PoolError> for ConfigError {
    fn from(e: PoolError) -> Self {
        Self::Pool(e)
    }
}

impl From<HierarchyError> for ConfigError {
    fn from(e: HierarchyError) -> Self {
        Self::Hierarchy(e)
    }
}
