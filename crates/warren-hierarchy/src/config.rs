//! Hierarchy configuration and errors.

use std::error::Error;
use std::fmt;

/// Configuration for a [`HierarchicalGraph`](crate::HierarchicalGraph).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HierarchyConfig {
    /// Maximum number of fine-grained nodes per cluster. Default: 256
    /// (a 16x16 tile of a grid).
    pub max_children_per_node: usize,
}

impl HierarchyConfig {
    /// Default child limit.
    pub const DEFAULT_MAX_CHILDREN: usize = 256;

    /// Smallest accepted child limit. Below this the half-capacity
    /// cascade threshold would be zero.
    pub const MIN_CHILDREN: usize = 2;

    /// Check structural invariants.
    pub fn validate(&self) -> Result<(), HierarchyError> {
        if self.max_children_per_node < Self::MIN_CHILDREN {
            return Err(HierarchyError::InvalidChildLimit {
                value: self.max_children_per_node,
                min: Self::MIN_CHILDREN,
            });
        }
        Ok(())
    }

    /// Clusters smaller than this are torn down alongside a dirty
    /// neighbour.
    pub(crate) fn cascade_threshold(&self) -> usize {
        self.max_children_per_node / 2
    }
}

impl Default for HierarchyConfig {
    fn default() -> Self {
        Self {
            max_children_per_node: Self::DEFAULT_MAX_CHILDREN,
        }
    }
}

/// Errors from hierarchy construction and consistency checks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HierarchyError {
    /// `max_children_per_node` is below [`HierarchyConfig::MIN_CHILDREN`].
    InvalidChildLimit {
        /// The configured limit.
        value: usize,
        /// The smallest accepted limit.
        min: usize,
    },
    /// Cluster bookkeeping disagrees with the host graph.
    Inconsistent {
        /// What disagreed.
        reason: String,
    },
}

impl fmt::Display for HierarchyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidChildLimit { value, min } => {
                write!(f, "max_children_per_node {value} is below minimum of {min}")
            }
            Self::Inconsistent { reason } => write!(f, "hierarchy inconsistent: {reason}"),
        }
    }
}

impl Error for HierarchyError {}
