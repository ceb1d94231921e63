//! # Phylo
//!
//! Kinship graph engine for family trees. Phylo answers "what is B to A"
//! for any two members of a tree, with a natural-language label and the
//! path through the tree, and enforces each tree's structural policy
//! (monogamy, same-sex unions, parent counts) on every edge write and
//! settings change.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use phylo::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let phylo = init_with_defaults()?;
//!     let tree = phylo.create_tree("Lovelace").await;
//!
//!     for (id, name) in [("ada", "Ada"), ("byron", "Lord Byron")] {
//!         phylo.add_member(Member::new(id, tree.clone(), name)).await?;
//!     }
//!     phylo
//!         .graph()
//!         .add_parent_child_edge(&tree, &"byron".into(), &"ada".into())
//!         .await?;
//!
//!     let result = phylo
//!         .graph()
//!         .infer_relationship(&tree, &"ada".into(), &"byron".into())
//!         .await?;
//!     assert_eq!(result.relationship, "parent");
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - **Kinship index**: adjacency sets and breadth-first ancestor distances,
//!   built per tree revision and cached.
//! - **Inference**: blood relationships through the nearest common ancestor,
//!   then in-law and step relationships.
//! - **Policy**: validates settings changes against the live graph.
//! - **Guard**: serializes writes per tree and re-checks them against a fresh
//!   snapshot before an optimistic commit.
//!
//! Storage is reached only through the [`storage::GraphStore`] trait.

pub mod config;
pub mod embedded;
pub mod graph;
pub mod guard;
pub mod inference;
pub mod kinship;
pub mod logging;
pub mod models;
pub mod policy;
pub mod storage;

/// The prelude re-exports commonly used types for convenience
pub mod prelude {
    pub use crate::{init, init_with_defaults};

    pub use crate::config::{ConfigBuilder, ConfigLoader, LogFormat, LogLevel, PhyloConfig};

    pub use crate::embedded::Phylo;
    pub use crate::graph::{CacheStats, FamilyGraph};
    pub use crate::guard::CommitReceipt;
    pub use crate::inference::{Kinship, RelationshipResult};

    pub use crate::models::{
        GenderCategory, Member, MemberId, RelationshipEdge, TreeId, TreeSettings,
    };

    pub use crate::policy::{SettingsPreview, Violation, ViolationKind};

    pub use crate::storage::{GraphStore, InMemoryGraphStore, StorageError};

    pub use crate::{PhyloError, Result};
}

/// Current library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

use crate::models::MemberId;
use crate::policy::Violation;

/// Error type for Phylo operations
#[derive(Debug, thiserror::Error)]
pub enum PhyloError {
    /// A member, edge or tree does not exist in the given tree
    #[error("Not found: {0}")]
    NotFound(String),

    /// An operation targets a member against itself
    #[error("Self reference: {0}")]
    SelfReference(String),

    /// The edge already exists
    #[error("Duplicate edge: {0}")]
    DuplicateEdge(String),

    /// The parent-child edge would make a member its own ancestor
    #[error("Cycle: {child} is already an ancestor of {parent}")]
    Cycle { parent: MemberId, child: MemberId },

    /// Every tree policy the operation would break
    #[error("Policy violation: {}", join_messages(.0))]
    PolicyViolation(Vec<Violation>),

    /// The tree changed or was locked while the operation ran; retry
    #[error("Concurrent modification: {0}")]
    ConcurrentModification(String),

    /// Settings are internally inconsistent
    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    /// Error during storage operations
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Logging error
    #[error("Logging error: {0}")]
    Logging(#[from] crate::logging::LogError),
}

impl PhyloError {
    /// Violations carried by a policy error
    pub fn violations(&self) -> &[Violation] {
        match self {
            PhyloError::PolicyViolation(violations) => violations,
            _ => &[],
        }
    }

    /// Whether retrying the same call may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, PhyloError::ConcurrentModification(_))
    }
}

fn join_messages(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(|v| v.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type for Phylo operations
pub type Result<T> = std::result::Result<T, PhyloError>;

/// Initialize Phylo with configuration loaded from the default files and
/// `PHYLO_` environment variables.
pub fn init_with_defaults() -> Result<embedded::Phylo> {
    let config = config::ConfigLoader::load()?;
    init(config)
}

/// Initialize logging and build an in-memory family graph from `config`.
pub fn init(config: config::PhyloConfig) -> Result<embedded::Phylo> {
    config::validate_config(&config)?;
    logging::init(&config.logging)?;
    Ok(embedded::Phylo::new(config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::ViolationKind;

    #[test]
    fn test_policy_violation_display_joins_messages() {
        let err = PhyloError::PolicyViolation(vec![
            Violation::new(ViolationKind::Monogamy, "first"),
            Violation::new(ViolationKind::SameSex, "second"),
        ]);
        assert_eq!(err.to_string(), "Policy violation: first; second");
        assert_eq!(err.violations().len(), 2);
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_cycle_display() {
        let err = PhyloError::Cycle {
            parent: "p".into(),
            child: "c".into(),
        };
        assert_eq!(err.to_string(), "Cycle: c is already an ancestor of p");
        assert!(PhyloError::ConcurrentModification("x".into()).is_retryable());
    }

    #[tokio::test]
    async fn test_init_builds_graph() {
        use crate::storage::GraphStore;

        let config = config::ConfigBuilder::testing().build().unwrap();
        let phylo = init(config).unwrap();
        let tree = phylo.create_tree("Init").await;
        assert_eq!(
            phylo.store().get_settings(&tree).await.unwrap(),
            crate::models::TreeSettings::default()
        );
    }

    #[test]
    fn test_init_rejects_invalid_config() {
        let mut config = config::PhyloConfig::default();
        config.graph.index_cache_size = 0;
        assert!(matches!(init(config), Err(PhyloError::Configuration(_))));
    }
}
