//! Storage-level views of a tree

use crate::models::{Member, RelationshipEdge, TreeId, TreeSettings};
use serde::{Deserialize, Serialize};

/// Everything the kinship engine needs about one tree, read consistently.
///
/// `revision` increases with every committed edge or settings write and is
/// the token for optimistic commits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeSnapshot {
    pub tree_id: TreeId,
    pub revision: u64,
    pub settings: TreeSettings,
    pub members: Vec<Member>,
    pub edges: Vec<RelationshipEdge>,
}
