//! Trait definitions for the graph store adapter

use async_trait::async_trait;
use std::fmt::Debug;

use crate::models::{Member, RelationshipEdge, TreeId, TreeSettings};
use crate::storage::errors::StorageResult;
use crate::storage::models::TreeSnapshot;

/// Narrow access to the members, edges and settings of a tree.
///
/// Writes take the revision the caller read and fail with
/// [`StorageError::Conflict`](crate::storage::StorageError::Conflict) when the
/// tree moved on in between, so a write is only ever applied against the
/// state it was validated against.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GraphStore: Send + Sync + Debug + 'static {
    /// Current revision of the tree
    async fn revision(&self, tree_id: &TreeId) -> StorageResult<u64>;

    /// All members of the tree
    async fn list_members(&self, tree_id: &TreeId) -> StorageResult<Vec<Member>>;

    /// All relationship edges of the tree
    async fn list_edges(&self, tree_id: &TreeId) -> StorageResult<Vec<RelationshipEdge>>;

    /// Current structural settings of the tree
    async fn get_settings(&self, tree_id: &TreeId) -> StorageResult<TreeSettings>;

    /// Insert edges atomically; returns the new revision
    async fn insert_edges(
        &self,
        tree_id: &TreeId,
        edges: Vec<RelationshipEdge>,
        expected_revision: u64,
    ) -> StorageResult<u64>;

    /// Delete one edge; returns the new revision
    async fn delete_edge(
        &self,
        tree_id: &TreeId,
        edge: RelationshipEdge,
        expected_revision: u64,
    ) -> StorageResult<u64>;

    /// Replace the tree's settings; returns the new revision
    async fn set_settings(
        &self,
        tree_id: &TreeId,
        settings: TreeSettings,
        expected_revision: u64,
    ) -> StorageResult<u64>;

    /// Read members, edges, settings and revision together.
    ///
    /// The default composes the individual reads; implementations that can
    /// read under one lock or transaction should override it.
    async fn snapshot(&self, tree_id: &TreeId) -> StorageResult<TreeSnapshot> {
        let revision = self.revision(tree_id).await?;
        let settings = self.get_settings(tree_id).await?;
        let members = self.list_members(tree_id).await?;
        let edges = self.list_edges(tree_id).await?;
        Ok(TreeSnapshot {
            tree_id: tree_id.clone(),
            revision,
            settings,
            members,
            edges,
        })
    }
}
