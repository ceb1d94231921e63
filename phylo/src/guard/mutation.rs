//! Transactional edge and settings writes

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OwnedMutexGuard;
use tracing::{info, instrument, warn};

use super::checks::{check_parent_child, check_spouse};
use super::locks::TreeLocks;
use crate::kinship::KinshipIndex;
use crate::models::{MemberId, RelationshipEdge, TreeId, TreeSettings};
use crate::policy::PolicyValidator;
use crate::storage::{GraphStore, TreeSnapshot};
use crate::{PhyloError, Result};

/// What a successful edge mutation wrote
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitReceipt {
    pub tree_id: TreeId,
    /// Tree revision after the write
    pub revision: u64,
    pub edges: Vec<RelationshipEdge>,
}

struct Prepared {
    _lock: OwnedMutexGuard<()>,
    snapshot: TreeSnapshot,
    index: KinshipIndex,
}

/// Serializes and validates every write to a tree.
///
/// Each mutation takes the tree's lock, reads a fresh snapshot, re-runs the
/// forward checks on it and commits against the snapshot's revision. A
/// failed check or a moved revision aborts with no write.
#[derive(Debug)]
pub struct MutationGuard {
    store: Arc<dyn GraphStore>,
    locks: TreeLocks,
    lock_timeout: Duration,
}

impl MutationGuard {
    pub fn new(store: Arc<dyn GraphStore>, lock_timeout: Duration) -> Self {
        Self {
            store,
            locks: TreeLocks::new(),
            lock_timeout,
        }
    }

    async fn prepare(&self, tree_id: &TreeId) -> Result<Prepared> {
        let lock = self.locks.acquire(tree_id, self.lock_timeout).await?;
        let snapshot = self.store.snapshot(tree_id).await?;
        let index = KinshipIndex::from_snapshot(&snapshot);
        Ok(Prepared {
            _lock: lock,
            snapshot,
            index,
        })
    }

    async fn commit_edges(
        &self,
        snapshot: &TreeSnapshot,
        edges: Vec<RelationshipEdge>,
    ) -> Result<CommitReceipt> {
        let revision = self
            .store
            .insert_edges(&snapshot.tree_id, edges.clone(), snapshot.revision)
            .await?;
        Ok(CommitReceipt {
            tree_id: snapshot.tree_id.clone(),
            revision,
            edges,
        })
    }

    #[instrument(skip(self, tree_id), fields(tree_id = %tree_id))]
    pub async fn add_spouse_edge(
        &self,
        tree_id: &TreeId,
        a: &MemberId,
        b: &MemberId,
    ) -> Result<CommitReceipt> {
        let result = async {
            let prepared = self.prepare(tree_id).await?;
            check_spouse(&prepared.index, &prepared.snapshot.settings, a, b)?;
            self.commit_edges(&prepared.snapshot, vec![RelationshipEdge::spouse(a.clone(), b.clone())])
                .await
        }
        .await;

        match &result {
            Ok(receipt) => info!(revision = receipt.revision, "spouse edge added"),
            Err(e) => warn!(error = %e, "spouse edge rejected"),
        }
        result
    }

    pub async fn add_parent_child_edge(
        &self,
        tree_id: &TreeId,
        parent: &MemberId,
        child: &MemberId,
    ) -> Result<CommitReceipt> {
        self.add_parent_child_edges(tree_id, parent, child, None).await
    }

    /// Add one or two parents of `child` atomically; counts and checks
    /// consider both parents together.
    #[instrument(skip(self, tree_id), fields(tree_id = %tree_id))]
    pub async fn add_parent_child_edges(
        &self,
        tree_id: &TreeId,
        parent: &MemberId,
        child: &MemberId,
        second_parent: Option<&MemberId>,
    ) -> Result<CommitReceipt> {
        let parents: Vec<MemberId> = std::iter::once(parent)
            .chain(second_parent)
            .cloned()
            .collect();

        let result = async {
            let prepared = self.prepare(tree_id).await?;
            check_parent_child(&prepared.index, &prepared.snapshot.settings, &parents, child)?;
            let edges = parents
                .iter()
                .map(|p| RelationshipEdge::parent_child(p.clone(), child.clone()))
                .collect();
            self.commit_edges(&prepared.snapshot, edges).await
        }
        .await;

        match &result {
            Ok(receipt) => info!(
                revision = receipt.revision,
                parents = parents.len(),
                "parent edges added"
            ),
            Err(e) => warn!(error = %e, "parent edges rejected"),
        }
        result
    }

    /// Remove an existing edge. Removals only lower counts, so no policy is
    /// checked; a child left with one parent where that is disallowed is
    /// logged.
    #[instrument(skip(self, tree_id, edge), fields(tree_id = %tree_id, edge = %edge))]
    pub async fn remove_edge(
        &self,
        tree_id: &TreeId,
        edge: &RelationshipEdge,
    ) -> Result<CommitReceipt> {
        let result = async {
            let prepared = self.prepare(tree_id).await?;
            if !prepared.index.has_edge(edge) {
                return Err(PhyloError::NotFound(format!("edge {}", edge)));
            }

            if let RelationshipEdge::ParentChild { child, .. } = edge {
                if !prepared.snapshot.settings.allow_single_parent
                    && prepared.index.parent_count(child) == 2
                {
                    warn!(child = %child, "removal leaves a child with a single parent");
                }
            }

            let revision = self
                .store
                .delete_edge(tree_id, edge.clone(), prepared.snapshot.revision)
                .await?;
            Ok(CommitReceipt {
                tree_id: tree_id.clone(),
                revision,
                edges: vec![edge.clone()],
            })
        }
        .await;

        match &result {
            Ok(receipt) => info!(revision = receipt.revision, "edge removed"),
            Err(e) => warn!(error = %e, "edge removal rejected"),
        }
        result
    }

    /// Replace the tree's settings if the live graph satisfies them
    #[instrument(skip(self, tree_id, proposed), fields(tree_id = %tree_id))]
    pub async fn apply_settings(
        &self,
        tree_id: &TreeId,
        proposed: TreeSettings,
    ) -> Result<TreeSettings> {
        proposed.validate().map_err(PhyloError::InvalidSettings)?;

        let prepared = self.prepare(tree_id).await?;
        let report =
            PolicyValidator::validate(&prepared.index, &prepared.snapshot.settings, &proposed);
        if !report.is_valid {
            warn!(
                violations = report.violations.len(),
                "settings change rejected"
            );
            return Err(PhyloError::PolicyViolation(report.violations));
        }

        let revision = self
            .store
            .set_settings(tree_id, proposed.clone(), prepared.snapshot.revision)
            .await?;
        info!(revision, "settings applied");
        Ok(proposed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Member;
    use crate::policy::ViolationKind;
    use crate::storage::{InMemoryGraphStore, MockGraphStore, StorageError};

    async fn setup(settings: TreeSettings) -> (Arc<InMemoryGraphStore>, MutationGuard, TreeId) {
        let store = Arc::new(InMemoryGraphStore::new());
        let tree = store.create_tree_with_settings("Test", settings).await;
        for (id, gender) in [("a", "male"), ("b", "female"), ("c", "female"), ("k", "")] {
            store
                .add_member(Member::new(id, tree.clone(), id.to_uppercase()).with_gender(gender))
                .await
                .unwrap();
        }
        let guard = MutationGuard::new(store.clone(), Duration::from_millis(200));
        (store, guard, tree)
    }

    fn id(s: &str) -> MemberId {
        MemberId::from(s)
    }

    #[tokio::test]
    async fn test_add_spouse_commits() {
        let (store, guard, tree) = setup(TreeSettings::default()).await;
        let before = store.revision(&tree).await.unwrap();

        let receipt = guard.add_spouse_edge(&tree, &id("a"), &id("b")).await.unwrap();
        assert_eq!(receipt.revision, before + 1);
        assert_eq!(receipt.edges, vec![RelationshipEdge::spouse("a", "b")]);
        assert_eq!(store.list_edges(&tree).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_rejected_spouse_leaves_graph_unchanged() {
        let (store, guard, tree) = setup(TreeSettings::default()).await;
        guard.add_spouse_edge(&tree, &id("a"), &id("b")).await.unwrap();
        let revision = store.revision(&tree).await.unwrap();

        let err = guard.add_spouse_edge(&tree, &id("a"), &id("c")).await.unwrap_err();
        assert!(matches!(
            err,
            PhyloError::PolicyViolation(ref v) if v[0].kind == ViolationKind::Monogamy
        ));
        assert_eq!(store.revision(&tree).await.unwrap(), revision);
        assert_eq!(store.list_edges(&tree).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_cycle_rejected_without_write() {
        let (store, guard, tree) = setup(TreeSettings::permissive()).await;
        guard.add_parent_child_edge(&tree, &id("a"), &id("b")).await.unwrap();
        guard.add_parent_child_edge(&tree, &id("b"), &id("c")).await.unwrap();

        let err = guard
            .add_parent_child_edge(&tree, &id("c"), &id("a"))
            .await
            .unwrap_err();
        assert!(matches!(err, PhyloError::Cycle { .. }));
        assert_eq!(store.list_edges(&tree).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_two_parents_added_together() {
        let settings = TreeSettings {
            allow_single_parent: false,
            ..TreeSettings::default()
        };
        let (store, guard, tree) = setup(settings).await;

        let single = guard.add_parent_child_edge(&tree, &id("a"), &id("k")).await;
        assert!(matches!(single, Err(PhyloError::PolicyViolation(_))));

        let receipt = guard
            .add_parent_child_edges(&tree, &id("a"), &id("k"), Some(&id("b")))
            .await
            .unwrap();
        assert_eq!(receipt.edges.len(), 2);
        assert_eq!(store.list_edges(&tree).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_remove_edge() {
        let (store, guard, tree) = setup(TreeSettings::default()).await;
        guard.add_spouse_edge(&tree, &id("a"), &id("b")).await.unwrap();

        let missing = guard
            .remove_edge(&tree, &RelationshipEdge::spouse("a", "c"))
            .await;
        assert!(matches!(missing, Err(PhyloError::NotFound(_))));

        guard
            .remove_edge(&tree, &RelationshipEdge::spouse("b", "a"))
            .await
            .unwrap();
        assert!(store.list_edges(&tree).await.unwrap().is_empty());

        // monogamy no longer blocks a new spouse
        assert!(guard.add_spouse_edge(&tree, &id("a"), &id("c")).await.is_ok());
    }

    #[tokio::test]
    async fn test_apply_settings() {
        let (store, guard, tree) = setup(TreeSettings::permissive()).await;
        guard.add_spouse_edge(&tree, &id("a"), &id("b")).await.unwrap();
        guard.add_spouse_edge(&tree, &id("a"), &id("c")).await.unwrap();

        let inconsistent = TreeSettings {
            monogamy: true,
            allow_polygamy: true,
            ..TreeSettings::permissive()
        };
        assert!(matches!(
            guard.apply_settings(&tree, inconsistent).await,
            Err(PhyloError::InvalidSettings(_))
        ));

        let strict = TreeSettings::default();
        let err = guard.apply_settings(&tree, strict.clone()).await.unwrap_err();
        assert!(matches!(err, PhyloError::PolicyViolation(ref v) if v.len() == 1));
        assert_eq!(store.get_settings(&tree).await.unwrap(), TreeSettings::permissive());

        guard
            .remove_edge(&tree, &RelationshipEdge::spouse("a", "c"))
            .await
            .unwrap();
        let applied = guard.apply_settings(&tree, strict.clone()).await.unwrap();
        assert_eq!(applied, strict);
        assert_eq!(store.get_settings(&tree).await.unwrap(), strict);
    }

    #[tokio::test]
    async fn test_unknown_tree_is_not_found() {
        let (_, guard, _) = setup(TreeSettings::default()).await;
        let result = guard
            .add_spouse_edge(&TreeId::from("missing"), &id("a"), &id("b"))
            .await;
        assert!(matches!(result, Err(PhyloError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_stale_revision_is_concurrent_modification() {
        let tree = TreeId::from("t");
        let snapshot = TreeSnapshot {
            tree_id: tree.clone(),
            revision: 3,
            settings: TreeSettings::default(),
            members: vec![Member::new("a", "t", "A"), Member::new("b", "t", "B")],
            edges: vec![],
        };

        let mut store = MockGraphStore::new();
        store
            .expect_snapshot()
            .returning(move |_| Ok(snapshot.clone()));
        store
            .expect_insert_edges()
            .withf(|_, edges, expected| edges.len() == 1 && *expected == 3)
            .times(1)
            .returning(|_, _, _| {
                Err(StorageError::Conflict {
                    expected: 3,
                    actual: 4,
                })
            });

        let guard = MutationGuard::new(Arc::new(store), Duration::from_millis(100));
        let result = guard.add_spouse_edge(&tree, &id("a"), &id("b")).await;
        assert!(matches!(result, Err(PhyloError::ConcurrentModification(_))));
    }

    #[tokio::test]
    async fn test_lock_timeout_is_concurrent_modification() {
        let (_, guard, tree) = setup(TreeSettings::default()).await;
        let _held = guard
            .locks
            .acquire(&tree, Duration::from_millis(50))
            .await
            .unwrap();

        let result = guard.add_spouse_edge(&tree, &id("a"), &id("b")).await;
        assert!(matches!(result, Err(PhyloError::ConcurrentModification(_))));
    }

    #[tokio::test]
    async fn test_concurrent_spouse_adds_are_serialized() {
        let (store, guard, tree) = setup(TreeSettings::default()).await;
        let guard = Arc::new(guard);

        let first = {
            let guard = guard.clone();
            let tree = tree.clone();
            tokio::spawn(async move { guard.add_spouse_edge(&tree, &id("a"), &id("b")).await })
        };
        let second = {
            let guard = guard.clone();
            let tree = tree.clone();
            tokio::spawn(async move { guard.add_spouse_edge(&tree, &id("a"), &id("c")).await })
        };

        let results = [first.await.unwrap(), second.await.unwrap()];
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert_eq!(store.list_edges(&tree).await.unwrap().len(), 1);
    }
}
