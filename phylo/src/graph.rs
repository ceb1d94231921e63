//! Family graph facade
//!
//! Ties the store, the kinship index cache, the inference engine, the policy
//! validator and the mutation guard together behind one async API.

use lru::LruCache;
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, instrument};

use crate::config::GraphConfig;
use crate::guard::{CommitReceipt, MutationGuard};
use crate::inference::{RelationshipEngine, RelationshipResult};
use crate::kinship::KinshipIndex;
use crate::models::{MemberId, RelationshipEdge, TreeId, TreeSettings};
use crate::policy::SettingsPreview;
use crate::storage::GraphStore;
use crate::Result;

/// Counters describing the index cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub capacity: usize,
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
}

/// Kinship indexes keyed by tree and revision.
///
/// An index is immutable, so an entry stays valid for as long as the tree's
/// revision does not move. Older revisions of a tree are dropped when a newer
/// one is cached.
#[derive(Debug)]
pub struct IndexCache {
    entries: Mutex<LruCache<(TreeId, u64), Arc<KinshipIndex>>>,
    capacity: usize,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl IndexCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            capacity: capacity.get(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub async fn get(&self, tree_id: &TreeId, revision: u64) -> Option<Arc<KinshipIndex>> {
        let mut entries = self.entries.lock().await;
        let found = entries.get(&(tree_id.clone(), revision)).cloned();
        let counter = if found.is_some() { &self.hits } else { &self.misses };
        counter.fetch_add(1, Ordering::Relaxed);
        found
    }

    pub async fn insert(&self, tree_id: &TreeId, revision: u64, index: Arc<KinshipIndex>) {
        let mut entries = self.entries.lock().await;
        let stale: Vec<(TreeId, u64)> = entries
            .iter()
            .filter(|((tree, rev), _)| tree == tree_id && *rev < revision)
            .map(|(key, _)| key.clone())
            .collect();
        for key in stale {
            entries.pop(&key);
        }
        entries.put((tree_id.clone(), revision), index);
    }

    /// Drop every cached index of the tree
    pub async fn invalidate(&self, tree_id: &TreeId) {
        let mut entries = self.entries.lock().await;
        let keys: Vec<(TreeId, u64)> = entries
            .iter()
            .filter(|((tree, _), _)| tree == tree_id)
            .map(|(key, _)| key.clone())
            .collect();
        for key in keys {
            entries.pop(&key);
        }
    }

    pub async fn stats(&self) -> CacheStats {
        CacheStats {
            capacity: self.capacity,
            entries: self.entries.lock().await.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

/// Relationship queries, settings previews and guarded mutations for every
/// tree in a store.
#[derive(Debug)]
pub struct FamilyGraph {
    store: Arc<dyn GraphStore>,
    guard: MutationGuard,
    cache: IndexCache,
}

impl FamilyGraph {
    pub fn new(store: Arc<dyn GraphStore>, config: &GraphConfig) -> Self {
        let guard = MutationGuard::new(
            store.clone(),
            Duration::from_millis(config.lock_timeout_ms),
        );
        Self {
            store,
            guard,
            cache: IndexCache::new(config.index_cache_size),
        }
    }

    pub fn store(&self) -> &Arc<dyn GraphStore> {
        &self.store
    }

    pub fn guard(&self) -> &MutationGuard {
        &self.guard
    }

    /// Index of the tree at its current revision, built on a cache miss
    pub async fn kinship_index(&self, tree_id: &TreeId) -> Result<Arc<KinshipIndex>> {
        let revision = self.store.revision(tree_id).await?;
        if let Some(index) = self.cache.get(tree_id, revision).await {
            return Ok(index);
        }

        let snapshot = self.store.snapshot(tree_id).await?;
        let index = Arc::new(KinshipIndex::from_snapshot(&snapshot));
        debug!(
            tree_id = %tree_id,
            revision = snapshot.revision,
            members = index.member_count(),
            edges = index.edge_count(),
            "built kinship index"
        );
        self.cache
            .insert(tree_id, snapshot.revision, index.clone())
            .await;
        Ok(index)
    }

    /// What `to` is to `from`
    #[instrument(skip(self, tree_id), fields(tree_id = %tree_id), level = "debug")]
    pub async fn infer_relationship(
        &self,
        tree_id: &TreeId,
        from: &MemberId,
        to: &MemberId,
    ) -> Result<RelationshipResult> {
        let index = self.kinship_index(tree_id).await?;
        RelationshipEngine::new(&index).infer(from, to)
    }

    /// Validate `proposed` against the tree without changing anything.
    ///
    /// Only the live graph is checked here; internal consistency of
    /// `proposed` is enforced when the settings are applied.
    #[instrument(skip(self, tree_id, proposed), fields(tree_id = %tree_id), level = "debug")]
    pub async fn preview_settings_change(
        &self,
        tree_id: &TreeId,
        proposed: TreeSettings,
    ) -> Result<SettingsPreview> {
        let current = self.store.get_settings(tree_id).await?;
        let index = self.kinship_index(tree_id).await?;
        let preview = SettingsPreview::build(tree_id.clone(), &index, current, proposed);

        debug!(
            can_apply = preview.can_apply,
            violations = preview.violations.len(),
            "previewed settings change"
        );
        Ok(preview)
    }

    pub async fn apply_settings_change(
        &self,
        tree_id: &TreeId,
        proposed: TreeSettings,
    ) -> Result<TreeSettings> {
        self.guard.apply_settings(tree_id, proposed).await
    }

    pub async fn add_spouse_edge(
        &self,
        tree_id: &TreeId,
        a: &MemberId,
        b: &MemberId,
    ) -> Result<CommitReceipt> {
        self.guard.add_spouse_edge(tree_id, a, b).await
    }

    pub async fn add_parent_child_edge(
        &self,
        tree_id: &TreeId,
        parent: &MemberId,
        child: &MemberId,
    ) -> Result<CommitReceipt> {
        self.guard.add_parent_child_edge(tree_id, parent, child).await
    }

    pub async fn add_parent_child_edges(
        &self,
        tree_id: &TreeId,
        parent: &MemberId,
        child: &MemberId,
        second_parent: Option<&MemberId>,
    ) -> Result<CommitReceipt> {
        self.guard
            .add_parent_child_edges(tree_id, parent, child, second_parent)
            .await
    }

    pub async fn remove_edge(
        &self,
        tree_id: &TreeId,
        edge: &RelationshipEdge,
    ) -> Result<CommitReceipt> {
        self.guard.remove_edge(tree_id, edge).await
    }

    /// Forget cached indexes of a tree changed outside this graph's store
    /// revision tracking
    pub async fn invalidate(&self, tree_id: &TreeId) {
        self.cache.invalidate(tree_id).await;
    }

    pub async fn cache_stats(&self) -> CacheStats {
        self.cache.stats().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Member;
    use crate::PhyloError;
    use crate::storage::InMemoryGraphStore;

    async fn family() -> (Arc<InMemoryGraphStore>, FamilyGraph, TreeId) {
        let store = Arc::new(InMemoryGraphStore::new());
        let tree = store.create_tree("Cache").await;
        for id in ["p", "c1", "c2"] {
            store
                .add_member(Member::new(id, tree.clone(), id.to_uppercase()))
                .await
                .unwrap();
        }
        let graph = FamilyGraph::new(store.clone(), &GraphConfig::default());
        (store, graph, tree)
    }

    #[tokio::test]
    async fn test_index_is_cached_per_revision() {
        let (_, graph, tree) = family().await;

        let first = graph.kinship_index(&tree).await.unwrap();
        let second = graph.kinship_index(&tree).await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        let stats = graph.cache_stats().await;
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.entries, 1);
    }

    #[tokio::test]
    async fn test_mutation_moves_revision_and_replaces_entry() {
        let (_, graph, tree) = family().await;
        graph.kinship_index(&tree).await.unwrap();

        graph
            .add_parent_child_edge(&tree, &"p".into(), &"c1".into())
            .await
            .unwrap();
        let index = graph.kinship_index(&tree).await.unwrap();
        assert_eq!(index.edge_count(), 1);

        let stats = graph.cache_stats().await;
        assert_eq!(stats.misses, 2);
        assert_eq!(stats.entries, 1);
    }

    #[tokio::test]
    async fn test_infer_and_preview() {
        let (_, graph, tree) = family().await;
        graph
            .add_parent_child_edge(&tree, &"p".into(), &"c1".into())
            .await
            .unwrap();
        graph
            .add_parent_child_edge(&tree, &"p".into(), &"c2".into())
            .await
            .unwrap();

        let result = graph
            .infer_relationship(&tree, &"c1".into(), &"c2".into())
            .await
            .unwrap();
        assert_eq!(result.relationship, "sibling (full)");
        assert_eq!(result.path_names, vec!["C1", "P", "C2"]);

        let proposed = TreeSettings {
            allow_single_parent: false,
            ..TreeSettings::default()
        };
        let preview = graph.preview_settings_change(&tree, proposed).await.unwrap();
        assert!(!preview.can_apply);
        assert_eq!(preview.violations[0].affected, vec!["C1", "C2"]);
    }

    #[tokio::test]
    async fn test_preview_allows_enabling_polygamy_from_defaults() {
        let (store, graph, tree) = family().await;
        let current = store.get_settings(&tree).await.unwrap();
        assert_eq!(current, TreeSettings::default());

        let proposed = TreeSettings {
            allow_polygamy: true,
            ..current
        };
        let preview = graph.preview_settings_change(&tree, proposed).await.unwrap();
        assert!(preview.can_apply);
        assert!(preview.violations.is_empty());

        // Applying the same proposal is still refused as inconsistent
        let applied = graph
            .apply_settings_change(&tree, preview.proposed.clone())
            .await;
        assert!(matches!(applied, Err(PhyloError::InvalidSettings(_))));
    }

    #[tokio::test]
    async fn test_cache_capacity_evicts_least_recent() {
        let store = Arc::new(InMemoryGraphStore::new());
        let trees = [
            store.create_tree("one").await,
            store.create_tree("two").await,
            store.create_tree("three").await,
        ];
        let config = GraphConfig {
            index_cache_size: 2,
            ..GraphConfig::default()
        };
        let graph = FamilyGraph::new(store, &config);

        for tree in &trees {
            graph.kinship_index(tree).await.unwrap();
        }
        let stats = graph.cache_stats().await;
        assert_eq!(stats.capacity, 2);
        assert_eq!(stats.entries, 2);

        graph.invalidate(&trees[2]).await;
        assert_eq!(graph.cache_stats().await.entries, 1);
    }

    #[tokio::test]
    async fn test_unknown_tree() {
        let (_, graph, _) = family().await;
        let result = graph
            .infer_relationship(&TreeId::from("nope"), &"p".into(), &"c1".into())
            .await;
        assert!(matches!(result, Err(PhyloError::NotFound(_))));
    }
}
