//! In-memory graph store
//!
//! Stands in for the persistence layer in embedded use and tests. Member and
//! tree CRUD live on the concrete type since they are not part of the
//! adapter trait.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;
use tracing::debug;

use crate::models::{Member, MemberId, Relationship, RelationshipEdge, TreeId, TreeSettings};
use crate::storage::errors::{StorageError, StorageResult};
use crate::storage::models::TreeSnapshot;
use crate::storage::traits::GraphStore;

#[derive(Debug)]
struct TreeRecord {
    name: String,
    settings: TreeSettings,
    members: BTreeMap<MemberId, Member>,
    relationships: Vec<Relationship>,
    revision: u64,
}

impl TreeRecord {
    fn check_revision(&self, expected: u64) -> StorageResult<()> {
        if self.revision != expected {
            return Err(StorageError::Conflict {
                expected,
                actual: self.revision,
            });
        }
        Ok(())
    }

    fn contains_edge(&self, edge: &RelationshipEdge) -> bool {
        self.relationships.iter().any(|r| r.edge.same_edge(edge))
    }
}

/// Tree records behind a single async read/write lock
#[derive(Debug, Default)]
pub struct InMemoryGraphStore {
    trees: RwLock<HashMap<TreeId, TreeRecord>>,
    default_settings: TreeSettings,
}

impl InMemoryGraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store whose new trees start from the given settings
    pub fn with_default_settings(settings: TreeSettings) -> Self {
        Self {
            trees: RwLock::new(HashMap::new()),
            default_settings: settings,
        }
    }

    /// Create a tree with the store's default settings
    pub async fn create_tree(&self, name: impl Into<String>) -> TreeId {
        let settings = self.default_settings.clone();
        self.create_tree_with_settings(name, settings).await
    }

    pub async fn create_tree_with_settings(
        &self,
        name: impl Into<String>,
        settings: TreeSettings,
    ) -> TreeId {
        let tree_id = TreeId::generate();
        let record = TreeRecord {
            name: name.into(),
            settings,
            members: BTreeMap::new(),
            relationships: Vec::new(),
            revision: 0,
        };
        debug!(tree_id = %tree_id, name = %record.name, "created tree");
        self.trees.write().await.insert(tree_id.clone(), record);
        tree_id
    }

    /// Add a member to the tree named by `member.tree_id`
    pub async fn add_member(&self, member: Member) -> StorageResult<Member> {
        let mut trees = self.trees.write().await;
        let record = trees
            .get_mut(&member.tree_id)
            .ok_or_else(|| StorageError::NotFound(format!("tree {}", member.tree_id)))?;

        if record.members.contains_key(&member.id) {
            return Err(StorageError::AlreadyExists(format!(
                "member {}",
                member.id
            )));
        }

        record.members.insert(member.id.clone(), member.clone());
        record.revision += 1;
        Ok(member)
    }

    /// Remove a member and every edge touching it
    pub async fn remove_member(&self, tree_id: &TreeId, member_id: &MemberId) -> StorageResult<bool> {
        let mut trees = self.trees.write().await;
        let record = trees
            .get_mut(tree_id)
            .ok_or_else(|| StorageError::NotFound(format!("tree {}", tree_id)))?;

        if record.members.remove(member_id).is_none() {
            return Ok(false);
        }
        record.relationships.retain(|r| !r.edge.involves(member_id));
        record.revision += 1;
        Ok(true)
    }

    /// Stored relationship rows, in insertion order
    pub async fn relationships(&self, tree_id: &TreeId) -> StorageResult<Vec<Relationship>> {
        let trees = self.trees.read().await;
        let record = Self::record(&trees, tree_id)?;
        Ok(record.relationships.clone())
    }

    fn record<'a>(
        trees: &'a HashMap<TreeId, TreeRecord>,
        tree_id: &TreeId,
    ) -> StorageResult<&'a TreeRecord> {
        trees
            .get(tree_id)
            .ok_or_else(|| StorageError::NotFound(format!("tree {}", tree_id)))
    }
}

#[async_trait]
impl GraphStore for InMemoryGraphStore {
    async fn revision(&self, tree_id: &TreeId) -> StorageResult<u64> {
        let trees = self.trees.read().await;
        Ok(Self::record(&trees, tree_id)?.revision)
    }

    async fn list_members(&self, tree_id: &TreeId) -> StorageResult<Vec<Member>> {
        let trees = self.trees.read().await;
        Ok(Self::record(&trees, tree_id)?.members.values().cloned().collect())
    }

    async fn list_edges(&self, tree_id: &TreeId) -> StorageResult<Vec<RelationshipEdge>> {
        let trees = self.trees.read().await;
        Ok(Self::record(&trees, tree_id)?
            .relationships
            .iter()
            .map(|r| r.edge.clone())
            .collect())
    }

    async fn get_settings(&self, tree_id: &TreeId) -> StorageResult<TreeSettings> {
        let trees = self.trees.read().await;
        Ok(Self::record(&trees, tree_id)?.settings.clone())
    }

    async fn insert_edges(
        &self,
        tree_id: &TreeId,
        edges: Vec<RelationshipEdge>,
        expected_revision: u64,
    ) -> StorageResult<u64> {
        let mut trees = self.trees.write().await;
        let record = trees
            .get_mut(tree_id)
            .ok_or_else(|| StorageError::NotFound(format!("tree {}", tree_id)))?;
        record.check_revision(expected_revision)?;

        // Validate the whole batch before writing any of it
        for (i, edge) in edges.iter().enumerate() {
            let (x, y) = edge.endpoints();
            for id in [x, y] {
                if !record.members.contains_key(id) {
                    return Err(StorageError::NotFound(format!("member {}", id)));
                }
            }
            if edge.is_self_referencing() {
                return Err(StorageError::Validation(format!("self-referencing edge {}", edge)));
            }
            if record.contains_edge(edge) || edges[..i].iter().any(|e| e.same_edge(edge)) {
                return Err(StorageError::AlreadyExists(format!("edge {}", edge)));
            }
        }

        for edge in edges {
            record
                .relationships
                .push(Relationship::new(tree_id.clone(), edge));
        }
        record.revision += 1;
        Ok(record.revision)
    }

    async fn delete_edge(
        &self,
        tree_id: &TreeId,
        edge: RelationshipEdge,
        expected_revision: u64,
    ) -> StorageResult<u64> {
        let mut trees = self.trees.write().await;
        let record = trees
            .get_mut(tree_id)
            .ok_or_else(|| StorageError::NotFound(format!("tree {}", tree_id)))?;
        record.check_revision(expected_revision)?;

        let position = record
            .relationships
            .iter()
            .position(|r| r.edge.same_edge(&edge))
            .ok_or_else(|| StorageError::NotFound(format!("edge {}", edge)))?;
        record.relationships.remove(position);
        record.revision += 1;
        Ok(record.revision)
    }

    async fn set_settings(
        &self,
        tree_id: &TreeId,
        settings: TreeSettings,
        expected_revision: u64,
    ) -> StorageResult<u64> {
        let mut trees = self.trees.write().await;
        let record = trees
            .get_mut(tree_id)
            .ok_or_else(|| StorageError::NotFound(format!("tree {}", tree_id)))?;
        record.check_revision(expected_revision)?;

        record.settings = settings;
        record.revision += 1;
        Ok(record.revision)
    }

    async fn snapshot(&self, tree_id: &TreeId) -> StorageResult<TreeSnapshot> {
        let trees = self.trees.read().await;
        let record = Self::record(&trees, tree_id)?;
        Ok(TreeSnapshot {
            tree_id: tree_id.clone(),
            revision: record.revision,
            settings: record.settings.clone(),
            members: record.members.values().cloned().collect(),
            edges: record.relationships.iter().map(|r| r.edge.clone()).collect(),
        })
    }
}
