//! Family graph over the bundled in-memory store

use std::sync::Arc;

use crate::config::PhyloConfig;
use crate::graph::FamilyGraph;
use crate::models::{Member, TreeId, TreeSettings};
use crate::storage::InMemoryGraphStore;
use crate::Result;

/// A [`FamilyGraph`] together with the in-memory store it runs on.
///
/// The store's tree and member helpers stand in for the CRUD layer a
/// database-backed deployment would provide.
#[derive(Debug)]
pub struct Phylo {
    graph: FamilyGraph,
    store: Arc<InMemoryGraphStore>,
    config: PhyloConfig,
}

impl Phylo {
    pub fn new(config: PhyloConfig) -> Self {
        let store = Arc::new(InMemoryGraphStore::with_default_settings(
            config.defaults.clone(),
        ));
        let graph = FamilyGraph::new(store.clone(), &config.graph);
        Self {
            graph,
            store,
            config,
        }
    }

    pub fn graph(&self) -> &FamilyGraph {
        &self.graph
    }

    pub fn store(&self) -> &Arc<InMemoryGraphStore> {
        &self.store
    }

    pub fn config(&self) -> &PhyloConfig {
        &self.config
    }

    /// Create a tree with the configured default settings
    pub async fn create_tree(&self, name: impl Into<String>) -> TreeId {
        self.store.create_tree(name).await
    }

    pub async fn create_tree_with_settings(
        &self,
        name: impl Into<String>,
        settings: TreeSettings,
    ) -> Result<TreeId> {
        settings
            .validate()
            .map_err(crate::PhyloError::InvalidSettings)?;
        Ok(self.store.create_tree_with_settings(name, settings).await)
    }

    pub async fn add_member(&self, member: Member) -> Result<Member> {
        Ok(self.store.add_member(member).await?)
    }
}
