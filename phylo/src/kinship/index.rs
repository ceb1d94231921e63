//! Adjacency index over one tree's kinship graph

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use tracing::debug;

use super::ancestors::AncestorMap;
use crate::models::{Member, MemberId, RelationshipEdge};
use crate::storage::TreeSnapshot;

static NO_MEMBERS: BTreeSet<MemberId> = BTreeSet::new();

/// Parent, child and spouse adjacency for every member of a tree.
///
/// Built from a snapshot and never mutated afterwards. Edges whose endpoints
/// are not members of the tree, and self-referencing edges, are dropped at
/// build time so every lookup only ever sees known members.
#[derive(Debug, Clone, Default)]
pub struct KinshipIndex {
    members: BTreeMap<MemberId, Member>,
    parents: BTreeMap<MemberId, BTreeSet<MemberId>>,
    children: BTreeMap<MemberId, BTreeSet<MemberId>>,
    spouses: BTreeMap<MemberId, BTreeSet<MemberId>>,
    edge_count: usize,
}

impl KinshipIndex {
    pub fn build(
        members: impl IntoIterator<Item = Member>,
        edges: impl IntoIterator<Item = RelationshipEdge>,
    ) -> Self {
        let mut index = Self {
            members: members.into_iter().map(|m| (m.id.clone(), m)).collect(),
            ..Self::default()
        };

        let mut dropped = 0usize;
        for edge in edges {
            if !index.accept(edge) {
                dropped += 1;
            }
        }

        if dropped > 0 {
            debug!(dropped, "ignored dangling or malformed edges while indexing");
        }
        index
    }

    /// Index the members of the snapshot's tree and their edges
    pub fn from_snapshot(snapshot: &TreeSnapshot) -> Self {
        let members = snapshot
            .members
            .iter()
            .filter(|m| m.tree_id == snapshot.tree_id)
            .cloned();
        Self::build(members, snapshot.edges.iter().cloned())
    }

    fn accept(&mut self, edge: RelationshipEdge) -> bool {
        let (x, y) = edge.endpoints();
        if x == y || !self.members.contains_key(x) || !self.members.contains_key(y) {
            return false;
        }

        let inserted = match edge {
            RelationshipEdge::Spouse { a, b } => {
                let new = self.spouses.entry(a.clone()).or_default().insert(b.clone());
                self.spouses.entry(b).or_default().insert(a);
                new
            }
            RelationshipEdge::ParentChild { parent, child } => {
                let new = self
                    .children
                    .entry(parent.clone())
                    .or_default()
                    .insert(child.clone());
                self.parents.entry(child).or_default().insert(parent);
                new
            }
        };

        if inserted {
            self.edge_count += 1;
        }
        inserted
    }

    pub fn member(&self, id: &MemberId) -> Option<&Member> {
        self.members.get(id)
    }

    pub fn contains(&self, id: &MemberId) -> bool {
        self.members.contains_key(id)
    }

    /// Members in id order
    pub fn members(&self) -> impl Iterator<Item = &Member> {
        self.members.values()
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    /// Number of distinct, well-formed edges
    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// Display name, falling back to the id for unknown members
    pub fn display_name(&self, id: &MemberId) -> String {
        self.members
            .get(id)
            .map(|m| m.name.clone())
            .unwrap_or_else(|| id.to_string())
    }

    pub fn parents_of(&self, id: &MemberId) -> &BTreeSet<MemberId> {
        self.parents.get(id).unwrap_or(&NO_MEMBERS)
    }

    pub fn children_of(&self, id: &MemberId) -> &BTreeSet<MemberId> {
        self.children.get(id).unwrap_or(&NO_MEMBERS)
    }

    pub fn spouses_of(&self, id: &MemberId) -> &BTreeSet<MemberId> {
        self.spouses.get(id).unwrap_or(&NO_MEMBERS)
    }

    pub fn spouse_count(&self, id: &MemberId) -> usize {
        self.spouses_of(id).len()
    }

    pub fn parent_count(&self, id: &MemberId) -> usize {
        self.parents_of(id).len()
    }

    /// Each spouse edge once, as `(lower id, higher id)`
    pub fn spouse_pairs(&self) -> impl Iterator<Item = (&MemberId, &MemberId)> {
        self.spouses
            .iter()
            .flat_map(|(a, bs)| bs.iter().filter(move |b| a < *b).map(move |b| (a, b)))
    }

    /// Members with at least one parent edge, with their parent counts
    pub fn children_with_parents(&self) -> impl Iterator<Item = (&MemberId, usize)> {
        self.parents.iter().map(|(child, ps)| (child, ps.len()))
    }

    /// Members with at least one spouse edge, with their spouse counts
    pub fn members_with_spouses(&self) -> impl Iterator<Item = (&MemberId, usize)> {
        self.spouses.iter().map(|(m, ss)| (m, ss.len()))
    }

    /// Whether the index holds this exact edge
    pub fn has_edge(&self, edge: &RelationshipEdge) -> bool {
        match edge {
            RelationshipEdge::Spouse { a, b } => self.spouses_of(a).contains(b),
            RelationshipEdge::ParentChild { parent, child } => {
                self.children_of(parent).contains(child)
            }
        }
    }

    /// Breadth-first walk up the parent edges from `origin`.
    ///
    /// Parents are explored in id order at every level, so the recorded chain
    /// for each ancestor is deterministic. Unknown origins yield a map holding
    /// only the origin.
    pub fn ancestor_distances(&self, origin: &MemberId) -> AncestorMap {
        let mut map = AncestorMap::new(origin.clone());
        let mut queue = VecDeque::new();
        queue.push_back((origin.clone(), 0u32));

        while let Some((current, distance)) = queue.pop_front() {
            for parent in self.parents_of(&current) {
                if map.record(parent, distance + 1, &current) {
                    queue.push_back((parent.clone(), distance + 1));
                }
            }
        }

        map
    }

    /// Whether `ancestor` is reachable from `descendant` by following parent
    /// edges upwards
    pub fn is_ancestor(&self, ancestor: &MemberId, descendant: &MemberId) -> bool {
        ancestor != descendant && self.ancestor_distances(descendant).contains(ancestor)
    }

    /// Whether the two members share at least one parent
    pub fn are_siblings(&self, a: &MemberId, b: &MemberId) -> bool {
        a != b && !self.parents_of(a).is_disjoint(self.parents_of(b))
    }

    /// First parent shared by the two members, in id order
    pub fn shared_parent(&self, a: &MemberId, b: &MemberId) -> Option<&MemberId> {
        self.parents_of(a).intersection(self.parents_of(b)).next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn members(ids: &[&str]) -> Vec<Member> {
        ids.iter()
            .map(|id| Member::new(*id, "tree", id.to_uppercase()))
            .collect()
    }

    fn pc(parent: &str, child: &str) -> RelationshipEdge {
        RelationshipEdge::parent_child(parent, child)
    }

    #[test]
    fn test_adjacency() {
        let index = KinshipIndex::build(
            members(&["p1", "p2", "c"]),
            vec![pc("p1", "c"), pc("p2", "c"), RelationshipEdge::spouse("p1", "p2")],
        );

        assert_eq!(index.parent_count(&"c".into()), 2);
        assert!(index.children_of(&"p1".into()).contains(&MemberId::from("c")));
        assert!(index.spouses_of(&"p2".into()).contains(&MemberId::from("p1")));
        assert_eq!(index.spouse_pairs().count(), 1);
        assert_eq!(index.edge_count(), 3);
    }

    #[test]
    fn test_dangling_and_duplicate_edges_are_ignored() {
        let index = KinshipIndex::build(
            members(&["a", "b"]),
            vec![
                pc("ghost", "a"),
                pc("a", "b"),
                pc("a", "b"),
                RelationshipEdge::spouse("a", "a"),
            ],
        );

        assert_eq!(index.edge_count(), 1);
        assert!(index.parents_of(&"a".into()).is_empty());
        assert!(index.spouses_of(&"a".into()).is_empty());
        assert!(index.parents_of(&"ghost".into()).is_empty());
    }

    #[test]
    fn test_ancestor_distances_keep_minimum_through_multiple_parents() {
        // g is both a grandparent (through p1) and a parent of c
        let index = KinshipIndex::build(
            members(&["g", "p1", "c", "gg"]),
            vec![pc("g", "p1"), pc("p1", "c"), pc("g", "c"), pc("gg", "g")],
        );

        let ancestors = index.ancestor_distances(&"c".into());
        assert_eq!(ancestors.distance(&"c".into()), Some(0));
        assert_eq!(ancestors.distance(&"p1".into()), Some(1));
        assert_eq!(ancestors.distance(&"g".into()), Some(1));
        assert_eq!(ancestors.distance(&"gg".into()), Some(2));
        assert_eq!(ancestors.len(), 3);
        assert_eq!(
            ancestors.path_to(&"gg".into()).unwrap(),
            vec![MemberId::from("c"), "g".into(), "gg".into()]
        );
    }

    #[test]
    fn test_ancestor_walk_terminates_on_malformed_cycles() {
        let index = KinshipIndex::build(members(&["a", "b"]), vec![pc("a", "b"), pc("b", "a")]);
        let ancestors = index.ancestor_distances(&"a".into());
        assert_eq!(ancestors.distance(&"b".into()), Some(1));
        assert_eq!(ancestors.distance(&"a".into()), Some(0));
    }

    #[test]
    fn test_is_ancestor_and_siblings() {
        let index = KinshipIndex::build(
            members(&["g", "p", "c", "s"]),
            vec![pc("g", "p"), pc("p", "c"), pc("p", "s")],
        );

        assert!(index.is_ancestor(&"g".into(), &"c".into()));
        assert!(!index.is_ancestor(&"c".into(), &"g".into()));
        assert!(!index.is_ancestor(&"c".into(), &"c".into()));
        assert!(index.are_siblings(&"c".into(), &"s".into()));
        assert_eq!(
            index.shared_parent(&"c".into(), &"s".into()),
            Some(&MemberId::from("p"))
        );
    }

    #[test]
    fn test_snapshot_filters_foreign_members() {
        let mut list = members(&["a", "b"]);
        list.push(Member::new("x", "other-tree", "X"));
        let snapshot = TreeSnapshot {
            tree_id: "tree".into(),
            revision: 3,
            settings: Default::default(),
            members: list,
            edges: vec![pc("x", "a"), pc("a", "b")],
        };

        let index = KinshipIndex::from_snapshot(&snapshot);
        assert_eq!(index.member_count(), 2);
        assert!(!index.contains(&"x".into()));
        assert_eq!(index.edge_count(), 1);
    }
}
