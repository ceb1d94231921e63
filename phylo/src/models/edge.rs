//! Typed relationship edges between members

use super::member::{MemberId, TreeId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Kind of a relationship edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EdgeKind {
    Spouse,
    ParentChild,
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EdgeKind::Spouse => write!(f, "spouse"),
            EdgeKind::ParentChild => write!(f, "parent-child"),
        }
    }
}

/// An edge of the kinship graph.
///
/// Spouse edges are symmetric: `Spouse { a, b }` and `Spouse { b, a }` denote
/// the same edge. Use [`RelationshipEdge::spouse`] to get the canonical
/// ordering, and [`RelationshipEdge::same_edge`] to compare.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum RelationshipEdge {
    Spouse { a: MemberId, b: MemberId },
    ParentChild { parent: MemberId, child: MemberId },
}

impl RelationshipEdge {
    /// Spouse edge with endpoints in canonical order
    pub fn spouse(a: impl Into<MemberId>, b: impl Into<MemberId>) -> Self {
        RelationshipEdge::Spouse { a: a.into(), b: b.into() }.normalized()
    }

    pub fn parent_child(parent: impl Into<MemberId>, child: impl Into<MemberId>) -> Self {
        RelationshipEdge::ParentChild {
            parent: parent.into(),
            child: child.into(),
        }
    }

    pub fn kind(&self) -> EdgeKind {
        match self {
            RelationshipEdge::Spouse { .. } => EdgeKind::Spouse,
            RelationshipEdge::ParentChild { .. } => EdgeKind::ParentChild,
        }
    }

    pub fn endpoints(&self) -> (&MemberId, &MemberId) {
        match self {
            RelationshipEdge::Spouse { a, b } => (a, b),
            RelationshipEdge::ParentChild { parent, child } => (parent, child),
        }
    }

    pub fn involves(&self, member: &MemberId) -> bool {
        let (x, y) = self.endpoints();
        x == member || y == member
    }

    pub fn is_self_referencing(&self) -> bool {
        let (x, y) = self.endpoints();
        x == y
    }

    /// Canonical form: spouse endpoints sorted, parent-child untouched
    pub fn normalized(self) -> Self {
        match self {
            RelationshipEdge::Spouse { a, b } if b < a => RelationshipEdge::Spouse { a: b, b: a },
            other => other,
        }
    }

    /// Whether two edges denote the same relationship, honoring spouse symmetry
    pub fn same_edge(&self, other: &RelationshipEdge) -> bool {
        self.clone().normalized() == other.clone().normalized()
    }
}

impl fmt::Display for RelationshipEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelationshipEdge::Spouse { a, b } => write!(f, "{} <-> {}", a, b),
            RelationshipEdge::ParentChild { parent, child } => write!(f, "{} -> {}", parent, child),
        }
    }
}

/// A stored relationship row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Relationship {
    pub id: String,
    pub tree_id: TreeId,
    pub edge: RelationshipEdge,
    pub created_at: DateTime<Utc>,
}

impl Relationship {
    pub fn new(tree_id: TreeId, edge: RelationshipEdge) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            tree_id,
            edge: edge.normalized(),
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spouse_edges_are_symmetric() {
        let forward = RelationshipEdge::spouse("b", "a");
        let backward = RelationshipEdge::Spouse {
            a: "b".into(),
            b: "a".into(),
        };
        assert_eq!(forward, RelationshipEdge::Spouse { a: "a".into(), b: "b".into() });
        assert!(forward.same_edge(&backward));
    }

    #[test]
    fn test_parent_child_edges_are_directed() {
        let down = RelationshipEdge::parent_child("p", "c");
        let up = RelationshipEdge::parent_child("c", "p");
        assert!(!down.same_edge(&up));
        assert_eq!(down.kind(), EdgeKind::ParentChild);
    }

    #[test]
    fn test_edge_serialization_uses_type_tag() {
        let edge = RelationshipEdge::parent_child("p", "c");
        let json = serde_json::to_value(&edge).unwrap();
        assert_eq!(json["type"], "parent-child");
        assert_eq!(json["parent"], "p");
    }

    #[test]
    fn test_self_reference_detection() {
        assert!(RelationshipEdge::spouse("x", "x").is_self_referencing());
        assert!(!RelationshipEdge::parent_child("x", "y").is_self_referencing());
    }
}
