//! Core data models for family trees.
//!
//! Members and relationship edges are owned by a tree. The kinship engine
//! only ever reads members; it writes edges through the mutation guard.

mod edge;
mod member;
mod settings;

pub use edge::{EdgeKind, Relationship, RelationshipEdge};
pub use member::{GenderCategory, Member, MemberId, TreeId};
pub use settings::TreeSettings;
