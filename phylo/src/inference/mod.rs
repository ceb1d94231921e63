//! Relationship inference
//!
//! Answers "what is B to A" for any two members of a tree, using blood
//! relationships through the nearest common ancestor and, failing that,
//! marriage links.

pub mod engine;
pub mod labels;

pub use engine::{BloodRelation, RelationshipEngine, RelationshipResult};
pub use labels::{Kinship, ordinal};
