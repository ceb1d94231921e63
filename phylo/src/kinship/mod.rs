//! Kinship index
//!
//! Adjacency structures built once per request from a tree's members and
//! edges, shared by relationship inference, policy validation and the
//! mutation guard.

mod ancestors;
mod index;

pub use ancestors::AncestorMap;
pub use index::KinshipIndex;
