//! Mutation guard
//!
//! All relationship and settings writes go through here so that the checks
//! and the commit see the same tree state.

pub mod checks;
pub mod locks;
pub mod mutation;

pub use checks::{check_parent_child, check_spouse};
pub use locks::TreeLocks;
pub use mutation::{CommitReceipt, MutationGuard};
