//! Graph store errors

use thiserror::Error;

use crate::PhyloError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    /// Tree, member or edge not found
    #[error("{0} not found")]
    NotFound(String),

    #[error("{0} already exists")]
    AlreadyExists(String),

    /// The tree changed since it was read; the write was not applied
    #[error("tree moved from revision {expected} to {actual} before the write")]
    Conflict { expected: u64, actual: u64 },

    /// Input the store refuses to persist
    #[error("rejected by store: {0}")]
    Validation(String),

    #[error("store failure: {0}")]
    Internal(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for PhyloError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(what) => PhyloError::NotFound(what),
            StorageError::Conflict { .. } => PhyloError::ConcurrentModification(err.to_string()),
            other => PhyloError::Storage(other.to_string()),
        }
    }
}
