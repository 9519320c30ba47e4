use async_trait::async_trait;

use crate::domain::entities::{SavedSet, SavedSetKind};
use crate::domain::value_objects::SavedSetId;

#[derive(Debug, thiserror::Error)]
pub enum SavedSetError {
    #[error("Database error: {0}")]
    Database(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Saved set not found: {0}")]
    NotFound(String),
}

/// Two ordered lists of saved sets, one per kind
#[async_trait]
pub trait SavedSetRepositoryPort: Send + Sync {
    /// Append to the end of the set's list
    async fn append(&self, set: &SavedSet) -> Result<(), SavedSetError>;
    /// Sets of one kind in insertion order
    async fn list(&self, kind: SavedSetKind) -> Result<Vec<SavedSet>, SavedSetError>;
    async fn get(&self, id: SavedSetId) -> Result<Option<SavedSet>, SavedSetError>;
    /// Returns false when nothing had that id
    async fn delete(&self, id: SavedSetId) -> Result<bool, SavedSetError>;
    /// Returns the number of removed sets
    async fn clear(&self, kind: SavedSetKind) -> Result<u64, SavedSetError>;
}
