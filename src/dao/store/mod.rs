pub mod file;
pub mod memory;

use futures::future::BoxFuture;

use crate::dao::models::Document;
use crate::dao::storage::StorageResult;

/// Abstraction over the persistence layer for the session document.
///
/// The contract is deliberately minimal: whole-document load and replace
/// with read-modify-write semantics and no compare-and-swap. Callers that
/// race (requests against timer callbacks) resolve with last-write-wins.
pub trait SessionStore: Send + Sync {
    /// Read the whole session document.
    fn load(&self) -> BoxFuture<'static, StorageResult<Document>>;
    /// Replace the whole session document.
    fn save(&self, document: Document) -> BoxFuture<'static, StorageResult<()>>;
}
