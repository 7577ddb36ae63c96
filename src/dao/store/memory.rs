//! In-memory document store, used by tests and available as a volatile
//! backend when no data path is configured.

use std::sync::Arc;

use futures::future::BoxFuture;
use tokio::sync::RwLock;

use crate::dao::models::Document;
use crate::dao::storage::StorageResult;
use crate::dao::store::SessionStore;

/// Store keeping the document behind an `RwLock`, no durability.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Document>>,
}

impl MemoryStore {
    /// Create an empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemoryStore {
    fn load(&self) -> BoxFuture<'static, StorageResult<Document>> {
        let inner = self.inner.clone();
        Box::pin(async move { Ok(inner.read().await.clone()) })
    }

    fn save(&self, document: Document) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            *inner.write().await = document;
            Ok(())
        })
    }
}
