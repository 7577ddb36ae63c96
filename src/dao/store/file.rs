//! JSON file store: the whole document serialized to a single file. A
//! missing file reads as the empty document so first boot needs no setup.

use std::io::ErrorKind;
use std::path::PathBuf;

use futures::future::BoxFuture;
use tokio::fs;

use crate::dao::models::Document;
use crate::dao::storage::{StorageError, StorageResult};
use crate::dao::store::SessionStore;

/// Whole-document JSON file backend.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Create a store backed by the given file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SessionStore for FileStore {
    fn load(&self) -> BoxFuture<'static, StorageResult<Document>> {
        let path = self.path.clone();
        Box::pin(async move {
            let contents = match fs::read(&path).await {
                Ok(contents) => contents,
                Err(err) if err.kind() == ErrorKind::NotFound => {
                    return Ok(Document::default());
                }
                Err(err) => {
                    return Err(StorageError::unavailable(
                        format!("reading `{}`", path.display()),
                        err,
                    ));
                }
            };

            serde_json::from_slice(&contents).map_err(|err| StorageError::Corrupt {
                message: format!("parsing `{}`", path.display()),
                source: err,
            })
        })
    }

    fn save(&self, document: Document) -> BoxFuture<'static, StorageResult<()>> {
        let path = self.path.clone();
        Box::pin(async move {
            let payload = serde_json::to_vec_pretty(&document).map_err(|err| {
                StorageError::unavailable("serializing session document".into(), err)
            })?;

            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent).await.map_err(|err| {
                        StorageError::unavailable(
                            format!("creating `{}`", parent.display()),
                            err,
                        )
                    })?;
                }
            }

            fs::write(&path, payload).await.map_err(|err| {
                StorageError::unavailable(format!("writing `{}`", path.display()), err)
            })
        })
    }
}
