//! Filesystem collaborator
//!
//! Source files reach the loader through [`FileReader`] so tests can count or
//! fake reads. [`ContentCache`] is the one piece of state a caller may share
//! across sessions: an append-only map from path to already-read source text.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use futures_util::future::BoxFuture;

use crate::error::{LoaderError, LoaderResult};

/// Read a path, return its text or fail with a not-found error.
pub trait FileReader: Send + Sync {
    fn read<'a>(&'a self, path: &'a Path) -> BoxFuture<'a, LoaderResult<String>>;
}

/// Production reader over tokio's filesystem.
#[derive(Debug, Default)]
pub struct DiskFs;

impl FileReader for DiskFs {
    fn read<'a>(&'a self, path: &'a Path) -> BoxFuture<'a, LoaderResult<String>> {
        Box::pin(async move {
            tokio::fs::read_to_string(path).await.map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    LoaderError::NotFound {
                        path: path.to_path_buf(),
                    }
                } else {
                    LoaderError::Io {
                        path: path.to_path_buf(),
                        message: e.to_string(),
                    }
                }
            })
        })
    }
}

/// Shared source-text cache keyed by absolute path.
///
/// Entries are inserted only after a successful read and never invalidated;
/// the caller decides how long to keep the cache around. Clones share
/// storage.
#[derive(Debug, Clone, Default)]
pub struct ContentCache {
    entries: Arc<DashMap<PathBuf, Arc<str>>>,
}

impl ContentCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &Path) -> Option<Arc<str>> {
        self.entries.get(path).map(|e| e.value().clone())
    }

    pub fn insert(&self, path: PathBuf, text: Arc<str>) {
        self.entries.insert(path, text);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
