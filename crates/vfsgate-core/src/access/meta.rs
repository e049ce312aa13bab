//! Metadata override lookup

use super::path::{fix_and_clean_path, parent_dir};
use crate::error::Result;
use crate::types::Meta;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::debug;

/// Source of per-path metadata overrides
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MetaStore: Send + Sync {
    /// Meta configured exactly at `path`
    ///
    /// `Ok(None)` means nothing is configured there. `Err` is reserved for
    /// real lookup failures and is fatal to the request.
    async fn get_meta(&self, path: &str) -> Result<Option<Meta>>;
}

/// Walk from `path` up to the root and return the first meta found
pub async fn nearest_meta(store: &dyn MetaStore, path: &str) -> Result<Option<Meta>> {
    let mut current = fix_and_clean_path(path);
    loop {
        if let Some(meta) = store.get_meta(&current).await? {
            debug!("Nearest meta for {} is at {}", path, meta.path);
            return Ok(Some(meta));
        }
        if current == "/" {
            return Ok(None);
        }
        current = parent_dir(&current);
    }
}

/// In-memory meta store
#[derive(Debug, Default)]
pub struct MemoryMetaStore {
    metas: RwLock<HashMap<String, Meta>>,
}

impl MemoryMetaStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, meta: Meta) {
        let path = fix_and_clean_path(&meta.path);
        self.metas.write().insert(path, meta);
    }
}

#[async_trait]
impl MetaStore for MemoryMetaStore {
    async fn get_meta(&self, path: &str) -> Result<Option<Meta>> {
        Ok(self.metas.read().get(&fix_and_clean_path(path)).cloned())
    }
}
