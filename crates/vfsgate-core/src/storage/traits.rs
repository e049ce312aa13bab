//! Storage backend abstraction
//!
//! The gateway never performs storage I/O itself. Everything below the
//! permission layer goes through [`VirtualFs`], which routes a virtual path to
//! the backend mounted at it.

use crate::error::Result;
use crate::types::{Link, LinkArgs, ListArgs, Obj, TaskInfo};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Configuration of the backend owning a path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    pub mount_path: String,
    pub driver: String,
    /// Content is only reachable through the gateway proxy
    #[serde(default)]
    pub only_local: bool,
}

impl StorageConfig {
    pub fn new(mount_path: impl Into<String>, driver: impl Into<String>) -> Self {
        Self {
            mount_path: mount_path.into(),
            driver: driver.into(),
            only_local: false,
        }
    }

    pub fn local_only(mut self) -> Self {
        self.only_local = true;
        self
    }
}

/// Virtual filesystem spanning every mounted backend
///
/// `lazy_cache` is set for every item of a batch except the last, letting
/// the backend defer per-item bookkeeping such as cache invalidation.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VirtualFs: Send + Sync {
    /// Look up a single object
    async fn get(&self, path: &str) -> Result<Obj>;

    /// List the direct children of a directory
    async fn list(&self, path: &str, args: ListArgs) -> Result<Vec<Obj>>;

    /// Create a directory
    async fn make_dir(&self, path: &str) -> Result<()>;

    /// Move `src_path` into `dst_dir`
    async fn move_obj(&self, src_path: &str, dst_dir: &str, lazy_cache: bool) -> Result<()>;

    /// Copy `src_path` into `dst_dir`
    ///
    /// Returns a task handle when the copy was deferred to the task engine,
    /// `None` when it completed synchronously.
    async fn copy(&self, src_path: &str, dst_dir: &str, lazy_cache: bool)
        -> Result<Option<TaskInfo>>;

    /// Rename an object in place
    async fn rename(&self, src_path: &str, new_name: &str) -> Result<()>;

    /// Remove an object and everything below it
    async fn remove(&self, path: &str) -> Result<()>;

    /// Configuration of the backend that owns `path`
    fn storage_config(&self, path: &str) -> Result<StorageConfig>;

    /// Backend-native link to the content of `path`
    async fn link(&self, path: &str, args: LinkArgs) -> Result<Link>;
}
