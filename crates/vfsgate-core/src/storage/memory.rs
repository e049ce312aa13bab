//! In-memory multi-mount virtual filesystem

use super::traits::{StorageConfig, VirtualFs};
use crate::access::path::{base_name, fix_and_clean_path, is_sub_path, parent_dir, path_join};
use crate::error::{BackendError, Result};
use crate::tasks::{TaskQueue, TransferKind};
use crate::types::{Link, LinkArgs, ListArgs, Obj, TaskInfo};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, info};

/// Operation kinds, used for fault injection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FsOp {
    Get,
    List,
    MakeDir,
    Move,
    Copy,
    Rename,
    Remove,
    Link,
}

/// Journal entry for every backend call, recorded before it runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FsCall {
    Get(String),
    List { path: String, refresh: bool },
    MakeDir(String),
    Move { src: String, dst_dir: String, lazy_cache: bool },
    Copy { src: String, dst_dir: String, lazy_cache: bool },
    Rename { path: String, name: String },
    Remove(String),
    Link(String),
}

impl FsCall {
    pub fn op(&self) -> FsOp {
        match self {
            FsCall::Get(_) => FsOp::Get,
            FsCall::List { .. } => FsOp::List,
            FsCall::MakeDir(_) => FsOp::MakeDir,
            FsCall::Move { .. } => FsOp::Move,
            FsCall::Copy { .. } => FsOp::Copy,
            FsCall::Rename { .. } => FsOp::Rename,
            FsCall::Remove(_) => FsOp::Remove,
            FsCall::Link(_) => FsOp::Link,
        }
    }

    pub fn is_mutation(&self) -> bool {
        matches!(
            self.op(),
            FsOp::MakeDir | FsOp::Move | FsOp::Copy | FsOp::Rename | FsOp::Remove
        )
    }
}

#[derive(Debug, Clone)]
struct Node {
    is_dir: bool,
    size: u64,
    modified: chrono::DateTime<chrono::Utc>,
}

impl Node {
    fn dir() -> Self {
        Self {
            is_dir: true,
            size: 0,
            modified: chrono::Utc::now(),
        }
    }

    fn file(size: u64) -> Self {
        Self {
            is_dir: false,
            size,
            modified: chrono::Utc::now(),
        }
    }
}

#[derive(Debug)]
struct Mount {
    config: StorageConfig,
    defer_copy: bool,
}

#[derive(Debug, Default)]
struct State {
    mounts: BTreeMap<String, Mount>,
    nodes: BTreeMap<String, Node>,
    /// Listings served when a caller does not ask for a refresh
    list_cache: HashMap<String, Vec<Obj>>,
    /// Directories changed by lazy mutations, invalidated on the next flush
    dirty: HashSet<String>,
    calls: Vec<FsCall>,
    faults: HashSet<(FsOp, String)>,
}

/// In-memory [`VirtualFs`] with mounts, a listing cache and a call journal
#[derive(Debug)]
pub struct MemoryFs {
    state: RwLock<State>,
    tasks: Option<TaskQueue>,
}

impl Default for MemoryFs {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryFs {
    pub fn new() -> Self {
        let mut state = State::default();
        state.nodes.insert("/".to_string(), Node::dir());
        Self {
            state: RwLock::new(state),
            tasks: None,
        }
    }

    /// Route deferred copies to the task engine
    pub fn with_task_queue(mut self, queue: TaskQueue) -> Self {
        self.tasks = Some(queue);
        self
    }

    /// Mount a backend that copies synchronously
    pub fn add_mount(&self, config: StorageConfig) -> Result<()> {
        self.mount(config, false)
    }

    /// Mount a backend whose copies are handed to the task engine
    pub fn add_deferred_mount(&self, config: StorageConfig) -> Result<()> {
        self.mount(config, true)
    }

    fn mount(&self, mut config: StorageConfig, defer_copy: bool) -> Result<()> {
        let mount_path = fix_and_clean_path(&config.mount_path);
        config.mount_path = mount_path.clone();

        let mut state = self.state.write();
        state.ensure_dir_all(&mount_path)?;
        info!("Mounted {} at {}", config.driver, mount_path);
        state.mounts.insert(mount_path, Mount { config, defer_copy });
        Ok(())
    }

    /// Create a directory and its missing ancestors
    pub fn add_dir(&self, path: &str) -> Result<()> {
        self.state.write().ensure_dir_all(&fix_and_clean_path(path))
    }

    /// Create a file, creating missing ancestors
    pub fn add_file(&self, path: &str, size: u64) -> Result<()> {
        let path = fix_and_clean_path(path);
        let mut state = self.state.write();
        state.ensure_dir_all(&parent_dir(&path))?;
        state.nodes.insert(path, Node::file(size));
        Ok(())
    }

    pub fn exists(&self, path: &str) -> bool {
        self.state.read().nodes.contains_key(&fix_and_clean_path(path))
    }

    /// Names of the direct children of `path`, from live state
    pub fn children(&self, path: &str) -> Vec<String> {
        self.state
            .read()
            .list_children(&fix_and_clean_path(path))
            .into_iter()
            .map(|obj| obj.name)
            .collect()
    }

    /// Make every future `op` on `path` fail
    pub fn fail_on(&self, op: FsOp, path: &str) {
        self.state.write().faults.insert((op, fix_and_clean_path(path)));
    }

    pub fn calls(&self) -> Vec<FsCall> {
        self.state.read().calls.clone()
    }

    pub fn mutations(&self) -> Vec<FsCall> {
        self.calls().into_iter().filter(FsCall::is_mutation).collect()
    }

    pub fn clear_calls(&self) {
        self.state.write().calls.clear();
    }
}

impl State {
    fn record(&mut self, call: FsCall, path: &str) -> Result<()> {
        let op = call.op();
        self.calls.push(call);
        if self.faults.contains(&(op, path.to_string())) {
            return Err(BackendError::Driver(format!("injected {:?} failure at {}", op, path)).into());
        }
        Ok(())
    }

    fn node(&self, path: &str) -> Result<&Node> {
        self.nodes
            .get(path)
            .ok_or_else(|| BackendError::NotFound(path.to_string()).into())
    }

    fn dir_node(&self, path: &str) -> Result<&Node> {
        let node = self.node(path)?;
        if !node.is_dir {
            return Err(BackendError::NotADirectory(path.to_string()).into());
        }
        Ok(node)
    }

    fn ensure_dir_all(&mut self, path: &str) -> Result<()> {
        let mut current = String::new();
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            current.push('/');
            current.push_str(segment);
            match self.nodes.get(&current) {
                Some(node) if !node.is_dir => {
                    return Err(BackendError::NotADirectory(current).into());
                }
                Some(_) => {}
                None => {
                    self.nodes.insert(current.clone(), Node::dir());
                }
            }
        }
        Ok(())
    }

    fn list_children(&self, path: &str) -> Vec<Obj> {
        let prefix = if path == "/" {
            "/".to_string()
        } else {
            format!("{}/", path)
        };

        let mut children = Vec::new();
        for (key, node) in self.nodes.range(prefix.clone()..) {
            let Some(rest) = key.strip_prefix(prefix.as_str()) else {
                break;
            };
            if rest.is_empty() || rest.contains('/') {
                continue;
            }
            children.push(Obj {
                name: rest.to_string(),
                is_dir: node.is_dir,
                size: node.size,
                modified: Some(node.modified),
            });
        }
        children
    }

    /// `path` itself followed by every key below it
    fn subtree_keys(&self, path: &str) -> Vec<String> {
        if path == "/" {
            return self.nodes.keys().cloned().collect();
        }

        let prefix = format!("{}/", path);
        let mut keys = Vec::new();
        if self.nodes.contains_key(path) {
            keys.push(path.to_string());
        }
        keys.extend(
            self.nodes
                .range(prefix.clone()..)
                .map(|(key, _)| key)
                .take_while(|key| key.starts_with(prefix.as_str()))
                .cloned(),
        );
        keys
    }

    fn remove_subtree(&mut self, path: &str) {
        for key in self.subtree_keys(path) {
            self.nodes.remove(&key);
        }
    }

    fn mount_for(&self, path: &str) -> Option<&Mount> {
        self.mounts
            .iter()
            .filter(|(mount_path, _)| is_sub_path(mount_path, path))
            .max_by_key(|(mount_path, _)| mount_path.len())
            .map(|(_, mount)| mount)
    }

    fn touch(&mut self, dir: &str, lazy_cache: bool) {
        self.dirty.insert(dir.to_string());
        if !lazy_cache {
            self.flush();
        }
    }

    fn flush(&mut self) {
        for dir in self.dirty.drain() {
            self.list_cache.remove(&dir);
        }
        let nodes = &self.nodes;
        self.list_cache
            .retain(|key, _| nodes.get(key).map(|n| n.is_dir).unwrap_or(false));
    }

    /// Destination of moving or copying `src` into `dst_dir`
    fn transfer_target(&self, src: &str, dst_dir: &str) -> Result<String> {
        self.node(src)?;
        self.dir_node(dst_dir)?;
        if src == "/" {
            return Err(BackendError::Unsupported("transfer of the root".to_string()).into());
        }
        if is_sub_path(src, dst_dir) {
            return Err(BackendError::Unsupported(format!(
                "cannot transfer {} into itself",
                src
            ))
            .into());
        }
        Ok(path_join(dst_dir, &base_name(src)))
    }

    /// Re-key the subtree at `src` to `target`, replacing whatever was there
    fn relocate(&mut self, src: &str, target: &str, keep_source: bool) {
        if src == target {
            return;
        }
        let mut moved = Vec::new();
        for key in self.subtree_keys(src) {
            let node = if keep_source {
                self.nodes.get(&key).cloned()
            } else {
                self.nodes.remove(&key)
            };
            if let Some(node) = node {
                moved.push((format!("{}{}", target, &key[src.len()..]), node));
            }
        }

        self.remove_subtree(target);
        self.nodes.extend(moved);
    }
}

#[async_trait]
impl VirtualFs for MemoryFs {
    async fn get(&self, path: &str) -> Result<Obj> {
        let path = fix_and_clean_path(path);
        let mut state = self.state.write();
        state.record(FsCall::Get(path.clone()), &path)?;

        let node = state.node(&path)?;
        Ok(Obj {
            name: base_name(&path),
            is_dir: node.is_dir,
            size: node.size,
            modified: Some(node.modified),
        })
    }

    async fn list(&self, path: &str, args: ListArgs) -> Result<Vec<Obj>> {
        let path = fix_and_clean_path(path);
        let mut state = self.state.write();
        state.record(
            FsCall::List {
                path: path.clone(),
                refresh: args.refresh,
            },
            &path,
        )?;
        state.dir_node(&path)?;

        if !args.refresh {
            if let Some(cached) = state.list_cache.get(&path) {
                debug!("Serving cached listing of {}", path);
                return Ok(cached.clone());
            }
        }

        let children = state.list_children(&path);
        state.list_cache.insert(path, children.clone());
        Ok(children)
    }

    async fn make_dir(&self, path: &str) -> Result<()> {
        let path = fix_and_clean_path(path);
        let mut state = self.state.write();
        state.record(FsCall::MakeDir(path.clone()), &path)?;

        state.ensure_dir_all(&path)?;
        state.touch(&parent_dir(&path), false);
        Ok(())
    }

    async fn move_obj(&self, src_path: &str, dst_dir: &str, lazy_cache: bool) -> Result<()> {
        let src = fix_and_clean_path(src_path);
        let dst_dir = fix_and_clean_path(dst_dir);
        let mut state = self.state.write();
        state.record(
            FsCall::Move {
                src: src.clone(),
                dst_dir: dst_dir.clone(),
                lazy_cache,
            },
            &src,
        )?;

        let target = state.transfer_target(&src, &dst_dir)?;
        state.relocate(&src, &target, false);
        state.touch(&parent_dir(&src), true);
        state.touch(&dst_dir, lazy_cache);
        Ok(())
    }

    async fn copy(
        &self,
        src_path: &str,
        dst_dir: &str,
        lazy_cache: bool,
    ) -> Result<Option<TaskInfo>> {
        let src = fix_and_clean_path(src_path);
        let dst_dir = fix_and_clean_path(dst_dir);
        let mut state = self.state.write();
        state.record(
            FsCall::Copy {
                src: src.clone(),
                dst_dir: dst_dir.clone(),
                lazy_cache,
            },
            &src,
        )?;

        let target = state.transfer_target(&src, &dst_dir)?;
        let deferred = [&src, &dst_dir]
            .iter()
            .any(|p| state.mount_for(p).map(|m| m.defer_copy).unwrap_or(false));

        if let (true, Some(queue)) = (deferred, self.tasks.as_ref()) {
            let task = queue.submit(TransferKind::Copy, &src, &dst_dir)?;
            return Ok(Some(task));
        }

        state.relocate(&src, &target, true);
        state.touch(&dst_dir, lazy_cache);
        Ok(None)
    }

    async fn rename(&self, src_path: &str, new_name: &str) -> Result<()> {
        let src = fix_and_clean_path(src_path);
        let mut state = self.state.write();
        state.record(
            FsCall::Rename {
                path: src.clone(),
                name: new_name.to_string(),
            },
            &src,
        )?;

        state.node(&src)?;
        if src == "/" || new_name.is_empty() || new_name.contains('/') {
            return Err(BackendError::Unsupported(format!("rename {} to {}", src, new_name)).into());
        }

        let dir = parent_dir(&src);
        let target = path_join(&dir, new_name);
        state.relocate(&src, &target, false);
        state.touch(&dir, false);
        Ok(())
    }

    async fn remove(&self, path: &str) -> Result<()> {
        let path = fix_and_clean_path(path);
        let mut state = self.state.write();
        state.record(FsCall::Remove(path.clone()), &path)?;

        state.node(&path)?;
        if path == "/" {
            return Err(BackendError::Unsupported("remove the root".to_string()).into());
        }
        state.remove_subtree(&path);
        state.touch(&parent_dir(&path), false);
        Ok(())
    }

    fn storage_config(&self, path: &str) -> Result<StorageConfig> {
        let path = fix_and_clean_path(path);
        self.state
            .read()
            .mount_for(&path)
            .map(|mount| mount.config.clone())
            .ok_or_else(|| BackendError::StorageNotFound(path).into())
    }

    async fn link(&self, path: &str, args: LinkArgs) -> Result<Link> {
        let path = fix_and_clean_path(path);
        let mut state = self.state.write();
        state.record(FsCall::Link(path.clone()), &path)?;

        if state.node(&path)?.is_dir {
            return Err(BackendError::Unsupported(format!("link to directory {}", path)).into());
        }
        let driver = state
            .mount_for(&path)
            .map(|mount| mount.config.driver.clone())
            .ok_or_else(|| BackendError::StorageNotFound(path.clone()))?;

        let mut link = Link::url(format!("{}://{}", driver, path.trim_start_matches('/')));
        if let Some(range) = args.header.get("Range") {
            link.header.insert("Range".to_string(), range.clone());
        }
        Ok(link)
    }
}
