//! Empty directory pruning
//!
//! Removes every directory below a root that is, or becomes, empty. Work is
//! driven by a FIFO queue instead of recursion so tree depth is bounded only
//! by memory. Each listed directory instance gets an arena index; the index,
//! not the [`Obj`] value, is its identity, so two listings of the same name
//! never collapse into one entry.

use crate::access::path::path_join;
use crate::error::{Error, Result};
use crate::storage::VirtualFs;
use crate::types::{ListArgs, Obj};
use serde::Serialize;
use std::collections::{HashSet, VecDeque};
use tracing::debug;

/// Directories removed by a pruning run, in removal order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PruneReport {
    pub root: String,
    pub removed: Vec<String>,
}

#[derive(Debug)]
struct PendingDir {
    obj: Obj,
    /// Path of the directory that listed `obj`
    dir: String,
    parent: Option<usize>,
}

/// Queue-driven empty directory remover for one root
pub struct EmptyDirPruner<'a> {
    fs: &'a dyn VirtualFs,
    root: String,
    arena: Vec<PendingDir>,
    queue: VecDeque<usize>,
    removed: HashSet<String>,
    removed_order: Vec<String>,
}

impl<'a> EmptyDirPruner<'a> {
    pub fn new(fs: &'a dyn VirtualFs, root: impl Into<String>) -> Self {
        Self {
            fs,
            root: root.into(),
            arena: Vec::new(),
            queue: VecDeque::new(),
            removed: HashSet::new(),
            removed_order: Vec::new(),
        }
    }

    /// Run until the queue drains
    ///
    /// The root itself is never removed. The first backend error aborts the
    /// run as `Internal`; directories removed before it stay removed.
    pub async fn run(&mut self) -> Result<()> {
        let root = self.root.clone();
        let entries = self
            .fs
            .list(&root, ListArgs::default())
            .await
            .map_err(|e| abort("list", &root, e))?;
        for obj in entries.into_iter().filter(|obj| obj.is_dir) {
            self.enqueue(obj, &root, None);
        }

        while let Some(id) = self.queue.pop_front() {
            let path = path_join(&self.arena[id].dir, &self.arena[id].obj.name);
            if self.removed.contains(&path) {
                continue;
            }

            // Emptiness must reflect live state, never a cached listing
            let children = self
                .fs
                .list(&path, ListArgs::refresh())
                .await
                .map_err(|e| abort("list", &path, e))?;

            if children.is_empty() {
                self.fs
                    .remove(&path)
                    .await
                    .map_err(|e| abort("remove", &path, e))?;
                debug!("Removed empty directory {}", path);

                self.removed.insert(path.clone());
                self.removed_order.push(path);
                if let Some(parent) = self.arena[id].parent {
                    self.queue.push_back(parent);
                }
            } else {
                for child in children.into_iter().filter(|obj| obj.is_dir) {
                    self.enqueue(child, &path, Some(id));
                }
            }
        }

        Ok(())
    }

    pub fn into_report(self) -> PruneReport {
        PruneReport {
            root: self.root,
            removed: self.removed_order,
        }
    }

    fn enqueue(&mut self, obj: Obj, dir: &str, parent: Option<usize>) {
        let id = self.arena.len();
        self.arena.push(PendingDir {
            obj,
            dir: dir.to_string(),
            parent,
        });
        self.queue.push_back(id);
    }
}

fn abort(op: &str, path: &str, err: Error) -> Error {
    Error::Internal(format!("failed to {} {}: {}", op, path, err))
}
