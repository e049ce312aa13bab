//! Permission-gated filesystem mutations
//!
//! Batches are not atomic. Unless `overwrite` is set, a pre-flight check
//! rejects the whole batch when any destination exists. After that, items
//! run in input order and the first failure stops the batch with
//! [`Error::Batch`]. Items already applied stay applied.

use super::prune::{EmptyDirPruner, PruneReport};
use crate::access::path::{parent_dir, path_join};
use crate::access::{self, MetaStore, Permission};
use crate::error::{Error, Result};
use crate::storage::VirtualFs;
use crate::types::*;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

const EVENT_CAPACITY: usize = 256;

/// Notification published after a mutation took effect
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum MutationEvent {
    DirCreated { path: String },
    Moved { src_dir: String, dst_dir: String, names: Vec<String> },
    Copied { src_dir: String, dst_dir: String, names: Vec<String> },
    Renamed { path: String, name: String },
    Removed { dir: String, names: Vec<String> },
    Pruned { root: String, removed: Vec<String> },
}

/// Runs mkdir/move/copy/rename/remove/prune on behalf of a user
pub struct Dispatcher {
    fs: Arc<dyn VirtualFs>,
    metas: Arc<dyn MetaStore>,
    events: broadcast::Sender<MutationEvent>,
}

impl Dispatcher {
    pub fn new(fs: Arc<dyn VirtualFs>, metas: Arc<dyn MetaStore>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self { fs, metas, events }
    }

    /// Subscribe to mutation notifications
    pub fn subscribe(&self) -> broadcast::Receiver<MutationEvent> {
        self.events.subscribe()
    }

    pub async fn mkdir(&self, user: &User, req: &MkdirOrLinkReq) -> Result<()> {
        let path = access::resolve(user, &req.path)?;
        access::authorize_write(user, &path, self.metas.as_ref()).await?;

        self.fs.make_dir(&path).await?;
        info!("Created directory {}", path);
        self.publish(MutationEvent::DirCreated { path });
        Ok(())
    }

    pub async fn move_objs(&self, user: &User, req: &MoveCopyReq) -> Result<()> {
        validate_names(&req.names)?;
        let src_dir = access::resolve(user, &req.src_dir)?;
        let dst_dir = access::resolve(user, &req.dst_dir)?;
        access::authorize(user, &src_dir, Permission::MOVE)?;
        if !req.overwrite {
            self.check_conflicts(&dst_dir, &req.names).await?;
        }

        let total = req.names.len();
        let mut moved = Vec::with_capacity(total);
        let mut failure = None;
        for (i, name) in req.names.iter().enumerate() {
            let src = path_join(&src_dir, name);
            match self.fs.move_obj(&src, &dst_dir, i + 1 < total).await {
                Ok(()) => {
                    debug!("Moved {} to {}", src, dst_dir);
                    moved.push(name.clone());
                }
                Err(e) => {
                    failure = Some(batch_error(name, moved.len(), Vec::new(), e));
                    break;
                }
            }
        }

        if !moved.is_empty() {
            self.publish(MutationEvent::Moved {
                src_dir: src_dir.clone(),
                dst_dir: dst_dir.clone(),
                names: moved,
            });
        }
        match failure {
            Some(err) => Err(err),
            None => {
                info!("Moved {} objects from {} to {}", total, src_dir, dst_dir);
                Ok(())
            }
        }
    }

    /// Copy a batch; returns the handles of every item deferred to the task engine
    pub async fn copy(&self, user: &User, req: &MoveCopyReq) -> Result<Vec<TaskInfo>> {
        validate_names(&req.names)?;
        let src_dir = access::resolve(user, &req.src_dir)?;
        let dst_dir = access::resolve(user, &req.dst_dir)?;
        access::authorize(user, &src_dir, Permission::COPY)?;
        if !req.overwrite {
            self.check_conflicts(&dst_dir, &req.names).await?;
        }

        let total = req.names.len();
        let mut tasks = Vec::new();
        let mut copied = Vec::with_capacity(total);
        let mut failure = None;
        for (i, name) in req.names.iter().enumerate() {
            let src = path_join(&src_dir, name);
            match self.fs.copy(&src, &dst_dir, i + 1 < total).await {
                Ok(Some(task)) => {
                    debug!("Deferred copy of {} as task {}", src, task.id);
                    tasks.push(task);
                    copied.push(name.clone());
                }
                Ok(None) => {
                    debug!("Copied {} to {}", src, dst_dir);
                    copied.push(name.clone());
                }
                Err(e) => {
                    let produced = std::mem::take(&mut tasks);
                    failure = Some(batch_error(name, copied.len(), produced, e));
                    break;
                }
            }
        }

        if !copied.is_empty() {
            self.publish(MutationEvent::Copied {
                src_dir: src_dir.clone(),
                dst_dir: dst_dir.clone(),
                names: copied,
            });
        }
        match failure {
            Some(err) => Err(err),
            None => {
                info!(
                    "Copied {} objects from {} to {} ({} deferred)",
                    total,
                    src_dir,
                    dst_dir,
                    tasks.len()
                );
                Ok(tasks)
            }
        }
    }

    pub async fn rename(&self, user: &User, req: &RenameReq) -> Result<()> {
        validate_name(&req.name)?;
        let path = access::resolve(user, &req.path)?;
        access::authorize(user, &path, Permission::RENAME)?;

        if !req.overwrite {
            let dst = path_join(&parent_dir(&path), &req.name);
            if dst != path && self.exists(&dst).await {
                return Err(Error::Conflict(format!("file [{}] exists", req.name)));
            }
        }

        self.fs.rename(&path, &req.name).await?;
        info!("Renamed {} to {}", path, req.name);
        self.publish(MutationEvent::Renamed {
            path,
            name: req.name.clone(),
        });
        Ok(())
    }

    pub async fn remove(&self, user: &User, req: &RemoveReq) -> Result<()> {
        validate_names(&req.names)?;
        let dir = access::resolve(user, &req.dir)?;
        access::authorize(user, &dir, Permission::REMOVE)?;

        let mut removed = Vec::with_capacity(req.names.len());
        let mut failure = None;
        for name in &req.names {
            let path = path_join(&dir, name);
            match self.fs.remove(&path).await {
                Ok(()) => {
                    debug!("Removed {}", path);
                    removed.push(name.clone());
                }
                Err(e) => {
                    failure = Some(batch_error(name, removed.len(), Vec::new(), e));
                    break;
                }
            }
        }

        let count = removed.len();
        if count > 0 {
            self.publish(MutationEvent::Removed {
                dir: dir.clone(),
                names: removed,
            });
        }
        match failure {
            Some(err) => Err(err),
            None => {
                info!("Removed {} objects from {}", count, dir);
                Ok(())
            }
        }
    }

    /// Remove every directory under `src_dir` that is or becomes empty
    pub async fn remove_empty_dirs(
        &self,
        user: &User,
        req: &RemoveEmptyDirectoryReq,
    ) -> Result<PruneReport> {
        let src_dir = access::resolve(user, &req.src_dir)?;
        access::authorize(user, &src_dir, Permission::REMOVE)?;
        // Only a failed lookup matters here, not the meta itself
        access::nearest_meta(self.metas.as_ref(), &src_dir).await?;

        let mut pruner = EmptyDirPruner::new(self.fs.as_ref(), src_dir.clone());
        let outcome = pruner.run().await;
        let report = pruner.into_report();

        if !report.removed.is_empty() {
            self.publish(MutationEvent::Pruned {
                root: src_dir.clone(),
                removed: report.removed.clone(),
            });
        }
        match outcome {
            Ok(()) => {
                info!(
                    "Pruned {} empty directories under {}",
                    report.removed.len(),
                    src_dir
                );
                Ok(report)
            }
            Err(e) => {
                error!(
                    "Pruning {} stopped after {} removals: {}",
                    src_dir,
                    report.removed.len(),
                    e
                );
                Err(e)
            }
        }
    }

    async fn exists(&self, path: &str) -> bool {
        self.fs.get(path).await.is_ok()
    }

    /// All-or-nothing existence check of every destination
    async fn check_conflicts(&self, dst_dir: &str, names: &[String]) -> Result<()> {
        for name in names {
            if self.exists(&path_join(dst_dir, name)).await {
                return Err(Error::Conflict(format!("file [{}] exists", name)));
            }
        }
        Ok(())
    }

    fn publish(&self, event: MutationEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }
}

/// Batch item names must be plain, non-empty entry names
pub fn validate_names(names: &[String]) -> Result<()> {
    if names.is_empty() {
        return Err(Error::InvalidRequest("Empty file names".to_string()));
    }
    names.iter().try_for_each(|name| validate_name(name))
}

pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
        return Err(Error::InvalidRequest(format!("invalid file name [{}]", name)));
    }
    Ok(())
}

fn batch_error(name: &str, completed: usize, tasks: Vec<TaskInfo>, source: Error) -> Error {
    warn!(
        "Batch stopped at [{}] after {} items: {}",
        name, completed, source
    );
    Error::Batch {
        name: name.to_string(),
        completed,
        tasks,
        source: Box::new(source),
    }
}
