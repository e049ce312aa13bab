//! Message-passing hand-off to the background task engine
//!
//! Backends that defer long transfers submit a [`TransferJob`] through a
//! [`TaskQueue`] and get a [`TaskInfo`] back immediately. The engine owns the
//! receiving half and everything that happens after submission.

use crate::error::{Result, TaskError};
use crate::types::{TaskInfo, TaskState};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Kind of deferred work
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TransferKind {
    Copy,
}

/// Work order handed to the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferJob {
    pub id: String,
    pub kind: TransferKind,
    pub src_path: String,
    pub dst_dir: String,
}

/// Sending half of the task channel
#[derive(Debug, Clone)]
pub struct TaskQueue {
    tx: mpsc::Sender<TransferJob>,
}

/// Create a bounded task channel
pub fn channel(capacity: usize) -> (TaskQueue, mpsc::Receiver<TransferJob>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (TaskQueue { tx }, rx)
}

impl TaskQueue {
    /// Enqueue a job without waiting and return its handle
    pub fn submit(&self, kind: TransferKind, src_path: &str, dst_dir: &str) -> Result<TaskInfo> {
        let job = TransferJob {
            id: uuid::Uuid::new_v4().to_string(),
            kind,
            src_path: src_path.to_string(),
            dst_dir: dst_dir.to_string(),
        };
        let info = TaskInfo {
            id: job.id.clone(),
            name: job.display_name(),
            state: TaskState::Pending,
            progress: 0.0,
            total_bytes: 0,
            error: String::new(),
            created_at: chrono::Utc::now(),
        };

        self.tx.try_send(job).map_err(|e| match e {
            mpsc::error::TrySendError::Full(job) => {
                warn!("Task queue full, dropping job {}", job.id);
                TaskError::QueueFull
            }
            mpsc::error::TrySendError::Closed(_) => TaskError::EngineClosed,
        })?;

        debug!("Submitted task {}", info.id);
        Ok(info)
    }
}

impl TransferJob {
    pub fn display_name(&self) -> String {
        let verb = match self.kind {
            TransferKind::Copy => "copy",
        };
        format!("{} [{}] to [{}]", verb, self.src_path, self.dst_dir)
    }
}
