//! Task handle types

use serde::{Deserialize, Serialize};

/// Lifecycle state reported by the task engine
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    Pending,
    Running,
    Succeeded,
    Canceled,
    Errored,
}

impl Default for TaskState {
    fn default() -> Self {
        Self::Pending
    }
}

/// Summary of a task handle returned to the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskInfo {
    pub id: String,
    pub name: String,
    pub state: TaskState,
    pub progress: f64,
    pub total_bytes: u64,
    #[serde(default)]
    pub error: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}
