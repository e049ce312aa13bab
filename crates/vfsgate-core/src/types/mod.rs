//! Core type definitions for vfsgate
//!
//! This module contains the shared types used across the gateway: users and
//! their roles, backend objects, links, task summaries, request bodies and
//! the response envelope.

mod link_types;
mod request_types;
mod response_types;
mod task_types;
mod user_types;

pub use link_types::*;
pub use request_types::*;
pub use response_types::*;
pub use task_types::*;
pub use user_types::*;

use serde::{Deserialize, Serialize};

/// A directory entry as reported by a backend listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Obj {
    pub name: String,
    pub is_dir: bool,
    pub size: u64,
    pub modified: Option<chrono::DateTime<chrono::Utc>>,
}

/// Arguments for a backend listing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListArgs {
    /// Bypass any listing cache and read live state
    pub refresh: bool,
}

impl ListArgs {
    pub fn refresh() -> Self {
        Self { refresh: true }
    }
}
