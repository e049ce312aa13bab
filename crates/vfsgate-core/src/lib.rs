//! vfsgate Core Library
//!
//! This crate provides the mutation gateway of a multi-backend virtual
//! filesystem, including:
//! - Path resolution against a user's base path
//! - Role and metadata based permission checks
//! - Batch mkdir/move/copy/rename/remove with conflict pre-flight
//! - Empty directory pruning
//! - Signed proxy links and backend-native direct links
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       vfsgate-core                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  service.rs    - Request binding, admin gate, envelopes     │
//! │  manage/       - Dispatcher, pruner, link resolver          │
//! │  access/       - Paths, permissions, meta lookup            │
//! │  storage/      - VirtualFs trait, in-memory backend         │
//! │  tasks.rs      - Deferred transfer hand-off                 │
//! │  sign.rs       - HMAC link signatures                       │
//! │  config.rs     - Gateway configuration                      │
//! │  types/        - Shared type definitions                    │
//! │  error.rs      - Error types                                │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod access;
pub mod config;
pub mod error;
pub mod manage;
pub mod service;
pub mod sign;
pub mod storage;
pub mod tasks;
pub mod telemetry;
pub mod types;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;

pub use access::{MemoryMetaStore, MetaStore, Permission};
pub use config::GatewayConfig;
pub use manage::{Dispatcher, EmptyDirPruner, LinkResolver, MutationEvent, PruneReport};
pub use service::FsService;
pub use sign::{HmacSigner, Signer};
pub use storage::{MemoryFs, StorageConfig, VirtualFs};
pub use tasks::{TaskQueue, TransferJob, TransferKind};
