//! Filesystem management operations
//!
//! This module provides:
//! - Batch mutations with permission checks and conflict pre-flight
//! - Empty directory pruning
//! - Direct link resolution for trusted callers

mod dispatcher;
mod link;
mod prune;

pub use dispatcher::{validate_name, validate_names, Dispatcher, MutationEvent};
pub use link::{FileGuard, LinkResolver};
pub use prune::{EmptyDirPruner, PruneReport};
