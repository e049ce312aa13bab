//! Storage backend layer
//!
//! This module provides:
//! - The [`VirtualFs`] trait the gateway drives
//! - [`MemoryFs`], a multi-mount in-memory implementation with a call
//!   journal and fault injection

mod memory;
mod traits;

pub use memory::{FsCall, FsOp, MemoryFs};
pub use traits::{StorageConfig, VirtualFs};

#[cfg(test)]
pub use traits::MockVirtualFs;
