//! Path resolution and permission gating
//!
//! This module provides:
//! - Joining caller paths onto a user's base path
//! - Role-based permission merging and path limits
//! - Nearest-ancestor metadata lookup for the write override
//!
//! Every mutating operation goes through [`resolve`] for each path and then
//! [`authorize`] or [`authorize_write`] before touching a backend.

pub mod meta;
pub mod path;
pub mod permissions;

pub use meta::{nearest_meta, MemoryMetaStore, MetaStore};
pub use permissions::{
    can_write, check_path_limit, has_permission, merge_role_permissions, Permission,
};

use crate::error::{Error, Result};
use crate::types::User;
use tracing::debug;

/// Join `req_path` onto the user's base path and enforce the path limit
pub fn resolve(user: &User, req_path: &str) -> Result<String> {
    let path = user.join_path(req_path)?;
    if !check_path_limit(user, &path) {
        debug!("Path limit rejected {} for user {}", path, user.username);
        return Err(Error::PermissionDenied);
    }
    Ok(path)
}

/// Require `flag` in the merged role permissions at `path`
pub fn authorize(user: &User, path: &str, flag: Permission) -> Result<()> {
    let perm = merge_role_permissions(user, path);
    if !has_permission(perm, flag) {
        debug!(
            "User {} lacks permission {:#x} at {}",
            user.username,
            flag.bits(),
            path
        );
        return Err(Error::PermissionDenied);
    }
    Ok(())
}

/// Require write at `path`, falling back to the nearest meta of its parent
///
/// The meta is looked up from the parent directory but judged against `path`
/// itself, so a non-recursive meta only grants writes to its own path.
pub async fn authorize_write(user: &User, path: &str, metas: &dyn MetaStore) -> Result<()> {
    let perm = merge_role_permissions(user, path);
    if has_permission(perm, Permission::WRITE) {
        return Ok(());
    }

    let meta = nearest_meta(metas, &path::parent_dir(path)).await?;
    if !can_write(meta.as_ref(), path) {
        return Err(Error::PermissionDenied);
    }

    debug!("Meta override grants write at {} for {}", path, user.username);
    Ok(())
}
