//! Permission bitmask and role evaluation

use super::path::is_sub_path;
use crate::types::{Meta, User};
use serde::{Deserialize, Serialize};
use std::ops::{BitOr, BitOrAssign};

/// Set of permission flags granted to a user at a path
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(u32);

impl Permission {
    pub const NONE: Self = Self(0);
    pub const READ: Self = Self(1 << 0);
    pub const SEE_HIDES: Self = Self(1 << 1);
    pub const OFFLINE_DOWNLOAD: Self = Self(1 << 2);
    pub const WRITE: Self = Self(1 << 3);
    pub const RENAME: Self = Self(1 << 4);
    pub const MOVE: Self = Self(1 << 5);
    pub const COPY: Self = Self(1 << 6);
    pub const REMOVE: Self = Self(1 << 7);
    pub const ALL: Self = Self((1 << 8) - 1);

    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    /// All bits of `flag` are set
    pub const fn contains(self, flag: Self) -> bool {
        self.0 & flag.0 == flag.0
    }
}

impl BitOr for Permission {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for Permission {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// Union of every role scope that covers `path`
pub fn merge_role_permissions(user: &User, path: &str) -> Permission {
    let mut perm = Permission::NONE;
    for scope in user.roles.iter().flat_map(|role| role.scopes.iter()) {
        if is_sub_path(&scope.path, path) {
            perm |= scope.permission;
        }
    }
    perm
}

pub fn has_permission(perm: Permission, flag: Permission) -> bool {
    perm.contains(flag)
}

/// Check if any role scope allows access to the subtree at `path`
pub fn check_path_limit(user: &User, path: &str) -> bool {
    user.roles
        .iter()
        .flat_map(|role| role.scopes.iter())
        .any(|scope| is_sub_path(&scope.path, path))
}

/// Whether a meta override grants write inside `dir`
pub fn can_write(meta: Option<&Meta>, dir: &str) -> bool {
    match meta {
        Some(meta) if meta.write => meta.write_sub || meta.path == dir,
        _ => false,
    }
}
