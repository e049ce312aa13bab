//! User, role and metadata types

use crate::access::permissions::Permission;
use crate::access::path::join_base_path;
use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Authenticated user, owned by the auth layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub username: String,
    pub base_path: String,
    #[serde(default)]
    pub roles: Vec<Role>,
    #[serde(default)]
    pub admin: bool,
}

impl User {
    pub fn new(id: u64, username: impl Into<String>, base_path: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
            base_path: base_path.into(),
            roles: Vec::new(),
            admin: false,
        }
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.roles.push(role);
        self
    }

    pub fn with_admin(mut self, admin: bool) -> Self {
        self.admin = admin;
        self
    }

    pub fn is_admin(&self) -> bool {
        self.admin
    }

    /// Join a caller-relative path onto the user's base path
    pub fn join_path(&self, req_path: &str) -> Result<String> {
        join_base_path(&self.base_path, req_path)
    }
}

/// Named bundle of path-scoped permissions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Role {
    pub name: String,
    #[serde(default)]
    pub scopes: Vec<PermissionScope>,
}

impl Role {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            scopes: Vec::new(),
        }
    }

    pub fn with_scope(mut self, path: impl Into<String>, permission: Permission) -> Self {
        self.scopes.push(PermissionScope {
            path: path.into(),
            permission,
        });
        self
    }
}

/// Permission bits granted under a path prefix
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionScope {
    pub path: String,
    pub permission: Permission,
}

/// Per-path override discovered by nearest-ancestor lookup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meta {
    pub path: String,
    #[serde(default)]
    pub write: bool,
    /// Write grant also applies below `path`
    #[serde(default)]
    pub write_sub: bool,
}

impl Meta {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            write: false,
            write_sub: false,
        }
    }

    pub fn writable(mut self, write_sub: bool) -> Self {
        self.write = true;
        self.write_sub = write_sub;
        self
    }
}
