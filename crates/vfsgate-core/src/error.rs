//! Error types for vfsgate core

use crate::types::TaskInfo;
use thiserror::Error;

/// Main error type for gateway operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("{0}")]
    InvalidRequest(String),

    #[error("{0}")]
    InvalidPath(String),

    #[error("permission denied")]
    PermissionDenied,

    #[error("{0}")]
    Conflict(String),

    #[error("failed get meta: {0}")]
    MetaLookup(String),

    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("Task error: {0}")]
    Task(#[from] TaskError),

    #[error("Sign error: {0}")]
    Sign(#[from] SignError),

    #[error("Config error: {0}")]
    Config(String),

    /// First failing item of a non-atomic batch. Items before it were applied.
    #[error("{source}")]
    Batch {
        name: String,
        completed: usize,
        tasks: Vec<TaskInfo>,
        #[source]
        source: Box<Error>,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Storage backend errors
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("object not found: {0}")]
    NotFound(String),

    #[error("object already exists: {0}")]
    AlreadyExists(String),

    #[error("not a directory: {0}")]
    NotADirectory(String),

    #[error("storage not found for path: {0}")]
    StorageNotFound(String),

    #[error("operation not supported: {0}")]
    Unsupported(String),

    #[error("driver error: {0}")]
    Driver(String),
}

/// Task engine hand-off errors
#[derive(Error, Debug)]
pub enum TaskError {
    #[error("task queue is full")]
    QueueFull,

    #[error("task engine is not running")]
    EngineClosed,
}

/// Link signature errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum SignError {
    #[error("malformed sign")]
    Malformed,

    #[error("sign expired")]
    Expired,

    #[error("sign mismatch")]
    Mismatch,

    #[error("invalid sign key: {0}")]
    InvalidKey(String),
}

/// Response status class of an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    BadRequest,
    Forbidden,
    Internal,
}

impl StatusClass {
    pub fn code(self) -> u16 {
        match self {
            Self::BadRequest => 400,
            Self::Forbidden => 403,
            Self::Internal => 500,
        }
    }
}

impl Error {
    /// Status class carried in the response envelope
    pub fn status(&self) -> StatusClass {
        match self {
            Error::InvalidRequest(_) => StatusClass::BadRequest,
            Error::InvalidPath(_)
            | Error::PermissionDenied
            | Error::Conflict(_)
            | Error::Sign(_) => StatusClass::Forbidden,
            Error::Batch { source, .. } => source.status(),
            Error::MetaLookup(_)
            | Error::Backend(_)
            | Error::Task(_)
            | Error::Config(_)
            | Error::Io(_)
            | Error::Json(_)
            | Error::Internal(_) => StatusClass::Internal,
        }
    }

    /// Check whether this is a backend "not found"
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::Backend(BackendError::NotFound(_)) => true,
            Error::Batch { source, .. } => source.is_not_found(),
            _ => false,
        }
    }

    /// Task handles produced before the failure, if any
    pub fn tasks(&self) -> &[TaskInfo] {
        match self {
            Error::Batch { tasks, .. } => tasks,
            _ => &[],
        }
    }
}

impl serde::Serialize for Error {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classes() {
        assert_eq!(Error::InvalidRequest("x".into()).status().code(), 400);
        assert_eq!(Error::PermissionDenied.status().code(), 403);
        assert_eq!(Error::Conflict("file [a] exists".into()).status().code(), 403);
        assert_eq!(Error::InvalidPath("bad".into()).status().code(), 403);
        assert_eq!(Error::MetaLookup("db down".into()).status().code(), 500);
        assert_eq!(
            Error::Backend(BackendError::Driver("boom".into())).status().code(),
            500
        );
    }

    #[test]
    fn test_batch_delegates_to_source() {
        let err = Error::Batch {
            name: "y".into(),
            completed: 1,
            tasks: Vec::new(),
            source: Box::new(Error::Backend(BackendError::NotFound("/a/y".into()))),
        };

        assert_eq!(err.status(), StatusClass::Internal);
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Backend error: object not found: /a/y");
    }

    #[test]
    fn test_serialize_as_message() {
        let json = serde_json::to_string(&Error::PermissionDenied).unwrap();
        assert_eq!(json, "\"permission denied\"");
    }
}
