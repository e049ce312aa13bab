//! Direct link types

use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use tokio::io::AsyncRead;

/// An open, readable handle attached to a backend-native link
pub trait LinkFile: AsyncRead + Send + Unpin {
    /// Release the handle. Called exactly once by the owner.
    fn close(&mut self) -> std::io::Result<()>;
}

/// Link to the content of a virtual path
#[derive(Serialize, Default)]
pub struct Link {
    pub url: String,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub header: HashMap<String, String>,
    /// Validity in seconds, when the backend reports one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration: Option<u64>,
    #[serde(skip)]
    pub file: Option<Box<dyn LinkFile>>,
}

impl Link {
    pub fn url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn with_file(mut self, file: Box<dyn LinkFile>) -> Self {
        self.file = Some(file);
        self
    }
}

impl fmt::Debug for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Link")
            .field("url", &self.url)
            .field("header", &self.header)
            .field("expiration", &self.expiration)
            .field("file", &self.file.is_some())
            .finish()
    }
}

/// Request context forwarded to backends that need it to build a link
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkArgs {
    pub ip: Option<String>,
    pub header: HashMap<String, String>,
}

/// Caller context of a link request
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub client_ip: Option<String>,
    pub headers: HashMap<String, String>,
    /// API base derived from the incoming request; falls back to the site URL
    pub api_url: Option<String>,
}

impl RequestContext {
    pub fn link_args(&self) -> LinkArgs {
        LinkArgs {
            ip: self.client_ip.clone(),
            header: self.headers.clone(),
        }
    }
}
