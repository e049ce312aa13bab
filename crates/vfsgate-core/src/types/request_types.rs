//! Request bodies bound by the service layer

use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MkdirOrLinkReq {
    pub path: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MoveCopyReq {
    pub src_dir: String,
    pub dst_dir: String,
    #[serde(default)]
    pub names: Vec<String>,
    #[serde(default)]
    pub overwrite: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RenameReq {
    pub path: String,
    pub name: String,
    #[serde(default)]
    pub overwrite: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RemoveReq {
    pub dir: String,
    #[serde(default)]
    pub names: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RemoveEmptyDirectoryReq {
    pub src_dir: String,
}

/// Bind a JSON request body, mapping decode failures to `InvalidRequest`
pub fn bind<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    serde_json::from_slice(body).map_err(|e| Error::InvalidRequest(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_defaults() {
        let req: MoveCopyReq = bind(br#"{"src_dir":"/a","dst_dir":"/b"}"#).unwrap();
        assert!(req.names.is_empty());
        assert!(!req.overwrite);
    }

    #[test]
    fn test_bind_malformed() {
        let result = bind::<RemoveReq>(b"{not json");
        assert!(matches!(result, Err(Error::InvalidRequest(_))));

        let result = bind::<RenameReq>(br#"{"path":"/a"}"#);
        assert!(matches!(result, Err(Error::InvalidRequest(_))));
    }
}
