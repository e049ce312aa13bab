//! Direct link resolution
//!
//! The resolver takes a fully-qualified virtual path and trusts it as is: it
//! never joins a user base path and never checks permissions. Only elevated
//! callers may reach it (see [`crate::service::FsService::link`]).

use crate::access::path::encode_path;
use crate::error::Result;
use crate::sign::Signer;
use crate::storage::VirtualFs;
use crate::types::{Link, LinkFile, RequestContext};
use std::sync::Arc;
use tracing::{debug, error};

/// Closes a link file when dropped
pub struct FileGuard {
    file: Box<dyn LinkFile>,
}

impl FileGuard {
    pub fn new(file: Box<dyn LinkFile>) -> Self {
        Self { file }
    }
}

impl Drop for FileGuard {
    fn drop(&mut self) {
        if let Err(e) = self.file.close() {
            error!("close link data error: {}", e);
        }
    }
}

/// Resolves raw virtual paths to proxy or backend-native links
pub struct LinkResolver {
    fs: Arc<dyn VirtualFs>,
    signer: Arc<dyn Signer>,
    site_url: String,
}

impl LinkResolver {
    pub fn new(fs: Arc<dyn VirtualFs>, signer: Arc<dyn Signer>, site_url: impl Into<String>) -> Self {
        Self {
            fs,
            signer,
            site_url: site_url.into(),
        }
    }

    pub async fn resolve(&self, raw_path: &str, ctx: &RequestContext) -> Result<Link> {
        let storage = self.fs.storage_config(raw_path)?;

        if storage.only_local {
            let api_url = ctx.api_url.as_deref().unwrap_or(&self.site_url);
            let url = format!(
                "{}/p{}?d&sign={}",
                api_url.trim_end_matches('/'),
                encode_path(raw_path),
                self.signer.sign(raw_path)
            );
            debug!("Signed proxy link for {} on {}", raw_path, storage.driver);
            return Ok(Link::url(url));
        }

        let mut link = self.fs.link(raw_path, ctx.link_args()).await?;
        let _guard = link.file.take().map(FileGuard::new);
        debug!("Backend link for {} on {}", raw_path, storage.driver);
        Ok(link)
    }
}
