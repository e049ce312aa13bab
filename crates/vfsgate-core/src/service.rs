//! Request-level entry points
//!
//! Each method binds a JSON body, runs the operation for an authenticated
//! [`User`] and wraps the outcome in a [`Resp`] envelope.

use crate::access::MetaStore;
use crate::config::GatewayConfig;
use crate::error::{Error, Result, StatusClass};
use crate::manage::{Dispatcher, LinkResolver, MutationEvent};
use crate::sign::Signer;
use crate::storage::VirtualFs;
use crate::types::*;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, error};

pub struct FsService {
    dispatcher: Dispatcher,
    links: LinkResolver,
}

impl FsService {
    pub fn new(
        fs: Arc<dyn VirtualFs>,
        metas: Arc<dyn MetaStore>,
        signer: Arc<dyn Signer>,
        site_url: impl Into<String>,
    ) -> Self {
        Self {
            links: LinkResolver::new(fs.clone(), signer, site_url),
            dispatcher: Dispatcher::new(fs, metas),
        }
    }

    /// Build from a validated config, signing links with its secret
    pub fn from_config(
        config: &GatewayConfig,
        fs: Arc<dyn VirtualFs>,
        metas: Arc<dyn MetaStore>,
    ) -> Result<Self> {
        config.validate()?;
        let signer = Arc::new(config.signer()?);
        Ok(Self::new(fs, metas, signer, config.site_url.clone()))
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MutationEvent> {
        self.dispatcher.subscribe()
    }

    pub async fn mkdir(&self, user: &User, body: &[u8]) -> Resp<Value> {
        let result = match bind::<MkdirOrLinkReq>(body) {
            Ok(req) => self.dispatcher.mkdir(user, &req).await,
            Err(e) => Err(e),
        };
        respond("mkdir", result)
    }

    pub async fn move_objs(&self, user: &User, body: &[u8]) -> Resp<Value> {
        let result = match bind::<MoveCopyReq>(body) {
            Ok(req) => self.dispatcher.move_objs(user, &req).await,
            Err(e) => Err(e),
        };
        respond("move", result)
    }

    /// Copy a batch; `data.tasks` lists deferred copies, also on failure
    pub async fn copy(&self, user: &User, body: &[u8]) -> Resp<Value> {
        let result = match bind::<MoveCopyReq>(body) {
            Ok(req) => self.dispatcher.copy(user, &req).await,
            Err(e) => Err(e),
        };
        match result {
            Ok(tasks) => Resp::success(Some(json!({ "tasks": tasks }))),
            Err(e) => {
                let data = json!({ "tasks": e.tasks() });
                failure("copy", &e, Some(data))
            }
        }
    }

    pub async fn rename(&self, user: &User, body: &[u8]) -> Resp<Value> {
        let result = match bind::<RenameReq>(body) {
            Ok(req) => self.dispatcher.rename(user, &req).await,
            Err(e) => Err(e),
        };
        respond("rename", result)
    }

    pub async fn remove(&self, user: &User, body: &[u8]) -> Resp<Value> {
        let result = match bind::<RemoveReq>(body) {
            Ok(req) => self.dispatcher.remove(user, &req).await,
            Err(e) => Err(e),
        };
        respond("remove", result)
    }

    pub async fn remove_empty_dirs(&self, user: &User, body: &[u8]) -> Resp<Value> {
        let result = match bind::<RemoveEmptyDirectoryReq>(body) {
            Ok(req) => self.dispatcher.remove_empty_dirs(user, &req).await.map(|_| ()),
            Err(e) => Err(e),
        };
        respond("remove empty directory", result)
    }

    /// Resolve a direct link; admin only, the path is taken as is
    pub async fn link(&self, user: &User, body: &[u8], ctx: &RequestContext) -> Resp<Value> {
        match self.resolve_link(user, body, ctx).await {
            Ok(data) => Resp::success(Some(data)),
            Err(e) => failure("link", &e, None),
        }
    }

    async fn resolve_link(&self, user: &User, body: &[u8], ctx: &RequestContext) -> Result<Value> {
        if !user.is_admin() {
            return Err(Error::PermissionDenied);
        }
        let req: MkdirOrLinkReq = bind(body)?;
        let link = self.links.resolve(&req.path, ctx).await?;
        Ok(serde_json::to_value(&link)?)
    }
}

fn respond(op: &str, result: Result<()>) -> Resp<Value> {
    match result {
        Ok(()) => Resp::success(None),
        Err(e) => failure(op, &e, None),
    }
}

fn failure(op: &str, err: &Error, data: Option<Value>) -> Resp<Value> {
    match err.status() {
        StatusClass::Internal => error!("{} failed: {}", op, err),
        _ => debug!("{} rejected: {}", op, err),
    }
    Resp::failure(err, data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::{MemoryMetaStore, Permission};
    use crate::sign::HmacSigner;
    use crate::storage::{FsOp, MemoryFs, StorageConfig};
    use crate::tasks;
    use pretty_assertions::assert_eq;

    fn admin() -> User {
        User::new(1, "admin", "/")
            .with_admin(true)
            .with_role(Role::new("all").with_scope("/", Permission::ALL))
    }

    fn member() -> User {
        User::new(2, "member", "/").with_role(Role::new("all").with_scope("/", Permission::ALL))
    }

    fn service(fs: Arc<MemoryFs>) -> FsService {
        let signer = Arc::new(HmacSigner::new(b"secret", None).unwrap());
        FsService::new(fs, Arc::new(MemoryMetaStore::new()), signer, "https://site")
    }

    fn memory_fs() -> Arc<MemoryFs> {
        let fs = Arc::new(MemoryFs::new());
        fs.add_mount(StorageConfig::new("/", "mem")).unwrap();
        fs
    }

    #[tokio::test]
    async fn test_success_envelope() {
        let fs = memory_fs();
        let svc = service(fs.clone());

        let resp = svc.mkdir(&admin(), br#"{"path":"/docs"}"#).await;

        assert!(resp.is_success());
        assert_eq!(resp.message, "success");
        assert_eq!(resp.data, None);
        assert!(fs.exists("/docs"));
    }

    #[tokio::test]
    async fn test_error_envelopes_carry_status() {
        let fs = memory_fs();
        fs.add_file("/a/x", 1).unwrap();
        fs.add_file("/b/x", 1).unwrap();
        let svc = service(fs);

        let malformed = svc.remove(&admin(), b"{oops").await;
        assert_eq!(malformed.code, 400);

        let empty = svc.remove(&admin(), br#"{"dir":"/a"}"#).await;
        assert_eq!(empty.code, 400);
        assert_eq!(empty.message, "Empty file names");

        let conflict = svc
            .move_objs(&admin(), br#"{"src_dir":"/a","dst_dir":"/b","names":["x"]}"#)
            .await;
        assert_eq!(conflict.code, 403);
        assert_eq!(conflict.message, "file [x] exists");

        let traversal = svc.mkdir(&admin(), br#"{"path":"../etc"}"#).await;
        assert_eq!(traversal.code, 403);
    }

    #[tokio::test]
    async fn test_copy_envelope_lists_tasks() {
        let (queue, _rx) = tasks::channel(8);
        let fs = Arc::new(MemoryFs::new().with_task_queue(queue));
        fs.add_mount(StorageConfig::new("/", "mem")).unwrap();
        fs.add_deferred_mount(StorageConfig::new("/remote", "s3")).unwrap();
        fs.add_file("/remote/a", 1).unwrap();
        fs.add_file("/remote/b", 1).unwrap();
        fs.add_dir("/dst").unwrap();
        let svc = service(fs.clone());

        let ok = svc
            .copy(&admin(), br#"{"src_dir":"/remote","dst_dir":"/dst","names":["a"]}"#)
            .await;
        assert!(ok.is_success());
        let tasks = ok.data.unwrap()["tasks"].as_array().unwrap().len();
        assert_eq!(tasks, 1);

        fs.fail_on(FsOp::Copy, "/remote/b");
        let failed = svc
            .copy(
                &admin(),
                br#"{"src_dir":"/remote","dst_dir":"/dst","names":["a","b"],"overwrite":true}"#,
            )
            .await;
        assert_eq!(failed.code, 500);
        let data = failed.data.unwrap();
        assert_eq!(data["tasks"].as_array().unwrap().len(), 1);
        assert_eq!(data["tasks"][0]["state"], "pending");
    }

    #[tokio::test]
    async fn test_link_requires_admin() {
        let fs = memory_fs();
        fs.add_file("/movies/a.mkv", 10).unwrap();
        let svc = service(fs.clone());
        let body = br#"{"path":"/movies/a.mkv"}"#;

        let denied = svc.link(&member(), body, &RequestContext::default()).await;
        assert_eq!(denied.code, 403);
        assert!(fs.calls().is_empty());

        let granted = svc.link(&admin(), body, &RequestContext::default()).await;
        assert!(granted.is_success());
        assert_eq!(granted.data.unwrap()["url"], "mem://movies/a.mkv");
    }

    #[tokio::test]
    async fn test_remove_empty_dirs_envelope() {
        let fs = memory_fs();
        fs.add_dir("/r/a/b").unwrap();
        let svc = service(fs.clone());
        let mut events = svc.subscribe();

        let resp = svc.remove_empty_dirs(&admin(), br#"{"src_dir":"/r"}"#).await;

        assert!(resp.is_success());
        assert!(fs.children("/r").is_empty());
        assert_eq!(
            events.recv().await.unwrap(),
            MutationEvent::Pruned {
                root: "/r".into(),
                removed: vec!["/r/a/b".into(), "/r/a".into()],
            }
        );
    }

    #[test]
    fn test_from_config_validates() {
        let fs = memory_fs();
        let metas = Arc::new(MemoryMetaStore::new());

        let invalid = FsService::from_config(&GatewayConfig::default(), fs.clone(), metas.clone());
        assert!(matches!(invalid, Err(Error::Config(_))));

        let mut config = GatewayConfig::default();
        config.sign.secret = "k".to_string();
        assert!(FsService::from_config(&config, fs, metas).is_ok());
    }
}
