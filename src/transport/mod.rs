pub mod local;
pub mod webdav;

use anyhow::Result;
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

pub use local::LocalTransport;
pub use webdav::WebDavTransport;

/// 目录列表条目类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryType {
    File,
    Directory,
    /// 符号链接、设备文件等，按普通文件记录
    Other,
}

/// 原始列表返回的条目元数据
#[derive(Debug, Clone)]
pub struct RawEntry {
    pub name: String,
    pub typ: EntryType,
    pub size: u64,
    pub modified_time: i64,
}

impl RawEntry {
    pub fn is_dir(&self) -> bool {
        self.typ == EntryType::Directory
    }
}

/// stat 返回的远程元数据
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoteMeta {
    pub size: u64,
    pub modified_time: i64,
}

/// 远程会话接口
///
/// 所有路径都是远端的绝对路径，统一使用 `/` 分隔。
#[async_trait]
pub trait Transport: Send + Sync {
    /// 连接到主机
    async fn connect(&self, host: &str) -> Result<()>;

    /// 登录，凭据被拒绝时返回 `Ok(false)`
    async fn login(&self, user: &str, password: &str) -> Result<bool>;

    /// 列出单个目录（不递归）
    ///
    /// 目录不存在或不可读时返回 `Ok(None)`；`Err` 表示请求本身无法发出。
    async fn list_directory(&self, path: &str) -> Result<Option<Vec<RawEntry>>>;

    /// 获取元数据，不存在时返回 `None`
    async fn stat(&self, path: &str) -> Result<Option<RemoteMeta>>;

    /// 查询文件大小
    async fn size(&self, path: &str) -> Result<u64>;

    /// 创建目录，`local_source` 为对应的本地目录
    async fn mkdir(&self, path: &str, local_source: &Path) -> Result<()>;

    /// 上传（或覆盖）文件
    async fn put(&self, path: &str, local_source: &Path) -> Result<()>;

    /// 删除文件
    async fn delete(&self, path: &str) -> Result<()>;

    /// 删除空目录
    async fn rmdir(&self, path: &str) -> Result<()>;

    /// 设置权限
    async fn chmod(&self, mode: u32, path: &str, local_source: &Path) -> Result<()>;

    /// 断开连接（必须可在 Drop 中调用，因此是同步的）
    fn disconnect(&self);

    /// 会话名称（用于日志）
    fn name(&self) -> &str;
}

/// 根据配置创建远程会话
pub fn create_transport(config: &crate::config::RemoteConfig) -> Arc<dyn Transport> {
    match config.typ {
        crate::config::TransportType::Local => {
            tracing::info!("使用本地目录作为远端: {}", config.host);
            Arc::new(LocalTransport::new()) as Arc<dyn Transport>
        }
        crate::config::TransportType::WebDav => {
            tracing::info!("使用 WebDAV 远端: {}", config.host);
            Arc::new(WebDavTransport::new()) as Arc<dyn Transport>
        }
    }
}
