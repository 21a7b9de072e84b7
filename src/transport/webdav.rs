use super::{EntryType, RawEntry, RemoteMeta, Transport};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use opendal::{EntryMode, ErrorKind, Metakey, Operator};
use std::path::Path;
use std::sync::RwLock;
use tracing::debug;

/// WebDAV 远端
///
/// WebDAV 基于无状态的 HTTP，`connect` 只记录端点，`login` 时才真正发出请求。
/// 服务器不保留原始修改时间，上传后远端时间总是不早于本地时间。
pub struct WebDavTransport {
    endpoint: RwLock<Option<String>>,
    operator: RwLock<Option<Operator>>,
    name: String,
}

impl WebDavTransport {
    pub fn new() -> Self {
        Self {
            endpoint: RwLock::new(None),
            operator: RwLock::new(None),
            name: "webdav".to_string(),
        }
    }

    fn operator(&self) -> Result<Operator> {
        self.operator
            .read()
            .map_err(|_| anyhow!("会话状态损坏"))?
            .clone()
            .ok_or_else(|| anyhow!("未登录"))
    }

    /// 服务器是否以 401/403 拒绝了请求
    ///
    /// opendal 只把 403 映射为 `PermissionDenied`，401 归入 `Unexpected`，只能从响应上下文中识别。
    fn is_rejected(err: &opendal::Error) -> bool {
        err.kind() == ErrorKind::PermissionDenied || err.to_string().contains("status: 401")
    }

    /// 规范化路径（opendal 使用不带前导 / 的相对路径）
    fn normalize(path: &str) -> String {
        path.replace('\\', "/").trim_start_matches('/').to_string()
    }

    /// 目录路径必须以 / 结尾
    fn dir_path(path: &str) -> String {
        let path = Self::normalize(path);
        if path.is_empty() || path.ends_with('/') {
            path
        } else {
            format!("{}/", path)
        }
    }
}

impl Default for WebDavTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for WebDavTransport {
    async fn connect(&self, host: &str) -> Result<()> {
        if !host.starts_with("http://") && !host.starts_with("https://") {
            return Err(anyhow!("无效的 WebDAV 地址: {}", host));
        }
        *self.endpoint.write().map_err(|_| anyhow!("会话状态损坏"))? = Some(host.to_string());
        Ok(())
    }

    async fn login(&self, user: &str, password: &str) -> Result<bool> {
        use opendal::services::Webdav;

        let endpoint = self
            .endpoint
            .read()
            .map_err(|_| anyhow!("会话状态损坏"))?
            .clone()
            .ok_or_else(|| anyhow!("未连接"))?;

        let builder = Webdav::default()
            .endpoint(&endpoint)
            .username(user)
            .password(password);
        let operator = Operator::new(builder)?.finish();

        // stat("/") 不会发出请求，用一次真实的列表请求验证凭据
        match operator.list("").await {
            Ok(_) => {}
            Err(e) if Self::is_rejected(&e) => {
                debug!("WebDAV 凭据被拒绝: {}", e);
                return Ok(false);
            }
            Err(e) => return Err(e.into()),
        }

        *self.operator.write().map_err(|_| anyhow!("会话状态损坏"))? = Some(operator);
        Ok(true)
    }

    async fn list_directory(&self, path: &str) -> Result<Option<Vec<RawEntry>>> {
        let operator = self.operator()?;
        let dir = Self::dir_path(path);

        let listed = operator
            .list_with(&dir)
            .metakey(Metakey::ContentLength | Metakey::LastModified | Metakey::Mode)
            .await;

        let listed = match listed {
            Ok(l) => l,
            Err(e)
                if matches!(
                    e.kind(),
                    ErrorKind::NotFound | ErrorKind::PermissionDenied | ErrorKind::NotADirectory
                ) =>
            {
                debug!("无法列出目录 {}: {}", dir, e);
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let entries = listed
            .into_iter()
            // 列表结果包含目录自身
            .filter(|entry| entry.path() != dir && !entry.path().is_empty())
            .map(|entry| {
                let meta = entry.metadata();
                let typ = match meta.mode() {
                    EntryMode::DIR => EntryType::Directory,
                    EntryMode::FILE => EntryType::File,
                    EntryMode::Unknown => EntryType::Other,
                };
                RawEntry {
                    name: entry.name().trim_end_matches('/').to_string(),
                    typ,
                    size: if typ == EntryType::Directory {
                        0
                    } else {
                        meta.content_length()
                    },
                    modified_time: meta.last_modified().map_or(0, |t| t.timestamp()),
                }
            })
            .collect();

        Ok(Some(entries))
    }

    async fn stat(&self, path: &str) -> Result<Option<RemoteMeta>> {
        match self.operator()?.stat(&Self::normalize(path)).await {
            Ok(meta) => Ok(Some(RemoteMeta {
                size: meta.content_length(),
                modified_time: meta.last_modified().map_or(0, |t| t.timestamp()),
            })),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn size(&self, path: &str) -> Result<u64> {
        let meta = self.operator()?.stat(&Self::normalize(path)).await?;
        Ok(meta.content_length())
    }

    async fn mkdir(&self, path: &str, _local_source: &Path) -> Result<()> {
        self.operator()?.create_dir(&Self::dir_path(path)).await?;
        Ok(())
    }

    async fn put(&self, path: &str, local_source: &Path) -> Result<()> {
        let data = tokio::fs::read(local_source).await?;
        self.operator()?.write(&Self::normalize(path), data).await?;
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<()> {
        self.operator()?.delete(&Self::normalize(path)).await?;
        Ok(())
    }

    async fn rmdir(&self, path: &str) -> Result<()> {
        self.operator()?.delete(&Self::dir_path(path)).await?;
        Ok(())
    }

    async fn chmod(&self, mode: u32, path: &str, _local_source: &Path) -> Result<()> {
        // WebDAV 没有权限位
        debug!("WebDAV 忽略 chmod {:o}: {}", mode, path);
        Ok(())
    }

    fn disconnect(&self) {
        if let Ok(mut guard) = self.operator.write() {
            guard.take();
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}
