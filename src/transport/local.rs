use super::{EntryType, RawEntry, RemoteMeta, Transport};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tokio::fs;
use tracing::debug;

/// 以本地（或挂载的）目录充当远端
pub struct LocalTransport {
    base_path: RwLock<Option<PathBuf>>,
    name: String,
}

impl LocalTransport {
    pub fn new() -> Self {
        Self {
            base_path: RwLock::new(None),
            name: "local".to_string(),
        }
    }

    /// 把远端路径解析到基础目录下
    fn resolve_path(&self, path: &str) -> Result<PathBuf> {
        let guard = self
            .base_path
            .read()
            .map_err(|_| anyhow!("会话状态损坏"))?;
        let base = guard.as_ref().ok_or_else(|| anyhow!("未连接"))?;

        let path = path.trim_start_matches('/').trim_start_matches('\\');
        if path.is_empty() {
            Ok(base.clone())
        } else {
            Ok(base.join(path))
        }
    }

    /// 修改时间（秒），早于 1970 或无法读取时记为 0
    fn modified_secs(metadata: &std::fs::Metadata) -> i64 {
        metadata
            .modified()
            .ok()
            .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
            .map_or(0, |d| d.as_secs() as i64)
    }
}

impl Default for LocalTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for LocalTransport {
    async fn connect(&self, host: &str) -> Result<()> {
        let base = PathBuf::from(host);
        if !fs::metadata(&base).await.map(|m| m.is_dir()).unwrap_or(false) {
            return Err(anyhow!("目录不存在: {}", host));
        }
        *self
            .base_path
            .write()
            .map_err(|_| anyhow!("会话状态损坏"))? = Some(base);
        Ok(())
    }

    async fn login(&self, _user: &str, _password: &str) -> Result<bool> {
        // 本地目录不需要凭据，只要已连接即可
        Ok(self.resolve_path("/").is_ok())
    }

    async fn list_directory(&self, path: &str) -> Result<Option<Vec<RawEntry>>> {
        let full_path = self.resolve_path(path)?;

        let mut dir = match fs::read_dir(&full_path).await {
            Ok(d) => d,
            Err(e) => {
                debug!("无法列出目录 {:?}: {}", full_path, e);
                return Ok(None);
            }
        };

        let mut entries = Vec::new();
        loop {
            let entry = match dir.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    debug!("读取目录中断 {:?}: {}", full_path, e);
                    return Ok(None);
                }
            };
            let metadata = match entry.metadata().await {
                Ok(m) => m,
                Err(e) => {
                    debug!("跳过无法读取的条目 {:?}: {}", entry.path(), e);
                    continue;
                }
            };
            let typ = if metadata.is_dir() {
                EntryType::Directory
            } else if metadata.is_file() {
                EntryType::File
            } else {
                EntryType::Other
            };
            entries.push(RawEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                typ,
                size: if metadata.is_dir() { 0 } else { metadata.len() },
                modified_time: Self::modified_secs(&metadata),
            });
        }

        // read_dir 的顺序不稳定，按名称排序
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(Some(entries))
    }

    async fn stat(&self, path: &str) -> Result<Option<RemoteMeta>> {
        let full_path = self.resolve_path(path)?;

        match fs::metadata(&full_path).await {
            Ok(metadata) => Ok(Some(RemoteMeta {
                size: if metadata.is_dir() { 0 } else { metadata.len() },
                modified_time: Self::modified_secs(&metadata),
            })),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn size(&self, path: &str) -> Result<u64> {
        let metadata = fs::metadata(self.resolve_path(path)?).await?;
        Ok(metadata.len())
    }

    async fn mkdir(&self, path: &str, _local_source: &Path) -> Result<()> {
        fs::create_dir(self.resolve_path(path)?).await?;
        Ok(())
    }

    async fn put(&self, path: &str, local_source: &Path) -> Result<()> {
        fs::copy(local_source, self.resolve_path(path)?).await?;
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<()> {
        fs::remove_file(self.resolve_path(path)?).await?;
        Ok(())
    }

    async fn rmdir(&self, path: &str) -> Result<()> {
        fs::remove_dir(self.resolve_path(path)?).await?;
        Ok(())
    }

    async fn chmod(&self, mode: u32, path: &str, _local_source: &Path) -> Result<()> {
        let full_path = self.resolve_path(path)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&full_path, std::fs::Permissions::from_mode(mode)).await?;
        }

        #[cfg(not(unix))]
        debug!("当前平台不支持 chmod {:o}: {:?}", mode, full_path);

        Ok(())
    }

    fn disconnect(&self) {
        if let Ok(mut guard) = self.base_path.write() {
            guard.take();
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}
