use crate::core::comparator::{FileComparator, FileRelation, RemoteState};
use crate::core::lister::{RemoteTree, RemoteTreeLister};
use crate::core::operation::{join_remote, normalize_path, OperationKind, SyncOperation};
use crate::core::scanner::{EntryFilter, LocalTree};
use crate::error::{Result, SyncError};
use crate::transport::Transport;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// 登录凭据
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub host: String,
    pub user: String,
    pub password: String,
}

/// 同步配置
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// 新建远端目录的权限
    pub dir_mode: u32,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self { dir_mode: 0o755 }
    }
}

/// 同步报告
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub start_time: i64,
    pub end_time: i64,
    pub files_deleted: usize,
    pub dirs_deleted: usize,
    pub dirs_created: usize,
    pub files_created: usize,
    pub files_updated: usize,
}

impl SyncReport {
    pub fn count(&self, kind: OperationKind) -> usize {
        match kind {
            OperationKind::DeleteFile => self.files_deleted,
            OperationKind::DeleteDir => self.dirs_deleted,
            OperationKind::CreateDir => self.dirs_created,
            OperationKind::NewFile => self.files_created,
            OperationKind::UpdateFile => self.files_updated,
        }
    }

    pub fn total_operations(&self) -> usize {
        OperationKind::ALL.iter().map(|k| self.count(*k)).sum()
    }
}

/// 同步引擎
///
/// 会话在第一次使用时建立，之后一直复用，引擎销毁时断开。
pub struct SyncEngine {
    transport: Arc<dyn Transport>,
    local: Arc<dyn LocalTree>,
    credentials: Credentials,
    config: SyncConfig,
    connected: bool,
}

impl SyncEngine {
    pub fn new(
        transport: Arc<dyn Transport>,
        local: Arc<dyn LocalTree>,
        credentials: Credentials,
    ) -> Self {
        Self::with_config(transport, local, credentials, SyncConfig::default())
    }

    pub fn with_config(
        transport: Arc<dyn Transport>,
        local: Arc<dyn LocalTree>,
        credentials: Credentials,
        config: SyncConfig,
    ) -> Self {
        Self {
            transport,
            local,
            credentials,
            config,
            connected: false,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// 确保会话已建立，重复调用不会重新登录
    pub async fn ensure_connected(&mut self) -> Result<()> {
        if self.connected {
            return Ok(());
        }

        let host = &self.credentials.host;
        info!("连接远端: {} ({})", host, self.transport.name());

        self.transport
            .connect(host)
            .await
            .map_err(|e| SyncError::Connection(format!("{}: {}", host, e)))?;

        let accepted = match self
            .transport
            .login(&self.credentials.user, &self.credentials.password)
            .await
        {
            Ok(accepted) => accepted,
            Err(e) => {
                self.transport.disconnect();
                return Err(SyncError::Connection(format!("{}: {}", host, e)));
            }
        };

        if !accepted {
            self.transport.disconnect();
            return Err(SyncError::Authentication(format!(
                "{}@{}",
                self.credentials.user, host
            )));
        }

        self.connected = true;
        debug!("登录成功: {}@{}", self.credentials.user, host);
        Ok(())
    }

    /// 获取远端目录树快照
    pub async fn get_all_files(&mut self, remote_root: &str) -> Result<RemoteTree> {
        self.ensure_connected().await?;
        RemoteTreeLister::new(self.transport.as_ref())
            .list_tree(remote_root)
            .await
    }

    /// 把本地目录同步到远端
    ///
    /// 依次执行：删除多余文件、删除多余目录（由深到浅）、创建缺失目录、上传新文件或更新文件。
    /// 每个操作执行前先调用 `on_operation`；任何失败都会中止剩余的同步。
    pub async fn sync_directory<F>(
        &mut self,
        local_root: &Path,
        remote_root: &str,
        mut on_operation: F,
    ) -> Result<SyncReport>
    where
        F: FnMut(&SyncOperation) -> anyhow::Result<()>,
    {
        self.ensure_connected().await?;

        let mut report = SyncReport {
            start_time: chrono::Utc::now().timestamp(),
            ..Default::default()
        };

        info!("开始同步: {:?} -> {}", local_root, remote_root);

        let tree = RemoteTreeLister::new(self.transport.as_ref())
            .list_tree(remote_root)
            .await?;

        report.files_deleted = self
            .delete_stale_files(&tree, local_root, remote_root, &mut on_operation)
            .await?;
        report.dirs_deleted = self
            .delete_stale_dirs(&tree, local_root, remote_root, &mut on_operation)
            .await?;
        report.dirs_created = self
            .create_missing_dirs(local_root, remote_root, &mut on_operation)
            .await?;
        let (created, updated) = self
            .upload_files(local_root, remote_root, &mut on_operation)
            .await?;
        report.files_created = created;
        report.files_updated = updated;

        report.end_time = chrono::Utc::now().timestamp();
        info!(
            "同步完成: 删除 {} 个文件, 删除 {} 个目录, 创建 {} 个目录, 新增 {} 个文件, 更新 {} 个文件",
            report.files_deleted,
            report.dirs_deleted,
            report.dirs_created,
            report.files_created,
            report.files_updated
        );

        Ok(report)
    }

    /// 删除本地不存在的远端文件（按发现顺序）
    async fn delete_stale_files<F>(
        &self,
        tree: &RemoteTree,
        local_root: &Path,
        remote_root: &str,
        on_operation: &mut F,
    ) -> Result<usize>
    where
        F: FnMut(&SyncOperation) -> anyhow::Result<()>,
    {
        let mut count = 0;
        for path in tree.files.paths() {
            if self.local.exists(local_root, &normalize_path(path)) {
                continue;
            }
            let remote_path = join_remote(remote_root, path);
            emit(on_operation, OperationKind::DeleteFile, count, &remote_path)?;
            self.transport
                .delete(&remote_path)
                .await
                .map_err(|e| SyncError::transport("delete", &remote_path, e))?;
            count += 1;
        }
        info!("删除远端文件: {} 个", count);
        Ok(count)
    }

    /// 删除本地不存在的远端目录，逆发现顺序保证子目录先于父目录
    async fn delete_stale_dirs<F>(
        &self,
        tree: &RemoteTree,
        local_root: &Path,
        remote_root: &str,
        on_operation: &mut F,
    ) -> Result<usize>
    where
        F: FnMut(&SyncOperation) -> anyhow::Result<()>,
    {
        let mut count = 0;
        for path in tree.dirs.paths().rev() {
            if self.local.exists(local_root, &normalize_path(path)) {
                continue;
            }
            let remote_path = join_remote(remote_root, path);
            emit(on_operation, OperationKind::DeleteDir, count, &remote_path)?;
            self.transport
                .rmdir(&remote_path)
                .await
                .map_err(|e| SyncError::transport("rmdir", &remote_path, e))?;
            count += 1;
        }
        info!("删除远端目录: {} 个", count);
        Ok(count)
    }

    /// 创建远端缺失的目录
    async fn create_missing_dirs<F>(
        &self,
        local_root: &Path,
        remote_root: &str,
        on_operation: &mut F,
    ) -> Result<usize>
    where
        F: FnMut(&SyncOperation) -> anyhow::Result<()>,
    {
        let mut count = 0;
        for entry in self.local.entries(local_root, EntryFilter::Directories) {
            let entry = entry?;
            let remote_path = join_remote(remote_root, &entry.relative_path);

            let stat = self
                .transport
                .stat(&remote_path)
                .await
                .map_err(|e| SyncError::transport("stat", &remote_path, e))?;
            if stat.is_some() {
                continue;
            }

            emit(on_operation, OperationKind::CreateDir, count, &remote_path)?;
            self.transport
                .mkdir(&remote_path, &entry.absolute_path)
                .await
                .map_err(|e| SyncError::transport("mkdir", &remote_path, e))?;
            self.transport
                .chmod(self.config.dir_mode, &remote_path, &entry.absolute_path)
                .await
                .map_err(|e| SyncError::transport("chmod", &remote_path, e))?;
            count += 1;
        }
        info!("创建远端目录: {} 个", count);
        Ok(count)
    }

    /// 上传新文件，或更新较旧/大小不同的文件
    async fn upload_files<F>(
        &self,
        local_root: &Path,
        remote_root: &str,
        on_operation: &mut F,
    ) -> Result<(usize, usize)>
    where
        F: FnMut(&SyncOperation) -> anyhow::Result<()>,
    {
        let comparator = FileComparator::new();
        let mut created = 0;
        let mut updated = 0;

        for entry in self.local.entries(local_root, EntryFilter::Files) {
            let entry = entry?;
            let remote_path = join_remote(remote_root, &entry.relative_path);

            let stat = self
                .transport
                .stat(&remote_path)
                .await
                .map_err(|e| SyncError::transport("stat", &remote_path, e))?;

            let remote = match stat {
                Some(meta) => {
                    let size = self
                        .transport
                        .size(&remote_path)
                        .await
                        .map_err(|e| SyncError::transport("size", &remote_path, e))?;
                    Some(RemoteState {
                        size,
                        modified_time: meta.modified_time,
                    })
                }
                None => None,
            };

            let relation = comparator.compare(&entry, remote);
            let (kind, index) = match relation {
                FileRelation::Missing => (OperationKind::NewFile, &mut created),
                FileRelation::LocalNewer | FileRelation::SizeDiffers => {
                    (OperationKind::UpdateFile, &mut updated)
                }
                FileRelation::Unchanged => continue,
            };

            emit(on_operation, kind, *index, &remote_path)?;
            self.transport
                .put(&remote_path, &entry.absolute_path)
                .await
                .map_err(|e| SyncError::transport("put", &remote_path, e))?;
            *index += 1;
        }
        info!("上传文件: 新增 {} 个, 更新 {} 个", created, updated);
        Ok((created, updated))
    }
}

impl Drop for SyncEngine {
    fn drop(&mut self) {
        if self.connected {
            debug!("断开远端连接: {}", self.transport.name());
            self.transport.disconnect();
        }
    }
}

/// 在执行操作前通知回调
fn emit<F>(on_operation: &mut F, kind: OperationKind, index: usize, remote_path: &str) -> Result<()>
where
    F: FnMut(&SyncOperation) -> anyhow::Result<()>,
{
    let operation = SyncOperation {
        kind,
        index,
        remote_path: remote_path.to_string(),
    };
    debug!("{}", operation);
    on_operation(&operation).map_err(SyncError::Callback)
}
