use crate::core::scanner::LocalEntry;

/// 本地文件与远端文件的关系
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileRelation {
    /// 远端不存在
    Missing,
    /// 本地修改时间更新
    LocalNewer,
    /// 大小不同（不论时间先后）
    SizeDiffers,
    /// 无需处理
    Unchanged,
}

/// 远端文件的当前状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoteState {
    pub size: u64,
    pub modified_time: i64,
}

/// 文件比较器
///
/// 只比较大小和修改时间，不计算内容哈希。
#[derive(Debug, Clone, Copy, Default)]
pub struct FileComparator;

impl FileComparator {
    pub fn new() -> Self {
        Self
    }

    /// 比较本地文件与远端状态
    ///
    /// 本地时间严格晚于远端，或大小不同，都需要更新。本地时间更早但大小不同时同样更新。
    pub fn compare(&self, local: &LocalEntry, remote: Option<RemoteState>) -> FileRelation {
        let Some(remote) = remote else {
            return FileRelation::Missing;
        };

        if local.modified_time > remote.modified_time {
            tracing::debug!(
                "本地文件更新: {} (local_time={}, remote_time={})",
                local.relative_path,
                local.modified_time,
                remote.modified_time
            );
            return FileRelation::LocalNewer;
        }

        if local.size != remote.size {
            tracing::debug!(
                "文件大小不同: {} (local={}, remote={})",
                local.relative_path,
                local.size,
                remote.size
            );
            return FileRelation::SizeDiffers;
        }

        FileRelation::Unchanged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn local(size: u64, modified_time: i64) -> LocalEntry {
        LocalEntry {
            relative_path: "x.txt".to_string(),
            absolute_path: PathBuf::from("/tmp/x.txt"),
            size,
            modified_time,
            is_dir: false,
        }
    }

    fn remote(size: u64, modified_time: i64) -> Option<RemoteState> {
        Some(RemoteState {
            size,
            modified_time,
        })
    }

    #[test]
    fn test_missing_remote() {
        let cmp = FileComparator::new();
        assert_eq!(cmp.compare(&local(5, 100), None), FileRelation::Missing);
    }

    #[test]
    fn test_same_size_older_remote_updates() {
        let cmp = FileComparator::new();
        assert_eq!(cmp.compare(&local(10, 100), remote(10, 99)), FileRelation::LocalNewer);
    }

    #[test]
    fn test_identical_is_unchanged() {
        let cmp = FileComparator::new();
        let relation = cmp.compare(&local(10, 100), remote(10, 100));
        assert_eq!(relation, FileRelation::Unchanged);
    }

    #[test]
    fn test_size_mismatch_alone_updates() {
        let cmp = FileComparator::new();
        assert_eq!(cmp.compare(&local(11, 100), remote(10, 100)), FileRelation::SizeDiffers);
        // 远端更新但大小不同，仍然上传
        assert_eq!(cmp.compare(&local(11, 50), remote(10, 100)), FileRelation::SizeDiffers);
    }

    #[test]
    fn test_newer_remote_same_size_is_unchanged() {
        let cmp = FileComparator::new();
        assert_eq!(cmp.compare(&local(10, 100), remote(10, 200)), FileRelation::Unchanged);
    }
}
