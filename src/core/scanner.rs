use crate::core::operation::normalize_path;
use crate::error::{Result, SyncError};
use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// 本地条目
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalEntry {
    /// 相对于本地根目录的路径（不以分隔符开头）
    pub relative_path: String,
    pub absolute_path: PathBuf,
    pub size: u64,
    pub modified_time: i64,
    pub is_dir: bool,
}

/// 遍历时只返回目录或只返回文件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryFilter {
    Directories,
    Files,
}

impl EntryFilter {
    pub fn accepts(self, is_dir: bool) -> bool {
        match self {
            EntryFilter::Directories => is_dir,
            EntryFilter::Files => !is_dir,
        }
    }
}

pub type LocalEntries = Box<dyn Iterator<Item = Result<LocalEntry>> + Send>;

/// 本地目录树接口
///
/// 每次调用 `entries` 都重新开始一次遍历。
pub trait LocalTree: Send + Sync {
    /// 递归遍历 `root`，父目录总是先于其子条目返回
    fn entries(&self, root: &Path, filter: EntryFilter) -> LocalEntries;

    /// `root` 下的相对路径上是否存在任何条目（文件或目录），不受排除规则影响
    fn exists(&self, root: &Path, relative: &str) -> bool;
}

/// 文件扫描器配置
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// 排除规则（按文件名匹配的 glob），匹配的目录连同子树一起跳过
    pub exclude_patterns: Vec<String>,
    /// 是否跟随符号链接
    pub follow_links: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            exclude_patterns: vec![".git*".to_string()],
            follow_links: true,
        }
    }
}

/// 基于 walkdir 的本地目录树
#[derive(Debug, Clone)]
pub struct FsTree {
    excludes: Vec<Regex>,
    follow_links: bool,
}

impl FsTree {
    pub fn new(config: ScanConfig) -> Result<Self> {
        let excludes = config
            .exclude_patterns
            .iter()
            .map(|p| glob_to_regex(p))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            excludes,
            follow_links: config.follow_links,
        })
    }

    fn is_excluded(excludes: &[Regex], name: &str) -> bool {
        excludes.iter().any(|re| re.is_match(name))
    }

    fn to_entry(root: &Path, entry: &walkdir::DirEntry) -> Result<LocalEntry> {
        let metadata = entry
            .metadata()
            .map_err(|e| SyncError::LocalWalk(format!("{:?}: {}", entry.path(), e)))?;

        let relative = entry
            .path()
            .strip_prefix(root)
            .map_err(|e| SyncError::LocalWalk(format!("{:?}: {}", entry.path(), e)))?;

        let modified = metadata
            .modified()
            .ok()
            .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
            .map_or(0, |d| d.as_secs() as i64);

        Ok(LocalEntry {
            relative_path: normalize_path(&relative.to_string_lossy()),
            absolute_path: entry.path().to_path_buf(),
            size: if metadata.is_dir() { 0 } else { metadata.len() },
            modified_time: modified,
            is_dir: metadata.is_dir(),
        })
    }
}

impl LocalTree for FsTree {
    fn entries(&self, root: &Path, filter: EntryFilter) -> LocalEntries {
        let root = root.to_path_buf();
        let excludes = self.excludes.clone();

        debug!("遍历本地目录: {:?} ({:?})", root, filter);

        let walker = WalkDir::new(&root)
            .follow_links(self.follow_links)
            .min_depth(1)
            .into_iter()
            .filter_entry(move |e| !Self::is_excluded(&excludes, &e.file_name().to_string_lossy()));

        Box::new(walker.filter_map(move |item| match item {
            Ok(entry) => {
                if !filter.accepts(entry.file_type().is_dir()) {
                    return None;
                }
                Some(Self::to_entry(&root, &entry))
            }
            Err(e) => Some(Err(SyncError::LocalWalk(e.to_string()))),
        }))
    }

    fn exists(&self, root: &Path, relative: &str) -> bool {
        let relative = relative.trim_start_matches(['/', '\\']);
        if relative.is_empty() {
            return root.exists();
        }
        root.join(relative).exists()
    }
}

/// 把简单 glob（`*` 与 `?`）转换为整名匹配的正则
fn glob_to_regex(pattern: &str) -> Result<Regex> {
    let escaped = regex::escape(pattern)
        .replace(r"\*", ".*")
        .replace(r"\?", ".");
    Regex::new(&format!("^{}$", escaped))
        .map_err(|e| SyncError::LocalWalk(format!("无效的排除规则 {}: {}", pattern, e)))
}
