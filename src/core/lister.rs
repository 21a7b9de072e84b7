//! 远端目录树快照

use crate::core::operation::join_remote;
use crate::error::{Result, SyncError};
use crate::transport::{RawEntry, Transport};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// 远端条目
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEntry {
    /// 相对于同步根目录的路径，以 `/` 开头
    pub path: String,
    pub is_dir: bool,
    pub size: u64,
    pub modified_time: i64,
}

/// 保持发现顺序的路径映射
#[derive(Debug, Clone, Default)]
pub struct EntryMap {
    entries: Vec<RemoteEntry>,
    index: HashMap<String, usize>,
}

impl EntryMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// 插入条目，路径已存在时原位替换
    pub fn insert(&mut self, entry: RemoteEntry) {
        match self.index.get(&entry.path) {
            Some(&i) => self.entries[i] = entry,
            None => {
                self.index.insert(entry.path.clone(), self.entries.len());
                self.entries.push(entry);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 按发现顺序遍历
    pub fn iter(&self) -> std::slice::Iter<'_, RemoteEntry> {
        self.entries.iter()
    }

    pub fn paths(&self) -> impl DoubleEndedIterator<Item = &str> {
        self.entries.iter().map(|e| e.path.as_str())
    }
}

/// 远端快照：文件与目录分开记录
#[derive(Debug, Clone, Default)]
pub struct RemoteTree {
    pub files: EntryMap,
    pub dirs: EntryMap,
}

/// 远端目录树列举器
pub struct RemoteTreeLister<'a> {
    transport: &'a dyn Transport,
}

impl<'a> RemoteTreeLister<'a> {
    pub fn new(transport: &'a dyn Transport) -> Self {
        Self { transport }
    }

    /// 递归列出 `root` 下的所有文件和目录（深度优先，先序）
    ///
    /// 无法列出的目录按空目录处理；请求本身无法发出时返回 `Connection` 错误。
    pub async fn list_tree(&self, root: &str) -> Result<RemoteTree> {
        info!("开始列出远端目录: {} ({})", root, self.transport.name());

        let mut tree = RemoteTree::default();

        // 用显式栈代替递归，每层保存尚未处理的列表条目
        let mut stack: Vec<(String, std::vec::IntoIter<RawEntry>)> = Vec::new();
        if let Some(entries) = self.list_one(root, "").await? {
            stack.push((String::new(), entries.into_iter()));
        }

        while let Some((relative, iter)) = stack.last_mut() {
            let Some(raw) = iter.next() else {
                stack.pop();
                continue;
            };

            if raw.name == "." || raw.name == ".." {
                continue;
            }

            let path = format!("{}/{}", relative, raw.name);
            if raw.is_dir() {
                tree.dirs.insert(RemoteEntry {
                    path: path.clone(),
                    is_dir: true,
                    size: raw.size,
                    modified_time: raw.modified_time,
                });
                if let Some(children) = self.list_one(root, &path).await? {
                    stack.push((path, children.into_iter()));
                }
            } else {
                tree.files.insert(RemoteEntry {
                    path,
                    is_dir: false,
                    size: raw.size,
                    modified_time: raw.modified_time,
                });
            }
        }

        info!(
            "远端列表完成: {} 个文件, {} 个目录",
            tree.files.len(),
            tree.dirs.len()
        );

        Ok(tree)
    }

    async fn list_one(&self, root: &str, relative: &str) -> Result<Option<Vec<RawEntry>>> {
        let path = join_remote(root, relative);
        debug!("列出目录: {}", path);

        match self.transport.list_directory(&path).await {
            Ok(Some(entries)) => Ok(Some(entries)),
            Ok(None) => {
                warn!("目录无法列出，按空目录处理: {}", path);
                Ok(None)
            }
            Err(e) => Err(SyncError::Connection(format!("列出 {} 失败: {}", path, e))),
        }
    }
}
