//! 测试用的内存远端与内存本地树

use crate::core::operation::normalize_path;
use crate::core::scanner::{EntryFilter, LocalEntries, LocalEntry, LocalTree};
use crate::transport::{EntryType, RawEntry, RemoteMeta, Transport};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// 上传后远端文件的修改时间
pub const UPLOAD_TIME: i64 = 1_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Node {
    File { size: u64, modified_time: i64 },
    Dir,
}

#[derive(Debug, Default)]
pub struct MemoryState {
    pub nodes: BTreeMap<String, Node>,
    pub unlistable: HashSet<String>,
    /// `size` 查询的返回值，与 `stat` 报告的大小可以不同
    pub size_override: HashMap<String, u64>,
    pub broken: bool,
    pub accept_login: bool,
    pub connects: usize,
    pub logins: usize,
    pub disconnects: usize,
    pub calls: Vec<String>,
    pub chmods: Vec<(u32, String)>,
}

/// 内存远端
#[derive(Clone)]
pub struct MemoryTransport {
    pub state: Arc<Mutex<MemoryState>>,
    local: MemoryTree,
}

fn parent_of(path: &str) -> &str {
    match path.rsplit_once('/') {
        Some(("", _)) => "/",
        Some((parent, _)) => parent,
        None => "",
    }
}

impl MemoryTransport {
    /// `local` 用于上传时读取源文件大小
    pub fn new(local: MemoryTree) -> Self {
        let state = MemoryState {
            accept_login: true,
            ..Default::default()
        };
        let transport = Self {
            state: Arc::new(Mutex::new(state)),
            local,
        };
        transport.add_dir("/");
        transport
    }

    pub fn add_dir(&self, path: &str) -> &Self {
        self.state
            .lock()
            .unwrap()
            .nodes
            .insert(path.to_string(), Node::Dir);
        self
    }

    pub fn add_file(&self, path: &str, size: u64, modified_time: i64) -> &Self {
        self.state.lock().unwrap().nodes.insert(
            path.to_string(),
            Node::File {
                size,
                modified_time,
            },
        );
        self
    }

    pub fn paths(&self) -> Vec<String> {
        self.state.lock().unwrap().nodes.keys().cloned().collect()
    }

    pub fn node(&self, path: &str) -> Option<Node> {
        self.state.lock().unwrap().nodes.get(path).copied()
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    fn record(&self, call: String) -> Result<std::sync::MutexGuard<'_, MemoryState>> {
        let mut state = self.state.lock().unwrap();
        if state.broken {
            return Err(anyhow!("会话已断开"));
        }
        state.calls.push(call);
        Ok(state)
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn connect(&self, _host: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.broken {
            return Err(anyhow!("无法连接"));
        }
        state.connects += 1;
        Ok(())
    }

    async fn login(&self, _user: &str, _password: &str) -> Result<bool> {
        let mut state = self.state.lock().unwrap();
        state.logins += 1;
        Ok(state.accept_login)
    }

    async fn list_directory(&self, path: &str) -> Result<Option<Vec<RawEntry>>> {
        let state = self.record(format!("list {}", path))?;
        if state.unlistable.contains(path) || state.nodes.get(path) != Some(&Node::Dir) {
            return Ok(None);
        }

        let mut entries = vec![
            RawEntry {
                name: ".".to_string(),
                typ: EntryType::Directory,
                size: 0,
                modified_time: 0,
            },
            RawEntry {
                name: "..".to_string(),
                typ: EntryType::Directory,
                size: 0,
                modified_time: 0,
            },
        ];
        for (child, node) in state.nodes.iter() {
            if child == path || parent_of(child) != path {
                continue;
            }
            let name = child.rsplit('/').next().unwrap_or_default().to_string();
            entries.push(match node {
                Node::Dir => RawEntry {
                    name,
                    typ: EntryType::Directory,
                    size: 0,
                    modified_time: 0,
                },
                Node::File {
                    size,
                    modified_time,
                } => RawEntry {
                    name,
                    typ: EntryType::File,
                    size: *size,
                    modified_time: *modified_time,
                },
            });
        }
        Ok(Some(entries))
    }

    async fn stat(&self, path: &str) -> Result<Option<RemoteMeta>> {
        let state = self.record(format!("stat {}", path))?;
        Ok(state.nodes.get(path).map(|node| match node {
            Node::Dir => RemoteMeta {
                size: 0,
                modified_time: 0,
            },
            Node::File {
                size,
                modified_time,
            } => RemoteMeta {
                size: *size,
                modified_time: *modified_time,
            },
        }))
    }

    async fn size(&self, path: &str) -> Result<u64> {
        let state = self.record(format!("size {}", path))?;
        if let Some(size) = state.size_override.get(path) {
            return Ok(*size);
        }
        match state.nodes.get(path) {
            Some(Node::File { size, .. }) => Ok(*size),
            _ => Err(anyhow!("不是文件: {}", path)),
        }
    }

    async fn mkdir(&self, path: &str, _local_source: &Path) -> Result<()> {
        let mut state = self.record(format!("mkdir {}", path))?;
        if state.nodes.contains_key(path) {
            return Err(anyhow!("已存在: {}", path));
        }
        if state.nodes.get(parent_of(path)) != Some(&Node::Dir) {
            return Err(anyhow!("父目录不存在: {}", path));
        }
        state.nodes.insert(path.to_string(), Node::Dir);
        Ok(())
    }

    async fn put(&self, path: &str, local_source: &Path) -> Result<()> {
        let size = self
            .local
            .size_of(local_source)
            .ok_or_else(|| anyhow!("本地文件不存在: {:?}", local_source))?;
        let mut state = self.record(format!("put {}", path))?;
        if state.nodes.get(parent_of(path)) != Some(&Node::Dir) {
            return Err(anyhow!("父目录不存在: {}", path));
        }
        state.nodes.insert(
            path.to_string(),
            Node::File {
                size,
                modified_time: UPLOAD_TIME,
            },
        );
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let mut state = self.record(format!("delete {}", path))?;
        match state.nodes.get(path) {
            Some(Node::File { .. }) => {
                state.nodes.remove(path);
                Ok(())
            }
            _ => Err(anyhow!("文件不存在: {}", path)),
        }
    }

    async fn rmdir(&self, path: &str) -> Result<()> {
        let mut state = self.record(format!("rmdir {}", path))?;
        if state.nodes.get(path) != Some(&Node::Dir) {
            return Err(anyhow!("目录不存在: {}", path));
        }
        if state.nodes.keys().any(|k| k != path && parent_of(k) == path) {
            return Err(anyhow!("目录非空: {}", path));
        }
        state.nodes.remove(path);
        Ok(())
    }

    async fn chmod(&self, mode: u32, path: &str, _local_source: &Path) -> Result<()> {
        let mut state = self.record(format!("chmod {}", path))?;
        state.chmods.push((mode, path.to_string()));
        Ok(())
    }

    fn disconnect(&self) {
        self.state.lock().unwrap().disconnects += 1;
    }

    fn name(&self) -> &str {
        "memory"
    }
}

/// 内存本地树，条目按添加顺序（先序）返回
#[derive(Clone, Default)]
pub struct MemoryTree {
    root: PathBuf,
    entries: Arc<Mutex<Vec<LocalEntry>>>,
}

impl MemoryTree {
    pub fn new(root: &str) -> Self {
        Self {
            root: PathBuf::from(root),
            entries: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn dir(&self, relative: &str) -> &Self {
        self.push(relative, 0, 0, true);
        self
    }

    pub fn file(&self, relative: &str, size: u64, modified_time: i64) -> &Self {
        self.push(relative, size, modified_time, false);
        self
    }

    fn push(&self, relative: &str, size: u64, modified_time: i64, is_dir: bool) {
        let mut entries = self.entries.lock().unwrap();
        entries.retain(|e| e.relative_path != relative);
        entries.push(LocalEntry {
            relative_path: relative.to_string(),
            absolute_path: self.root.join(normalize_path(relative)),
            size,
            modified_time,
            is_dir,
        });
    }

    fn size_of(&self, absolute: &Path) -> Option<u64> {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .find(|e| e.absolute_path == absolute && !e.is_dir)
            .map(|e| e.size)
    }
}

impl LocalTree for MemoryTree {
    fn entries(&self, _root: &Path, filter: EntryFilter) -> LocalEntries {
        let entries: Vec<_> = self
            .entries
            .lock()
            .unwrap()
            .iter()
            .filter(|e| filter.accepts(e.is_dir))
            .cloned()
            .map(Ok)
            .collect();
        Box::new(entries.into_iter())
    }

    fn exists(&self, _root: &Path, relative: &str) -> bool {
        let relative = relative.trim_start_matches('/');
        relative.is_empty()
            || self
                .entries
                .lock()
                .unwrap()
                .iter()
                .any(|e| normalize_path(&e.relative_path) == relative)
    }
}
