use serde::Serialize;
use std::fmt;

/// 同步操作类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationKind {
    DeleteFile = 0,
    DeleteDir = 1,
    CreateDir = 2,
    NewFile = 3,
    UpdateFile = 4,
}

impl OperationKind {
    pub const ALL: [OperationKind; 5] = [
        OperationKind::DeleteFile,
        OperationKind::DeleteDir,
        OperationKind::CreateDir,
        OperationKind::NewFile,
        OperationKind::UpdateFile,
    ];

    /// 数字编码
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OperationKind::DeleteFile => "DELETE_FILE",
            OperationKind::DeleteDir => "DELETE_DIR",
            OperationKind::CreateDir => "CREATE_DIR",
            OperationKind::NewFile => "NEW_FILE",
            OperationKind::UpdateFile => "UPDATE_FILE",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 回调收到的操作报告
///
/// `index` 是该类型操作在本次同步中的序号，从 0 开始，各类型独立计数。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncOperation {
    pub kind: OperationKind,
    pub index: usize,
    pub remote_path: String,
}

impl fmt::Display for SyncOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} #{} {}", self.kind, self.index, self.remote_path)
    }
}

/// 统一路径分隔符为 `/`
pub fn normalize_path(path: &str) -> String {
    path.replace('\\', "/")
}

/// 拼接远端根目录与相对路径
pub fn join_remote(root: &str, relative: &str) -> String {
    let base = root.trim_end_matches('/');
    let relative = normalize_path(relative);
    let relative = relative.trim_start_matches('/');

    match (base.is_empty(), relative.is_empty()) {
        (true, true) => "/".to_string(),
        (false, true) => base.to_string(),
        _ => format!("{}/{}", base, relative),
    }
}
