//! 同步错误类型

use thiserror::Error;

/// 同步过程中的错误
#[derive(Debug, Error)]
pub enum SyncError {
    /// 登录被远端拒绝
    #[error("登录失败: {0}")]
    Authentication(String),

    /// 无法建立会话
    #[error("连接失败: {0}")]
    Connection(String),

    /// 已建立会话上的操作失败
    #[error("远程操作 {op} 失败 ({path}): {source}")]
    Transport {
        op: &'static str,
        path: String,
        #[source]
        source: anyhow::Error,
    },

    /// 本地目录遍历失败
    #[error("本地遍历失败: {0}")]
    LocalWalk(String),

    /// 回调返回了错误
    #[error("操作回调失败: {0}")]
    Callback(#[source] anyhow::Error),
}

impl SyncError {
    pub(crate) fn transport(op: &'static str, path: &str, source: anyhow::Error) -> Self {
        Self::Transport {
            op,
            path: path.to_string(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
