pub mod config;
pub mod core;
pub mod error;
pub mod logging;
pub mod transport;

pub use config::{AppConfig, RemoteConfig, TransportType};
pub use crate::core::{OperationKind, RemoteTree, SyncEngine, SyncOperation, SyncReport};
pub use error::{Result, SyncError};
pub use transport::Transport;

/// 平台相关的默认目录
pub mod dirs {
    use std::path::PathBuf;

    pub fn config_dir() -> Option<PathBuf> {
        if cfg!(target_os = "windows") {
            std::env::var("APPDATA").ok().map(PathBuf::from)
        } else if cfg!(target_os = "macos") {
            std::env::var("HOME")
                .ok()
                .map(|h| PathBuf::from(h).join("Library").join("Application Support"))
        } else {
            std::env::var("XDG_CONFIG_HOME")
                .ok()
                .map(PathBuf::from)
                .or_else(|| {
                    std::env::var("HOME")
                        .ok()
                        .map(|h| PathBuf::from(h).join(".config"))
                })
        }
    }

    /// 应用自己的配置目录
    pub fn app_dir() -> PathBuf {
        config_dir()
            .map(|p| p.join("glsync"))
            .unwrap_or_else(|| PathBuf::from(".glsync"))
    }
}
