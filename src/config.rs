//! 应用配置模块

use crate::core::{Credentials, ScanConfig, SyncConfig};
use crate::logging::LogConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// 未在配置中给出密码时读取的环境变量
pub const PASSWORD_ENV: &str = "GLSYNC_PASSWORD";

/// 远端类型
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TransportType {
    /// 本地或挂载目录
    #[default]
    Local,
    WebDav,
}

/// 远端连接配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RemoteConfig {
    #[serde(rename = "type", default)]
    pub typ: TransportType,
    /// 主机地址：本地类型为基础目录，WebDAV 为服务端点
    pub host: String,
    #[serde(default)]
    pub user: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

/// 应用配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    pub remote: RemoteConfig,
    /// 新建远端目录的权限
    #[serde(default = "default_dir_mode")]
    pub dir_mode: u32,
    /// 本地遍历时的排除规则
    #[serde(default = "default_exclude_patterns")]
    pub exclude_patterns: Vec<String>,
    #[serde(default)]
    pub log: LogConfig,
}

fn default_dir_mode() -> u32 {
    0o755
}

fn default_exclude_patterns() -> Vec<String> {
    ScanConfig::default().exclude_patterns
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            remote: RemoteConfig::default(),
            dir_mode: default_dir_mode(),
            exclude_patterns: default_exclude_patterns(),
            log: LogConfig::default(),
        }
    }
}

impl AppConfig {
    /// 默认配置文件路径
    pub fn default_path() -> PathBuf {
        crate::dirs::app_dir().join("config.json")
    }

    /// 从配置文件加载
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("读取配置文件失败: {}", path.display()))?;
        let config = serde_json::from_str(&content)
            .with_context(|| format!("解析配置文件失败: {}", path.display()))?;
        Ok(config)
    }

    /// 保存配置
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)
            .with_context(|| format!("写入配置文件失败: {}", path.display()))?;
        Ok(())
    }

    /// 登录凭据，密码缺省时从环境变量读取
    pub fn credentials(&self) -> Credentials {
        let password = self
            .remote
            .password
            .clone()
            .or_else(|| std::env::var(PASSWORD_ENV).ok())
            .unwrap_or_default();
        Credentials {
            host: self.remote.host.clone(),
            user: self.remote.user.clone(),
            password,
        }
    }

    pub fn scan_config(&self) -> ScanConfig {
        ScanConfig {
            exclude_patterns: self.exclude_patterns.clone(),
            ..Default::default()
        }
    }

    pub fn sync_config(&self) -> SyncConfig {
        SyncConfig {
            dir_mode: self.dir_mode,
        }
    }
}
