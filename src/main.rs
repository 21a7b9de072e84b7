use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use glsync_lib::core::{FsTree, SyncEngine};
use glsync_lib::logging::init_logging;
use glsync_lib::transport::create_transport;
use glsync_lib::AppConfig;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "glsync", version, about = "把本地目录单向同步到远端")]
struct Cli {
    /// 配置文件路径（默认位于用户配置目录）
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 同步本地目录到远端目录
    Sync {
        /// 本地根目录
        local: PathBuf,
        /// 远端根目录
        remote: String,
    },
    /// 列出远端目录树
    List {
        /// 远端根目录
        remote: String,
    },
    /// 写入一份默认配置文件
    Init {
        /// 已存在时覆盖
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_path = cli.config.unwrap_or_else(AppConfig::default_path);

    if let Command::Init { force } = cli.command {
        return init_config(&config_path, force);
    }

    let config = AppConfig::load(&config_path)?;

    let _log_guard = init_logging(&config.log);

    let transport = create_transport(&config.remote);
    let local = Arc::new(FsTree::new(config.scan_config())?);
    let mut engine = SyncEngine::with_config(
        transport,
        local,
        config.credentials(),
        config.sync_config(),
    );

    match cli.command {
        Command::Sync { local, remote } => {
            let local = local
                .canonicalize()
                .with_context(|| format!("本地目录不存在: {}", local.display()))?;
            let report = engine
                .sync_directory(&local, &remote, |op| {
                    println!(
                        "[{}] {:<12} {:>5}  {}",
                        op.kind.code(),
                        op.kind.as_str(),
                        op.index,
                        op.remote_path
                    );
                    Ok(())
                })
                .await?;
            println!(
                "完成: 共 {} 个操作, 耗时 {}s",
                report.total_operations(),
                report.end_time - report.start_time
            );
        }
        Command::List { remote } => {
            let tree = engine.get_all_files(&remote).await?;
            for dir in tree.dirs.iter() {
                println!("d {:>12} {}", "-", dir.path);
            }
            for file in tree.files.iter() {
                println!("f {:>12} {}", file.size, file.path);
            }
        }
        Command::Init { .. } => {}
    }

    Ok(())
}

/// 写入默认配置
fn init_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!("配置文件已存在: {}", path.display());
    }
    AppConfig::default().save(path)?;
    println!("已写入配置文件: {}", path.display());
    Ok(())
}
