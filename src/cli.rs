//! 命令行参数

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// 片段上传工具
#[derive(Debug, Parser)]
#[command(name = "clip_uploader")]
#[command(about = "把暂存目录中的视频片段上传到 TikTok / Instagram", long_about = None)]
#[command(version)]
pub struct Cli {
    /// 要执行的子命令（默认 upload）
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// TOML 配置文件路径
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// 显示 debug 级别日志
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// 可用的子命令
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Subcommand)]
pub enum Commands {
    /// 上传暂存目录中的全部片段
    #[default]
    Upload,
    /// 预处理原始片段：短片段复制，长片段拼接片尾
    Prepare,
}

impl Cli {
    pub fn command(&self) -> Commands {
        self.command.unwrap_or_default()
    }
}
