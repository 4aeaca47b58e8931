/// 日志工具模块
///
/// 初始化 tracing（终端 + 追加写入的日志文件），并提供日志格式化和输出的辅助函数
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use tracing::{info, warn};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::models::RunStats;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// 本地时间戳
struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", chrono::Local::now().format(TIME_FORMAT))
    }
}

/// 初始化日志
///
/// # 参数
/// - `log_file`: 日志文件路径（追加写入）
/// - `verbose`: 为 true 时默认级别为 debug
///
/// 设置了 `RUST_LOG` 时以它为准。日志文件无法打开时只输出到终端
pub fn init(log_file: &Path, verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_timer(LocalTimer)
        .with_target(false)
        .with_writer(std::io::stdout);

    let (file_layer, file_error) = match open_log_file(log_file) {
        Ok(file) => {
            let layer = tracing_subscriber::fmt::layer()
                .with_timer(LocalTimer)
                .with_target(false)
                .with_ansi(false)
                .with_writer(Mutex::new(file));
            (Some(layer), None)
        }
        Err(e) => (None, Some(e)),
    };

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .with(file_layer)
        .try_init();

    if let Some(e) = file_error {
        warn!("⚠️ 无法打开日志文件 {}: {}", log_file.display(), e);
    }
}

/// 以追加方式打开日志文件并写入本次运行的抬头
fn open_log_file(path: &Path) -> std::io::Result<File> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(
        file,
        "\n{}\n上传日志 - {}\n{}",
        "=".repeat(60),
        chrono::Local::now().format(TIME_FORMAT),
        "=".repeat(60)
    )?;
    Ok(file)
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 片段上传模式");
    let platforms: Vec<String> = config
        .enabled_platforms()
        .iter()
        .map(|p| match config.quota_config().limit(*p) {
            Some(max) => format!("{} (每日上限 {})", p, max),
            None => format!("{} (不限)", p),
        })
        .collect();
    info!("📡 启用平台: {}", platforms.join(", "));
    info!(
        "⏱️ 上传间隔: {}s - {}s",
        config.min_delay_secs, config.max_delay_secs
    );
    info!("{}", "=".repeat(60));
}

/// 记录片段加载信息
///
/// # 参数
/// - `total`: 扫描到的片段数量
pub fn log_clips_loaded(total: usize) {
    info!("✓ 找到 {} 个片段", total);
    info!("💡 片段将逐个处理，每个片段之间随机等待\n");
}

/// 打印最终统计信息
///
/// # 参数
/// - `stats`: 本次运行统计
/// - `log_file_path`: 日志文件路径
pub fn print_final_stats(stats: &RunStats, log_file_path: &Path) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!("完成时间: {}", chrono::Local::now().format(TIME_FORMAT));
    info!("{}", "=".repeat(60));
    info!("📁 扫描: {}，已处理过: {}", stats.scanned, stats.already_processed);
    info!("✅ 上传成功: {}/{}", stats.uploaded, stats.processed());
    info!("❌ 全部失败: {}", stats.failed);
    info!("🔄 转码失败: {}", stats.transcode_failed);
    for (platform, platform_stats) in &stats.per_platform {
        info!(
            "   {}: 成功 {}，失败 {}，跳过 {}",
            platform, platform_stats.succeeded, platform_stats.failed, platform_stats.skipped
        );
    }
    info!("{}", "=".repeat(60));
    info!("\n日志已保存至: {}", log_file_path.display());
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
