//! 片段预处理服务 - 业务能力层
//!
//! 按时长分拣原始片段：短片段原样复制，长片段在末尾拼接片尾。
//! 原始文件保持不变。

use anyhow::Context;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::ConfigError;
use crate::infrastructure::{ClipEditor, FfmpegRunner, MediaInfo};

/// 预处理阶段接受的扩展名
const RAW_EXTENSIONS: [&str; 6] = ["mp4", "mov", "avi", "mkv", "wmv", "webm"];

/// 单个片段的预处理结果
#[derive(Debug, Clone, PartialEq)]
pub enum PrepareOutcome {
    /// 短片段，已复制到短片段目录
    Copied(PathBuf),
    /// 长片段，已拼接片尾
    Appended(PathBuf),
}

/// 预处理统计
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PrepareStats {
    pub copied: usize,
    pub appended: usize,
    pub failed: usize,
}

/// 片段预处理器
pub struct ClipPreparer {
    editor: Arc<dyn ClipEditor>,
    raw_dir: PathBuf,
    outro_path: PathBuf,
    long_dir: PathBuf,
    short_dir: PathBuf,
    max_short_secs: f64,
}

impl ClipPreparer {
    pub fn new(config: &Config) -> Self {
        let runner = FfmpegRunner::new(
            config.ffmpeg_path.clone(),
            config.ffprobe_path.clone(),
            config.transcode_timeout(),
        );
        Self::with_editor(config, Arc::new(runner))
    }

    /// 使用指定的剪辑器（测试时可替换）
    pub fn with_editor(config: &Config, editor: Arc<dyn ClipEditor>) -> Self {
        Self {
            editor,
            raw_dir: config.raw_clips_dir.clone(),
            outro_path: config.outro_path.clone(),
            long_dir: config.long_clips_dir.clone(),
            short_dir: config.short_clips_dir.clone(),
            max_short_secs: config.max_short_clip_secs,
        }
    }

    /// 处理原始目录中的全部片段
    ///
    /// 片尾或原始目录有问题属于配置错误；单个片段失败只记录日志
    pub async fn run(&self) -> Result<PrepareStats, ConfigError> {
        if !self.raw_dir.is_dir() {
            return Err(ConfigError::DirectoryNotFound {
                path: self.raw_dir.clone(),
            });
        }
        if !self.outro_path.is_file() {
            return Err(ConfigError::FileNotFound {
                path: self.outro_path.clone(),
            });
        }

        for dir in [&self.long_dir, &self.short_dir] {
            if !dir.exists() {
                fs::create_dir_all(dir).await.map_err(|source| {
                    ConfigError::DirectoryCreateFailed {
                        path: dir.clone(),
                        source,
                    }
                })?;
                info!("📁 已创建目录: {}", dir.display());
            }
        }

        let outro = self
            .editor
            .probe(&self.outro_path)
            .await
            .map_err(|source| ConfigError::OutroProbeFailed {
                path: self.outro_path.clone(),
                source,
            })?;

        info!("📁 正在扫描 {} ...", self.raw_dir.display());
        let mut stats = PrepareStats::default();

        for path in list_raw_clips(&self.raw_dir).await? {
            let name = file_name(&path);
            match self.prepare_one(&path, &outro).await {
                Ok(PrepareOutcome::Copied(dest)) => {
                    info!("✅ {} 已复制到 {}", name, dest.display());
                    stats.copied += 1;
                }
                Ok(PrepareOutcome::Appended(dest)) => {
                    info!("✅ {} 已拼接片尾: {}", name, dest.display());
                    stats.appended += 1;
                }
                Err(e) => {
                    warn!("⚠️ 处理 {} 失败: {:#}", name, e);
                    stats.failed += 1;
                }
            }
        }

        info!(
            "🎉 预处理完成: 复制 {}，拼接 {}，失败 {}",
            stats.copied, stats.appended, stats.failed
        );
        Ok(stats)
    }

    /// 处理单个片段
    ///
    /// 时长不超过上限（含等于）的片段直接复制
    async fn prepare_one(
        &self,
        path: &Path,
        outro: &MediaInfo,
    ) -> anyhow::Result<PrepareOutcome> {
        let info = self.editor.probe(path).await?;

        if info.duration_secs <= self.max_short_secs {
            info!(
                "-> {} 是短片段 ({:.1}s)，直接复制",
                file_name(path),
                info.duration_secs
            );
            let dest = self.short_dir.join(file_name(path));
            fs::copy(path, &dest)
                .await
                .with_context(|| format!("无法复制到 {}", dest.display()))?;
            return Ok(PrepareOutcome::Copied(dest));
        }

        info!(
            "-> {} 是长片段 ({:.1}s)，拼接片尾",
            file_name(path),
            info.duration_secs
        );
        if (outro.width, outro.height) != (info.width, info.height) {
            info!(
                "   片尾分辨率 {}x{} 调整为 {}x{}",
                outro.width, outro.height, info.width, info.height
            );
        }

        let stem = path
            .file_stem()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();
        let dest = self.long_dir.join(format!("{}_appended.mp4", stem));
        self.editor
            .append_outro(path, &info, &self.outro_path, outro, &dest)
            .await?;

        Ok(PrepareOutcome::Appended(dest))
    }
}

/// 列出原始目录中支持的片段（按文件名排序）
async fn list_raw_clips(raw_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let read_failed = |source| ConfigError::FileReadFailed {
        path: raw_dir.to_path_buf(),
        source,
    };

    let mut entries = fs::read_dir(raw_dir).await.map_err(read_failed)?;
    let mut clips = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(read_failed)? {
        let path = entry.path();
        if is_raw_clip(&path) {
            clips.push(path);
        }
    }
    clips.sort();
    Ok(clips)
}

fn is_raw_clip(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| RAW_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string()
}
