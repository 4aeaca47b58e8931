//! 临时产物 - 基础设施层
//!
//! 转码生成的文件归本次运行所有，离开作用域时删除

use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// 转码产物的文件名后缀
pub const CONVERTED_SUFFIX: &str = "_converted.mp4";

/// 临时文件守卫
///
/// 无论上传成功、失败还是提前返回，`Drop` 都会删除文件
#[derive(Debug)]
pub struct TempArtifact {
    path: PathBuf,
    removed: bool,
}

impl TempArtifact {
    /// 接管一个已生成的文件
    pub fn adopt(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            removed: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 立即删除并记录日志
    pub fn cleanup(mut self) {
        self.remove();
    }

    fn remove(&mut self) {
        if self.removed {
            return;
        }
        self.removed = true;
        match std::fs::remove_file(&self.path) {
            Ok(()) => info!("🗑️ 已删除临时文件: {}", file_name(&self.path)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("⚠️ 无法删除临时文件 {}: {}", self.path.display(), e),
        }
    }
}

impl Drop for TempArtifact {
    fn drop(&mut self) {
        self.remove();
    }
}

/// 删除上次运行中断后遗留的转码产物
///
/// # 返回
/// 返回删除的文件数量
pub fn sweep_orphans(temp_dir: &Path) -> usize {
    let entries = match std::fs::read_dir(temp_dir) {
        Ok(entries) => entries,
        Err(_) => return 0,
    };

    let mut removed = 0;
    for entry in entries.flatten() {
        let path = entry.path();
        let is_orphan = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.ends_with(CONVERTED_SUFFIX))
            .unwrap_or(false);

        if is_orphan && path.is_file() {
            match std::fs::remove_file(&path) {
                Ok(()) => {
                    warn!("🧹 清理遗留的临时文件: {}", file_name(&path));
                    removed += 1;
                }
                Err(e) => warn!("⚠️ 无法清理遗留文件 {}: {}", path.display(), e),
            }
        }
    }
    removed
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string()
}
