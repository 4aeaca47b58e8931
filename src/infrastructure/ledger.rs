//! 片段台账 - 基础设施层
//!
//! 记录哪些片段已经处理过。一个片段只会被尝试一次：
//! 无论上传成功与否，处理结束后都会写入台账，之后的运行不再重试。

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

use crate::error::LedgerError;

/// 台账存储接口
///
/// 默认实现基于"已处理目录中是否存在同名文件"，也可以替换为其他存储
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// 片段是否尚未处理
    async fn is_pending(&self, display_name: &str) -> bool;

    /// 把片段记为已处理（消耗原文件）
    ///
    /// # 返回
    /// 返回片段在已处理区域中的位置
    async fn mark_processed(
        &self,
        clip_path: &Path,
        display_name: &str,
    ) -> Result<PathBuf, LedgerError>;
}

/// 基于目录的台账
#[derive(Debug, Clone)]
pub struct FsLedger {
    processed_dir: PathBuf,
}

impl FsLedger {
    pub fn new(processed_dir: impl Into<PathBuf>) -> Self {
        Self {
            processed_dir: processed_dir.into(),
        }
    }

    pub fn processed_dir(&self) -> &Path {
        &self.processed_dir
    }

    fn entry_path(&self, display_name: &str) -> PathBuf {
        self.processed_dir.join(display_name)
    }
}

#[async_trait]
impl LedgerStore for FsLedger {
    async fn is_pending(&self, display_name: &str) -> bool {
        !exists(&self.entry_path(display_name)).await
    }

    async fn mark_processed(
        &self,
        clip_path: &Path,
        display_name: &str,
    ) -> Result<PathBuf, LedgerError> {
        let destination = self.entry_path(display_name);

        if exists(&destination).await {
            return Err(LedgerError::AlreadyProcessed {
                display_name: display_name.to_string(),
            });
        }

        move_file(clip_path, &destination)
            .await
            .map_err(|source| LedgerError::MoveFailed {
                from: clip_path.to_path_buf(),
                to: destination.clone(),
                source,
            })?;

        info!("📦 已移入已处理目录: {}", display_name);
        Ok(destination)
    }
}

async fn exists(path: &Path) -> bool {
    fs::try_exists(path).await.unwrap_or(false)
}

/// 移动文件；跨设备时退化为复制 + 删除
async fn move_file(from: &Path, to: &Path) -> std::io::Result<()> {
    match fs::rename(from, to).await {
        Ok(()) => Ok(()),
        Err(rename_err) => {
            if !exists(from).await {
                return Err(rename_err);
            }
            debug!("rename 失败 ({})，尝试复制后删除", rename_err);
            fs::copy(from, to).await?;
            if let Err(e) = fs::remove_file(from).await {
                let _ = fs::remove_file(to).await;
                return Err(e);
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use tokio_test::{assert_err, assert_ok};

    #[tokio::test]
    async fn test_mark_processed_moves_file() {
        let staging = tempdir().unwrap();
        let processed = tempdir().unwrap();
        let clip = staging.path().join("a.mp4");
        std::fs::write(&clip, b"video").unwrap();

        let ledger = FsLedger::new(processed.path());
        assert!(ledger.is_pending("a.mp4").await);

        let dest = assert_ok!(ledger.mark_processed(&clip, "a.mp4").await);
        assert_eq!(dest, processed.path().join("a.mp4"));
        assert!(!clip.exists());
        assert!(!ledger.is_pending("a.mp4").await);
    }

    #[tokio::test]
    async fn test_existing_entry_is_not_overwritten() {
        let staging = tempdir().unwrap();
        let processed = tempdir().unwrap();
        let clip = staging.path().join("a.mp4");
        std::fs::write(&clip, b"new").unwrap();
        std::fs::write(processed.path().join("a.mp4"), b"old").unwrap();

        let ledger = FsLedger::new(processed.path());
        let err = assert_err!(ledger.mark_processed(&clip, "a.mp4").await);
        assert!(matches!(err, LedgerError::AlreadyProcessed { .. }));
        assert!(clip.exists());
        assert_eq!(std::fs::read(processed.path().join("a.mp4")).unwrap(), b"old");
    }

    #[tokio::test]
    async fn test_missing_source_is_move_failure() {
        let staging = tempdir().unwrap();
        let processed = tempdir().unwrap();
        let ledger = FsLedger::new(processed.path());

        let err = ledger
            .mark_processed(&staging.path().join("ghost.mp4"), "ghost.mp4")
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::MoveFailed { .. }));
    }
}
