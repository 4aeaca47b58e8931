//! 格式规范化服务 - 业务能力层
//!
//! 只有平台不接受的格式才交给外部转码器，其余原样放行

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use crate::error::TranscodeError;
use crate::infrastructure::{TempArtifact, Transcoder, CONVERTED_SUFFIX};
use crate::models::Clip;

/// 规范化后的片段
///
/// 转码产物由 `TempArtifact` 持有，随本值一起释放
#[derive(Debug)]
pub enum NormalizedClip {
    /// 原文件可直接上传
    Original(PathBuf),
    /// 转码生成的临时文件
    Converted(TempArtifact),
}

impl NormalizedClip {
    /// 上传时使用的路径
    pub fn path(&self) -> &Path {
        match self {
            NormalizedClip::Original(path) => path,
            NormalizedClip::Converted(artifact) => artifact.path(),
        }
    }

    pub fn is_converted(&self) -> bool {
        matches!(self, NormalizedClip::Converted(_))
    }

    /// 释放临时文件（原文件不受影响）
    pub fn release(self) {
        if let NormalizedClip::Converted(artifact) = self {
            artifact.cleanup();
        }
    }
}

/// 格式规范化器
#[derive(Clone)]
pub struct FormatNormalizer {
    transcoder: Arc<dyn Transcoder>,
    temp_dir: PathBuf,
}

impl FormatNormalizer {
    /// # 参数
    /// - `transcoder`: 外部转码器
    /// - `temp_dir`: 转码产物目录（不能是暂存目录）
    pub fn new(transcoder: Arc<dyn Transcoder>, temp_dir: impl Into<PathBuf>) -> Self {
        Self {
            transcoder,
            temp_dir: temp_dir.into(),
        }
    }

    pub fn temp_dir(&self) -> &Path {
        &self.temp_dir
    }

    /// 转码产物的路径
    pub fn output_path_for(&self, clip: &Clip) -> PathBuf {
        self.temp_dir.join(format!("{}{}", clip.stem(), CONVERTED_SUFFIX))
    }

    /// 规范化片段
    ///
    /// 转码失败时删除可能残留的半成品并返回错误
    pub async fn normalize(&self, clip: &Clip) -> Result<NormalizedClip, TranscodeError> {
        if !clip.format.needs_normalization() {
            return Ok(NormalizedClip::Original(clip.source_path.clone()));
        }

        let output = self.output_path_for(clip);
        // 先交给守卫，失败路径上的残留文件同样会被删除
        let artifact = TempArtifact::adopt(&output);

        self.transcoder
            .transcode(&clip.source_path, &output)
            .await?;

        info!(
            "🔄 已转换 {} → {}",
            clip.display_name,
            output.file_name().unwrap_or_default().to_string_lossy()
        );
        Ok(NormalizedClip::Converted(artifact))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::tempdir;

    /// 写一个假输出文件，或者留下半成品后失败
    struct FakeTranscoder {
        fail: bool,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Transcoder for FakeTranscoder {
        async fn transcode(&self, input: &Path, output: &Path) -> Result<(), TranscodeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            std::fs::write(output, b"partial").unwrap();
            if self.fail {
                Err(TranscodeError::ExitFailure {
                    input: input.to_path_buf(),
                    code: Some(1),
                })
            } else {
                Ok(())
            }
        }
    }

    fn normalizer(fail: bool, temp_dir: &Path) -> (FormatNormalizer, Arc<FakeTranscoder>) {
        let fake = Arc::new(FakeTranscoder {
            fail,
            calls: AtomicUsize::new(0),
        });
        (FormatNormalizer::new(fake.clone(), temp_dir), fake)
    }

    #[tokio::test]
    async fn test_accepted_format_passes_through() {
        let tmp = tempdir().unwrap();
        let (normalizer, fake) = normalizer(false, tmp.path());
        let clip = Clip::from_path(tmp.path().join("a.mp4")).unwrap();

        let normalized = normalizer.normalize(&clip).await.unwrap();
        assert!(!normalized.is_converted());
        assert_eq!(normalized.path(), clip.source_path.as_path());
        assert_eq!(fake.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_webm_is_converted_and_released() {
        let tmp = tempdir().unwrap();
        let (normalizer, fake) = normalizer(false, tmp.path());
        let clip = Clip::from_path(tmp.path().join("b.webm")).unwrap();

        let normalized = normalizer.normalize(&clip).await.unwrap();
        let output = tmp.path().join("b_converted.mp4");
        assert_eq!(normalized.path(), output.as_path());
        assert!(output.exists());
        assert_eq!(fake.calls.load(Ordering::SeqCst), 1);

        normalized.release();
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn test_failed_conversion_leaves_nothing_behind() {
        let tmp = tempdir().unwrap();
        let (normalizer, _) = normalizer(true, tmp.path());
        let clip = Clip::from_path(tmp.path().join("b.webm")).unwrap();

        let result = normalizer.normalize(&clip).await;
        assert!(result.is_err());
        assert!(!tmp.path().join("b_converted.mp4").exists());
    }
}
