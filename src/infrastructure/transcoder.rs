//! 转码器接口 - 基础设施层
//!
//! 外部转码协作者的抽象：输入路径 → 输出路径，成功或失败。
//! `ClipEditor` 是 prepare 子命令用到的探测和拼接能力。

use async_trait::async_trait;
use std::path::Path;

use crate::error::TranscodeError;
use crate::infrastructure::{FfmpegRunner, MediaInfo};

/// 转码能力
#[async_trait]
pub trait Transcoder: Send + Sync {
    /// 把 `input` 转换为平台可接受的 mp4，写入 `output`
    async fn transcode(&self, input: &Path, output: &Path) -> Result<(), TranscodeError>;
}

#[async_trait]
impl Transcoder for FfmpegRunner {
    async fn transcode(&self, input: &Path, output: &Path) -> Result<(), TranscodeError> {
        self.convert_to_mp4(input, output).await
    }
}

/// 片段剪辑能力
#[async_trait]
pub trait ClipEditor: Send + Sync {
    /// 读取时长、分辨率、帧率和音轨信息
    async fn probe(&self, input: &Path) -> Result<MediaInfo, TranscodeError>;

    /// 把 `outro` 拼接到 `main` 之后，写入 `output`
    async fn append_outro(
        &self,
        main: &Path,
        main_info: &MediaInfo,
        outro: &Path,
        outro_info: &MediaInfo,
        output: &Path,
    ) -> Result<(), TranscodeError>;
}

#[async_trait]
impl ClipEditor for FfmpegRunner {
    async fn probe(&self, input: &Path) -> Result<MediaInfo, TranscodeError> {
        FfmpegRunner::probe(self, input).await
    }

    async fn append_outro(
        &self,
        main: &Path,
        main_info: &MediaInfo,
        outro: &Path,
        outro_info: &MediaInfo,
        output: &Path,
    ) -> Result<(), TranscodeError> {
        FfmpegRunner::append_outro(self, main, main_info, outro, outro_info, output).await
    }
}
