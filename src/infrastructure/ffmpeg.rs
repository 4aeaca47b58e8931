//! ffmpeg 进程网关 - 基础设施层
//!
//! 持有外部工具路径和超时设置，只暴露"运行 ffmpeg / ffprobe"的能力

use serde::Deserialize;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

use crate::error::TranscodeError;

/// 媒体信息（来自 ffprobe）
#[derive(Debug, Clone, PartialEq)]
pub struct MediaInfo {
    /// 时长（秒）
    pub duration_secs: f64,
    pub width: u32,
    pub height: u32,
    /// 帧率（如 30、29.97）
    pub fps: f64,
    pub has_audio: bool,
}

/// ffmpeg 运行器
#[derive(Debug, Clone)]
pub struct FfmpegRunner {
    ffmpeg_path: String,
    ffprobe_path: String,
    timeout: Duration,
}

impl FfmpegRunner {
    pub fn new(
        ffmpeg_path: impl Into<String>,
        ffprobe_path: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
            ffprobe_path: ffprobe_path.into(),
            timeout,
        }
    }

    /// 运行 ffmpeg，只关心成功/失败
    ///
    /// # 参数
    /// - `input`: 主输入文件（用于错误信息）
    /// - `args`: 完整参数列表
    pub async fn run<I, S>(&self, input: &Path, args: I) -> Result<(), TranscodeError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut cmd = Command::new(&self.ffmpeg_path);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        debug!("运行 ffmpeg: {:?}", cmd.as_std());

        let mut child = cmd.spawn().map_err(|source| TranscodeError::SpawnFailed {
            program: self.ffmpeg_path.clone(),
            source,
        })?;

        let status = match tokio::time::timeout(self.timeout, child.wait()).await {
            Ok(Ok(status)) => status,
            Ok(Err(source)) => {
                return Err(TranscodeError::SpawnFailed {
                    program: self.ffmpeg_path.clone(),
                    source,
                })
            }
            Err(_) => {
                let _ = child.kill().await;
                return Err(TranscodeError::Timeout {
                    input: input.to_path_buf(),
                    timeout_secs: self.timeout.as_secs(),
                });
            }
        };

        if status.success() {
            Ok(())
        } else {
            Err(TranscodeError::ExitFailure {
                input: input.to_path_buf(),
                code: status.code(),
            })
        }
    }

    /// 用 ffprobe 读取时长、分辨率和帧率
    pub async fn probe(&self, input: &Path) -> Result<MediaInfo, TranscodeError> {
        let mut cmd = Command::new(&self.ffprobe_path);
        cmd.args(["-v", "error", "-print_format", "json", "-show_format", "-show_streams"])
            .arg(input)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let output = match tokio::time::timeout(self.timeout, cmd.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(source)) => {
                return Err(TranscodeError::SpawnFailed {
                    program: self.ffprobe_path.clone(),
                    source,
                })
            }
            Err(_) => {
                return Err(TranscodeError::Timeout {
                    input: input.to_path_buf(),
                    timeout_secs: self.timeout.as_secs(),
                })
            }
        };

        if !output.status.success() {
            return Err(TranscodeError::ExitFailure {
                input: input.to_path_buf(),
                code: output.status.code(),
            });
        }

        parse_probe_output(input, &output.stdout)
    }

    /// 把任意格式转换为 mp4
    pub async fn convert_to_mp4(&self, input: &Path, output: &Path) -> Result<(), TranscodeError> {
        let args: Vec<&OsStr> = vec![
            OsStr::new("-y"),
            OsStr::new("-i"),
            input.as_os_str(),
            output.as_os_str(),
        ];
        self.run(input, args).await
    }

    /// 在主片段末尾拼接片尾，输出 H.264/AAC
    pub async fn append_outro(
        &self,
        main: &Path,
        main_info: &MediaInfo,
        outro: &Path,
        outro_info: &MediaInfo,
        output: &Path,
    ) -> Result<(), TranscodeError> {
        let args = concat_args(main, outro, main_info, outro_info, output);
        self.run(main, args).await
    }
}

/// 构建拼接命令参数
///
/// 片尾被缩放并重采样到主片段的分辨率和帧率。
/// 任一输入没有音轨时补静音，保证 concat 的输入对齐。
fn concat_args(
    main: &Path,
    outro: &Path,
    main_info: &MediaInfo,
    outro_info: &MediaInfo,
    output: &Path,
) -> Vec<String> {
    let fps = format!("{:.3}", main_info.fps);
    let video_filter = format!(
        "[1:v]scale={w}:{h}:force_original_aspect_ratio=decrease,pad={w}:{h}:(ow-iw)/2:(oh-ih)/2,setsar=1,fps={fps}[ov];[0:v]setsar=1,fps={fps}[mv]",
        w = main_info.width,
        h = main_info.height,
        fps = fps,
    );

    let mut args: Vec<String> = vec![
        "-y".into(),
        "-i".into(),
        main.to_string_lossy().into_owned(),
        "-i".into(),
        outro.to_string_lossy().into_owned(),
    ];

    let mut filter = video_filter;
    if main_info.has_audio && outro_info.has_audio {
        filter.push_str(";[mv][0:a][ov][1:a]concat=n=2:v=1:a=1[v][a]");
    } else {
        let mut next_input = 2;
        let mut audio_label = |has_audio: bool, index: usize, duration: f64, label: &str| {
            if has_audio {
                return format!("[{}:a]", index);
            }
            args.extend(
                ["-f", "lavfi", "-i", "anullsrc=channel_layout=stereo:sample_rate=44100"]
                    .map(String::from),
            );
            filter.push_str(&format!(
                ";[{}:a]atrim=0:{:.3}[{}]",
                next_input, duration, label
            ));
            next_input += 1;
            format!("[{}]", label)
        };
        let main_a = audio_label(main_info.has_audio, 0, main_info.duration_secs, "ma");
        let outro_a = audio_label(outro_info.has_audio, 1, outro_info.duration_secs, "oa");
        filter.push_str(&format!(
            ";[mv]{}[ov]{}concat=n=2:v=1:a=1[v][a]",
            main_a, outro_a
        ));
    }

    args.extend([
        "-filter_complex".into(),
        filter,
        "-map".into(),
        "[v]".into(),
        "-map".into(),
        "[a]".into(),
        "-c:v".into(),
        "libx264".into(),
        "-c:a".into(),
        "aac".into(),
        output.to_string_lossy().into_owned(),
    ]);
    args
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    format: Option<ProbeFormat>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

/// 解析 ffprobe 的 JSON 输出
fn parse_probe_output(input: &Path, stdout: &[u8]) -> Result<MediaInfo, TranscodeError> {
    let probe_failed = |message: String| TranscodeError::ProbeFailed {
        input: PathBuf::from(input),
        message,
    };

    let probe: ProbeOutput =
        serde_json::from_slice(stdout).map_err(|e| probe_failed(e.to_string()))?;

    let video = probe
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| probe_failed("没有视频流".to_string()))?;

    let duration_secs = probe
        .format
        .as_ref()
        .and_then(|f| f.duration.as_deref())
        .and_then(|d| d.parse::<f64>().ok())
        .ok_or_else(|| probe_failed("缺少时长".to_string()))?;

    let fps = video
        .r_frame_rate
        .as_deref()
        .and_then(parse_frame_rate)
        .unwrap_or(30.0);

    Ok(MediaInfo {
        duration_secs,
        width: video.width.unwrap_or(0),
        height: video.height.unwrap_or(0),
        fps,
        has_audio: probe
            .streams
            .iter()
            .any(|s| s.codec_type.as_deref() == Some("audio")),
    })
}

/// 解析 "30000/1001" 形式的帧率
fn parse_frame_rate(rate: &str) -> Option<f64> {
    match rate.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.parse().ok()?;
            let den: f64 = den.parse().ok()?;
            (den != 0.0).then(|| num / den)
        }
        None => rate.parse().ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn media(duration: f64, audio: bool) -> MediaInfo {
        MediaInfo {
            duration_secs: duration,
            width: 1080,
            height: 1920,
            fps: 30.0,
            has_audio: audio,
        }
    }

    #[test]
    fn test_concat_args_with_audio() {
        let args = concat_args(
            Path::new("main.mp4"),
            Path::new("outro.mp4"),
            &media(30.0, true),
            &media(5.0, true),
            Path::new("out/main_appended.mp4"),
        );

        let filter_pos = args.iter().position(|a| a == "-filter_complex").unwrap();
        let filter = &args[filter_pos + 1];
        assert!(filter.contains("scale=1080:1920"));
        assert!(filter.contains("fps=30.000"));
        assert!(filter.ends_with("[mv][0:a][ov][1:a]concat=n=2:v=1:a=1[v][a]"));
        assert!(!args.iter().any(|a| a == "lavfi"));
        assert_eq!(args.last().unwrap(), "out/main_appended.mp4");
    }

    #[test]
    fn test_concat_args_pads_missing_audio() {
        let args = concat_args(
            Path::new("main.mp4"),
            Path::new("outro.mp4"),
            &media(30.0, true),
            &media(5.0, false),
            Path::new("main_appended.mp4"),
        );

        assert!(args.iter().any(|a| a == "lavfi"));
        let filter_pos = args.iter().position(|a| a == "-filter_complex").unwrap();
        let filter = &args[filter_pos + 1];
        assert!(filter.contains("[2:a]atrim=0:5.000[oa]"));
        assert!(filter.ends_with("[mv][0:a][ov][oa]concat=n=2:v=1:a=1[v][a]"));
    }

    #[test]
    fn test_parse_frame_rate() {
        assert_eq!(parse_frame_rate("30/1"), Some(30.0));
        assert!((parse_frame_rate("30000/1001").unwrap() - 29.97).abs() < 0.01);
        assert_eq!(parse_frame_rate("0/0"), None);
        assert_eq!(parse_frame_rate("25"), Some(25.0));
    }

    #[test]
    fn test_parse_probe_output() {
        let json = br#"{
            "streams": [
                {"codec_type": "video", "width": 1080, "height": 1920, "r_frame_rate": "60/1"},
                {"codec_type": "audio"}
            ],
            "format": {"duration": "23.480000"}
        }"#;

        let info = parse_probe_output(Path::new("a.mp4"), json).unwrap();
        assert_eq!(info.width, 1080);
        assert_eq!(info.height, 1920);
        assert_eq!(info.fps, 60.0);
        assert!(info.has_audio);
        assert!((info.duration_secs - 23.48).abs() < 1e-9);
    }

    #[test]
    fn test_probe_without_video_stream_fails() {
        let json = br#"{"streams": [{"codec_type": "audio"}], "format": {"duration": "3.0"}}"#;
        assert!(matches!(
            parse_probe_output(Path::new("a.m4a"), json),
            Err(TranscodeError::ProbeFailed { .. })
        ));
    }

    #[tokio::test]
    async fn test_missing_binary_is_spawn_failure() {
        let runner = FfmpegRunner::new(
            "/nonexistent/ffmpeg-binary",
            "/nonexistent/ffprobe-binary",
            Duration::from_secs(5),
        );
        let err = runner
            .convert_to_mp4(Path::new("in.webm"), Path::new("out.mp4"))
            .await
            .unwrap_err();
        assert!(matches!(err, TranscodeError::SpawnFailed { .. }));
    }
}
