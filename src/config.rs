use crate::error::ConfigError;
use crate::models::Platform;
use crate::services::QuotaConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// 程序配置
///
/// 加载顺序：默认值 → TOML 配置文件（可选）→ 环境变量（含 `.env`）
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    // --- 目录 ---
    /// 待上传片段所在目录
    pub staging_dir: PathBuf,
    /// 已处理片段目录（即台账）
    pub processed_dir: PathBuf,
    /// 转码临时文件目录
    pub temp_dir: PathBuf,
    /// 会话缓存目录
    pub session_dir: PathBuf,
    /// 文案文件
    pub captions_file: PathBuf,
    /// 日志文件
    pub log_file: PathBuf,
    /// 是否显示详细日志
    pub verbose_logging: bool,

    // --- 上传开关与配额 ---
    pub upload_to_tiktok: bool,
    pub upload_to_instagram: bool,
    /// TikTok 每日上传上限
    pub max_tiktok_uploads: Option<u32>,
    /// Instagram 每日上传上限（未设置则不限）
    pub max_instagram_uploads: Option<u32>,
    /// 两次上传之间的最小间隔（秒）
    pub min_delay_secs: u64,
    /// 两次上传之间的最大间隔（秒）
    pub max_delay_secs: u64,

    // --- 超时 ---
    pub request_timeout_secs: u64,
    pub transcode_timeout_secs: u64,

    // --- TikTok ---
    pub tiktok_access_token: String,
    pub tiktok_upload_endpoint: String,
    pub tiktok_publish_endpoint: String,

    // --- Instagram ---
    pub instagram_username: String,
    pub instagram_password: String,
    pub instagram_api_base_url: String,

    // --- 外部工具 ---
    pub ffmpeg_path: String,
    pub ffprobe_path: String,

    // --- 片段预处理（prepare 子命令）---
    pub raw_clips_dir: PathBuf,
    pub outro_path: PathBuf,
    pub long_clips_dir: PathBuf,
    pub short_clips_dir: PathBuf,
    pub max_short_clip_secs: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            staging_dir: PathBuf::from("Clips/Clips_ready_to_upload"),
            processed_dir: PathBuf::from("Clips/Processed_Clips"),
            temp_dir: std::env::temp_dir().join("clip_uploader"),
            session_dir: PathBuf::from("."),
            captions_file: PathBuf::from("captions.txt"),
            log_file: PathBuf::from("upload_log.txt"),
            verbose_logging: false,
            upload_to_tiktok: true,
            upload_to_instagram: true,
            max_tiktok_uploads: Some(10),
            max_instagram_uploads: None,
            min_delay_secs: 60,
            max_delay_secs: 180,
            request_timeout_secs: 300,
            transcode_timeout_secs: 900,
            tiktok_access_token: String::new(),
            tiktok_upload_endpoint: "https://open.tiktokapis.com/v2/video/upload/".to_string(),
            tiktok_publish_endpoint: "https://open.tiktokapis.com/v2/video/publish/".to_string(),
            instagram_username: String::new(),
            instagram_password: String::new(),
            instagram_api_base_url: "https://i.instagram.com".to_string(),
            ffmpeg_path: "ffmpeg".to_string(),
            ffprobe_path: "ffprobe".to_string(),
            raw_clips_dir: PathBuf::from("Clips/Raw_clips"),
            outro_path: PathBuf::from("Clips/outro/outro.mp4"),
            long_clips_dir: PathBuf::from("Clips/Final_clips"),
            short_clips_dir: PathBuf::from("Clips/Short_clips"),
            max_short_clip_secs: 16.0,
        }
    }
}

impl Config {
    /// 加载配置
    ///
    /// # 参数
    /// - `config_file`: 可选的 TOML 配置文件路径
    pub fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        check_dotenv(dotenvy::dotenv())?;

        let mut config = match config_file {
            Some(path) => Self::from_toml_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// 从 TOML 文件读取配置，未出现的字段使用默认值
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content =
            std::fs::read_to_string(path).map_err(|source| ConfigError::FileReadFailed {
                path: path.to_path_buf(),
                source,
            })?;
        Self::from_toml_str(&content, path)
    }

    fn from_toml_str(content: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::TomlParseFailed {
            path: path.to_path_buf(),
            source,
        })
    }

    /// 用环境变量覆盖配置
    ///
    /// `lookup` 返回变量值，便于测试时替换真实环境
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        let env = EnvOverrides { lookup: &lookup };

        env.path("FOLDER_CLIPS_READY", &mut self.staging_dir);
        env.path("FOLDER_PROCESSED", &mut self.processed_dir);
        env.path("TEMP_DIR", &mut self.temp_dir);
        env.path("SESSION_DIR", &mut self.session_dir);
        env.path("CAPTIONS_FILE", &mut self.captions_file);
        env.path("LOG_FILE", &mut self.log_file);
        env.parse("VERBOSE_LOGGING", &mut self.verbose_logging, "bool")?;

        env.parse("UPLOAD_TO_TIKTOK", &mut self.upload_to_tiktok, "bool")?;
        env.parse("UPLOAD_TO_INSTAGRAM", &mut self.upload_to_instagram, "bool")?;
        env.parse_optional("MAX_TIKTOK_UPLOADS", &mut self.max_tiktok_uploads, "u32")?;
        env.parse_optional(
            "MAX_INSTAGRAM_UPLOADS",
            &mut self.max_instagram_uploads,
            "u32",
        )?;
        env.parse("MIN_DELAY", &mut self.min_delay_secs, "u64")?;
        env.parse("MAX_DELAY", &mut self.max_delay_secs, "u64")?;
        env.parse("REQUEST_TIMEOUT", &mut self.request_timeout_secs, "u64")?;
        env.parse("TRANSCODE_TIMEOUT", &mut self.transcode_timeout_secs, "u64")?;

        env.string("ACCESS_TOKEN", &mut self.tiktok_access_token);
        env.string("TIKTOK_UPLOAD_ENDPOINT", &mut self.tiktok_upload_endpoint);
        env.string("TIKTOK_PUBLISH_ENDPOINT", &mut self.tiktok_publish_endpoint);

        env.string("IG_USERNAME", &mut self.instagram_username);
        env.string("IG_PASSWORD", &mut self.instagram_password);
        env.string("IG_API_BASE_URL", &mut self.instagram_api_base_url);

        env.string("FFMPEG_PATH", &mut self.ffmpeg_path);
        env.string("FFPROBE_PATH", &mut self.ffprobe_path);

        env.path("FOLDER_RAW_CLIPS", &mut self.raw_clips_dir);
        env.path("OUTRO_CLIP", &mut self.outro_path);
        env.path("FOLDER_LONG_CLIPS", &mut self.long_clips_dir);
        env.path("FOLDER_SHORT_CLIPS", &mut self.short_clips_dir);
        env.parse(
            "MAX_SHORT_CLIP_DURATION",
            &mut self.max_short_clip_secs,
            "f64",
        )?;

        Ok(())
    }

    /// 校验上传运行所需的配置
    ///
    /// 暂存目录必须存在；已处理、临时和会话目录不存在时自动创建
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_delay_secs > self.max_delay_secs {
            return Err(ConfigError::InvalidPacingWindow {
                min_secs: self.min_delay_secs,
                max_secs: self.max_delay_secs,
            });
        }

        if self.enabled_platforms().is_empty() {
            return Err(ConfigError::NoPlatformEnabled);
        }

        if !self.staging_dir.is_dir() {
            return Err(ConfigError::DirectoryNotFound {
                path: self.staging_dir.clone(),
            });
        }

        for dir in [&self.processed_dir, &self.temp_dir, &self.session_dir] {
            std::fs::create_dir_all(dir).map_err(|source| ConfigError::DirectoryCreateFailed {
                path: dir.clone(),
                source,
            })?;
        }

        Ok(())
    }

    /// 启用的平台（按派发顺序）
    pub fn enabled_platforms(&self) -> Vec<Platform> {
        Platform::ALL
            .into_iter()
            .filter(|p| match p {
                Platform::TikTok => self.upload_to_tiktok,
                Platform::Instagram => self.upload_to_instagram,
            })
            .collect()
    }

    /// 构建配额配置
    pub fn quota_config(&self) -> QuotaConfig {
        let mut quota = QuotaConfig::default();
        if let Some(max) = self.max_tiktok_uploads {
            quota = quota.with_limit(Platform::TikTok, max);
        }
        if let Some(max) = self.max_instagram_uploads {
            quota = quota.with_limit(Platform::Instagram, max);
        }
        quota
    }

    pub fn min_delay(&self) -> Duration {
        Duration::from_secs(self.min_delay_secs)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_secs(self.max_delay_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn transcode_timeout(&self) -> Duration {
        Duration::from_secs(self.transcode_timeout_secs)
    }
}

/// `.env` 不存在时忽略，格式错误时报错
fn check_dotenv<T>(result: dotenvy::Result<T>) -> Result<(), ConfigError> {
    match result {
        Ok(_) => Ok(()),
        Err(e) if e.not_found() => Ok(()),
        Err(source) => Err(ConfigError::DotenvFailed { source }),
    }
}

/// 环境变量覆盖辅助
struct EnvOverrides<'a, F: Fn(&str) -> Option<String>> {
    lookup: &'a F,
}

impl<F: Fn(&str) -> Option<String>> EnvOverrides<'_, F> {
    fn get(&self, name: &str) -> Option<String> {
        (self.lookup)(name).filter(|v| !v.trim().is_empty())
    }

    fn string(&self, name: &str, target: &mut String) {
        if let Some(value) = self.get(name) {
            *target = value;
        }
    }

    fn path(&self, name: &str, target: &mut PathBuf) {
        if let Some(value) = self.get(name) {
            *target = PathBuf::from(value);
        }
    }

    fn parse<T: FromStr>(
        &self,
        name: &str,
        target: &mut T,
        expected_type: &str,
    ) -> Result<(), ConfigError> {
        if let Some(value) = self.get(name) {
            *target = value
                .trim()
                .parse()
                .map_err(|_| ConfigError::EnvVarParseFailed {
                    var_name: name.to_string(),
                    value: value.clone(),
                    expected_type: expected_type.to_string(),
                })?;
        }
        Ok(())
    }

    fn parse_optional<T: FromStr>(
        &self,
        name: &str,
        target: &mut Option<T>,
        expected_type: &str,
    ) -> Result<(), ConfigError> {
        if let Some(value) = self.get(name) {
            let parsed = value
                .trim()
                .parse()
                .map_err(|_| ConfigError::EnvVarParseFailed {
                    var_name: name.to_string(),
                    value: value.clone(),
                    expected_type: expected_type.to_string(),
                })?;
            *target = Some(parsed);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn test_defaults_match_original_limits() {
        let config = Config::default();
        assert_eq!(config.max_tiktok_uploads, Some(10));
        assert_eq!(config.max_instagram_uploads, None);
        assert_eq!(config.min_delay(), Duration::from_secs(60));
        assert_eq!(config.max_delay(), Duration::from_secs(180));
        assert_eq!(
            config.enabled_platforms(),
            vec![Platform::TikTok, Platform::Instagram]
        );
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config
            .apply_overrides(lookup_from(&[
                ("UPLOAD_TO_TIKTOK", "false"),
                ("MAX_INSTAGRAM_UPLOADS", "3"),
                ("MIN_DELAY", "5"),
                ("IG_USERNAME", "marimba"),
                ("FOLDER_CLIPS_READY", "/tmp/ready"),
            ]))
            .unwrap();

        assert!(!config.upload_to_tiktok);
        assert_eq!(config.max_instagram_uploads, Some(3));
        assert_eq!(config.min_delay_secs, 5);
        assert_eq!(config.instagram_username, "marimba");
        assert_eq!(config.staging_dir, PathBuf::from("/tmp/ready"));
        assert_eq!(config.enabled_platforms(), vec![Platform::Instagram]);
    }

    #[test]
    fn test_bad_env_value_is_error() {
        let mut config = Config::default();
        let err = config
            .apply_overrides(lookup_from(&[("MAX_DELAY", "soon")]))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::EnvVarParseFailed { ref var_name, .. } if var_name == "MAX_DELAY"
        ));
    }

    #[test]
    fn test_missing_dotenv_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let result = dotenvy::from_path(dir.path().join(".env"));
        assert!(check_dotenv(result).is_ok());
    }

    #[test]
    fn test_malformed_dotenv_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(
            &path,
            "CLIP_UPLOADER_DOTENV_USER=marimba\nCLIP_UPLOADER_DOTENV_PASS 'oops\n",
        )
        .unwrap();

        let err = check_dotenv(dotenvy::from_path(&path)).unwrap_err();
        assert!(matches!(err, ConfigError::DotenvFailed { .. }));
        assert!(std::env::var("CLIP_UPLOADER_DOTENV_PASS").is_err());
    }

    #[test]
    fn test_toml_overlay_keeps_defaults() {
        let config = Config::from_toml_str(
            r#"
            staging_dir = "/data/ready"
            max_tiktok_uploads = 4
            upload_to_instagram = false
            "#,
            Path::new("uploader.toml"),
        )
        .unwrap();

        assert_eq!(config.staging_dir, PathBuf::from("/data/ready"));
        assert_eq!(config.max_tiktok_uploads, Some(4));
        assert!(!config.upload_to_instagram);
        assert_eq!(config.max_delay_secs, 180);
    }

    #[test]
    fn test_validate_rejects_inverted_window() {
        let config = Config {
            min_delay_secs: 200,
            max_delay_secs: 100,
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidPacingWindow { .. })
        ));
    }

    #[test]
    fn test_validate_requires_an_enabled_platform() {
        let config = Config {
            upload_to_tiktok: false,
            upload_to_instagram: false,
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NoPlatformEnabled)
        ));
    }

    #[test]
    fn test_validate_requires_staging_and_creates_processed() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            staging_dir: dir.path().join("ready"),
            processed_dir: dir.path().join("processed"),
            temp_dir: dir.path().join("tmp"),
            session_dir: dir.path().join("sessions"),
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::DirectoryNotFound { .. })
        ));

        std::fs::create_dir(&config.staging_dir).unwrap();
        config.validate().unwrap();
        assert!(config.processed_dir.is_dir());
        assert!(config.session_dir.is_dir());
    }

    #[test]
    fn test_quota_config_only_caps_configured_platforms() {
        let quota = Config::default().quota_config();
        assert_eq!(quota.limit(Platform::TikTok), Some(10));
        assert_eq!(quota.limit(Platform::Instagram), None);
    }
}
