use std::path::PathBuf;

use thiserror::Error;

use crate::models::Platform;

/// 应用程序错误类型
///
/// 只有 `Config` 与 `Ledger` 会终止整个运行，其余错误都在平台或片段范围内被吸收。
#[derive(Debug, Error)]
pub enum AppError {
    /// 配置错误（启动时致命）
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 平台错误（只影响单个平台）
    #[error("平台错误: {0}")]
    Platform(#[from] PlatformError),
    /// 转码错误（只影响单个片段）
    #[error("转码错误: {0}")]
    Transcode(#[from] TranscodeError),
    /// 台账写入错误（运行级致命，无法保证不重复上传）
    #[error("台账错误: {0}")]
    Ledger(#[from] LedgerError),
    /// 会话缓存错误
    #[error("会话缓存错误: {0}")]
    Session(#[from] SessionError),
    /// HTTP 客户端初始化失败
    #[error("HTTP 客户端初始化失败: {0}")]
    Http(#[from] reqwest::Error),
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// 配置文件读取失败
    #[error("无法读取配置文件 {path}: {source}")]
    FileReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// 配置文件解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    /// 目录不存在
    #[error("目录不存在: {}", path.display())]
    DirectoryNotFound { path: PathBuf },
    /// 目录无法创建
    #[error("无法创建目录 {}: {source}", path.display())]
    DirectoryCreateFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// 文件不存在
    #[error("文件不存在: {}", path.display())]
    FileNotFound { path: PathBuf },
    /// 上传间隔窗口非法
    #[error("上传间隔配置非法: 最小值 {min_secs}s 大于最大值 {max_secs}s")]
    InvalidPacingWindow { min_secs: u64, max_secs: u64 },
    /// 没有启用任何平台
    #[error("没有启用任何上传平台")]
    NoPlatformEnabled,
    /// `.env` 文件无法解析
    #[error(".env 加载失败: {source}")]
    DotenvFailed {
        #[source]
        source: dotenvy::Error,
    },
    /// 片尾无法读取
    #[error("无法读取片尾 {}: {source}", path.display())]
    OutroProbeFailed {
        path: PathBuf,
        #[source]
        source: TranscodeError,
    },
}

/// 平台错误
#[derive(Debug, Error)]
pub enum PlatformError {
    /// 认证失败，本次运行内该平台不可用
    #[error("{platform} 认证失败: {message}")]
    Authentication { platform: Platform, message: String },
    /// 上传或发布失败
    #[error("{platform} 上传失败: {message}")]
    Upload { platform: Platform, message: String },
    /// 网络操作超时
    #[error("{platform} {operation} 超时 ({timeout_secs}s)")]
    Timeout {
        platform: Platform,
        operation: &'static str,
        timeout_secs: u64,
    },
    /// 平台尚未认证或已被标记为不可用
    #[error("{platform} 未认证，无法上传")]
    NotAuthenticated { platform: Platform },
}

impl PlatformError {
    /// 创建认证错误
    pub fn auth(platform: Platform, message: impl Into<String>) -> Self {
        PlatformError::Authentication {
            platform,
            message: message.into(),
        }
    }

    /// 创建上传错误
    pub fn upload(platform: Platform, message: impl Into<String>) -> Self {
        PlatformError::Upload {
            platform,
            message: message.into(),
        }
    }
}

/// 转码错误
#[derive(Debug, Error)]
pub enum TranscodeError {
    /// 无法启动外部进程
    #[error("无法启动 {program}: {source}")]
    SpawnFailed {
        program: String,
        #[source]
        source: std::io::Error,
    },
    /// 外部进程返回失败
    #[error("{} 转换失败 (退出码: {code:?})", input.display())]
    ExitFailure { input: PathBuf, code: Option<i32> },
    /// 外部进程超时
    #[error("{} 转换超时 ({timeout_secs}s)", input.display())]
    Timeout { input: PathBuf, timeout_secs: u64 },
    /// 探测输出无法解析
    #[error("无法解析 {} 的媒体信息: {message}", input.display())]
    ProbeFailed { input: PathBuf, message: String },
}

/// 台账错误
#[derive(Debug, Error)]
pub enum LedgerError {
    /// 目标位置已有同名片段
    #[error("片段 {display_name} 已存在于已处理目录")]
    AlreadyProcessed { display_name: String },
    /// 移动文件失败
    #[error("无法将 {} 移动到 {}: {source}", from.display(), to.display())]
    MoveFailed {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// 会话缓存错误
#[derive(Debug, Error)]
pub enum SessionError {
    /// 读取缓存失败
    #[error("读取会话缓存失败 ({}): {source}", path.display())]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// 缓存内容损坏
    #[error("会话缓存已损坏 ({}): {source}", path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    /// 写入缓存失败
    #[error("写入会话缓存失败 ({}): {source}", path.display())]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// 序列化失败
    #[error("会话序列化失败: {0}")]
    Serialize(#[source] serde_json::Error),
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
