//! 平台适配器
//!
//! 每个平台实现同一组能力 {authenticate, upload}，
//! 编排层只依赖 `PlatformAdapter`，不关心各平台的协议细节。

pub mod instagram_client;
pub mod tiktok_client;

use async_trait::async_trait;
use std::path::Path;

use crate::error::PlatformError;
use crate::models::{Caption, Platform};

pub use instagram_client::{InstagramClient, InstagramSession};
pub use tiktok_client::TikTokClient;

/// 认证结果：会话从哪里来
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionSource {
    /// 静态 Token，无需会话
    StaticToken,
    /// 从缓存恢复
    Restored,
    /// 完整登录得到的新会话
    FreshLogin,
}

/// 平台适配器能力接口
#[async_trait]
pub trait PlatformAdapter: Send + Sync {
    /// 适配器对应的平台
    fn platform(&self) -> Platform;

    /// 认证（每次运行最多由编排层调用一次）
    async fn authenticate(&mut self) -> Result<SessionSource, PlatformError>;

    /// 上传并发布片段
    ///
    /// 内部可能分为提交和发布两步，对调用方而言要么完全成功要么失败
    async fn upload(&self, file: &Path, caption: &Caption) -> Result<(), PlatformError>;
}

/// 把 reqwest 错误转换为平台错误
pub(crate) fn request_error(
    platform: Platform,
    operation: &'static str,
    timeout_secs: u64,
    err: reqwest::Error,
    auth: bool,
) -> PlatformError {
    if err.is_timeout() {
        PlatformError::Timeout {
            platform,
            operation,
            timeout_secs,
        }
    } else if auth {
        PlatformError::auth(platform, format!("{} 请求失败: {}", operation, err))
    } else {
        PlatformError::upload(platform, format!("{} 请求失败: {}", operation, err))
    }
}
