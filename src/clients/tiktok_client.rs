/// TikTok 客户端
///
/// 使用静态 Bearer Token，没有可恢复的会话，不经过会话存储。
/// 上传分两步：提交视频得到 video_id，再带文案发布（默认仅自己可见，即草稿）。
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::path::Path;
use tracing::{debug, info};

use crate::clients::{request_error, PlatformAdapter, SessionSource};
use crate::error::PlatformError;
use crate::models::{Caption, Platform};

const PLATFORM: Platform = Platform::TikTok;

/// 发布时使用的可见性
const PRIVACY_LEVEL: &str = "SELF";

/// TikTok 客户端
pub struct TikTokClient {
    http: Client,
    upload_endpoint: String,
    publish_endpoint: String,
    access_token: String,
    timeout_secs: u64,
    authenticated: bool,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    data: Option<UploadData>,
}

#[derive(Debug, Deserialize)]
struct UploadData {
    video_id: Option<String>,
}

impl TikTokClient {
    /// 创建新的 TikTok 客户端
    pub fn new(
        http: Client,
        upload_endpoint: impl Into<String>,
        publish_endpoint: impl Into<String>,
        access_token: impl Into<String>,
        timeout_secs: u64,
    ) -> Self {
        Self {
            http,
            upload_endpoint: upload_endpoint.into(),
            publish_endpoint: publish_endpoint.into(),
            access_token: access_token.into(),
            timeout_secs,
            authenticated: false,
        }
    }

    /// 第一步：提交视频文件
    ///
    /// # 返回
    /// 返回平台分配的 video_id
    async fn submit(&self, file: &Path) -> Result<String, PlatformError> {
        let bytes = tokio::fs::read(file).await.map_err(|e| {
            PlatformError::upload(PLATFORM, format!("无法读取 {}: {}", file.display(), e))
        })?;
        let file_name = file
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();

        debug!("提交 TikTok 视频: {} ({} 字节)", file_name, bytes.len());

        let part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("video/mp4")
            .map_err(|e| PlatformError::upload(PLATFORM, e.to_string()))?;
        let form = Form::new().part("video", part);

        let response = self
            .http
            .post(&self.upload_endpoint)
            .bearer_auth(&self.access_token)
            .multipart(form)
            .send()
            .await
            .map_err(|e| request_error(PLATFORM, "upload", self.timeout_secs, e, false))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PlatformError::upload(
                PLATFORM,
                format!("提交失败 ({}): {}", status, body),
            ));
        }

        let parsed: UploadResponse = response
            .json()
            .await
            .map_err(|e| PlatformError::upload(PLATFORM, format!("无法解析提交响应: {}", e)))?;

        parsed
            .data
            .and_then(|d| d.video_id)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| PlatformError::upload(PLATFORM, "响应中没有 video_id"))
    }

    /// 第二步：带文案发布
    async fn publish(&self, video_id: &str, caption: &Caption) -> Result<(), PlatformError> {
        let body = json!({
            "video_id": video_id,
            "post_info": {
                "title": caption.as_str(),
                "privacy_level": PRIVACY_LEVEL,
            }
        });

        let response = self
            .http
            .post(&self.publish_endpoint)
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| request_error(PLATFORM, "publish", self.timeout_secs, e, false))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(PlatformError::upload(
                PLATFORM,
                format!("发布失败 ({}): {}", status, body),
            ))
        }
    }
}

#[async_trait]
impl PlatformAdapter for TikTokClient {
    fn platform(&self) -> Platform {
        PLATFORM
    }

    async fn authenticate(&mut self) -> Result<SessionSource, PlatformError> {
        if self.access_token.trim().is_empty() {
            return Err(PlatformError::auth(PLATFORM, "ACCESS_TOKEN 未配置"));
        }
        self.authenticated = true;
        Ok(SessionSource::StaticToken)
    }

    async fn upload(&self, file: &Path, caption: &Caption) -> Result<(), PlatformError> {
        if !self.authenticated {
            return Err(PlatformError::NotAuthenticated { platform: PLATFORM });
        }

        let video_id = self.submit(file).await?;
        debug!("TikTok video_id: {}", video_id);
        self.publish(&video_id, caption).await?;

        info!(
            "✅ TikTok 上传成功: {}",
            file.file_name().unwrap_or_default().to_string_lossy()
        );
        Ok(())
    }
}
