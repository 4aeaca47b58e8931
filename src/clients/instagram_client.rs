/// Instagram 客户端
///
/// 用户名/密码登录，会话缓存在 `SessionStore` 中。
/// 认证时优先恢复缓存并向平台验证；缓存缺失、损坏或被拒绝时回退到完整登录，
/// 登录成功后覆盖缓存。上传以 Reels 形式发布。
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::Path;
use tracing::{debug, info, warn};

use crate::clients::{request_error, PlatformAdapter, SessionSource};
use crate::error::PlatformError;
use crate::infrastructure::SessionStore;
use crate::models::{Caption, Platform};

const PLATFORM: Platform = Platform::Instagram;

/// 登录响应中携带授权信息的响应头
const AUTHORIZATION_HEADER: &str = "ig-set-authorization";

/// 缓存的 Instagram 会话
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstagramSession {
    pub user_id: String,
    pub authorization: String,
    pub created_at: DateTime<Utc>,
}

/// Instagram 客户端
pub struct InstagramClient {
    http: Client,
    base_url: String,
    username: String,
    password: String,
    store: SessionStore,
    timeout_secs: u64,
    session: Option<InstagramSession>,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    status: Option<String>,
    logged_in_user: Option<LoggedInUser>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LoggedInUser {
    pk: Value,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    status: Option<String>,
    message: Option<String>,
}

impl InstagramClient {
    /// 创建新的 Instagram 客户端
    ///
    /// # 参数
    /// - `base_url`: 私有 API 根地址
    /// - `store`: 会话缓存
    pub fn new(
        http: Client,
        base_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        store: SessionStore,
        timeout_secs: u64,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            username: username.into(),
            password: password.into(),
            store,
            timeout_secs,
            session: None,
        }
    }

    /// 当前会话（认证成功后可用）
    pub fn session(&self) -> Option<&InstagramSession> {
        self.session.as_ref()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// 尝试恢复缓存会话
    ///
    /// 缓存不可用时返回 `None`，由调用方回退到完整登录
    async fn restore(&self) -> Option<InstagramSession> {
        let cached = match self.store.load::<InstagramSession>(PLATFORM).await {
            Ok(Some(session)) => session,
            Ok(None) => return None,
            Err(e) => {
                warn!("⚠️ {}，改为重新登录", e);
                return None;
            }
        };

        match self.verify(&cached).await {
            Ok(()) => Some(cached),
            Err(e) => {
                warn!("⚠️ 缓存会话已失效 ({})，改为重新登录", e);
                None
            }
        }
    }

    /// 向平台验证会话是否仍然有效
    async fn verify(&self, session: &InstagramSession) -> Result<(), PlatformError> {
        let response = self
            .http
            .get(self.url("/api/v1/accounts/current_user/"))
            .header("Authorization", &session.authorization)
            .send()
            .await
            .map_err(|e| request_error(PLATFORM, "verify session", self.timeout_secs, e, true))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(PlatformError::auth(
                PLATFORM,
                format!("会话被拒绝 ({})", response.status()),
            ))
        }
    }

    /// 完整登录
    async fn login(&self) -> Result<InstagramSession, PlatformError> {
        if self.username.is_empty() || self.password.is_empty() {
            return Err(PlatformError::auth(PLATFORM, "IG_USERNAME 或 IG_PASSWORD 未配置"));
        }

        debug!("Instagram 登录: {}", self.username);
        let response = self
            .http
            .post(self.url("/api/v1/accounts/login/"))
            .form(&[
                ("username", self.username.as_str()),
                ("password", self.password.as_str()),
            ])
            .send()
            .await
            .map_err(|e| request_error(PLATFORM, "login", self.timeout_secs, e, true))?;

        let status = response.status();
        let authorization = response
            .headers()
            .get(AUTHORIZATION_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let body: LoginResponse = response
            .json()
            .await
            .map_err(|e| PlatformError::auth(PLATFORM, format!("无法解析登录响应: {}", e)))?;

        if !status.is_success() || body.status.as_deref() != Some("ok") {
            return Err(PlatformError::auth(
                PLATFORM,
                format!(
                    "登录失败 ({}): {}",
                    status,
                    body.message.unwrap_or_default()
                ),
            ));
        }

        let authorization = authorization
            .filter(|a| !a.is_empty())
            .ok_or_else(|| PlatformError::auth(PLATFORM, "登录响应中没有授权信息"))?;
        let user_id = body
            .logged_in_user
            .map(|u| match u.pk {
                Value::String(s) => s,
                other => other.to_string(),
            })
            .ok_or_else(|| PlatformError::auth(PLATFORM, "登录响应中没有用户信息"))?;

        Ok(InstagramSession {
            user_id,
            authorization,
            created_at: Utc::now(),
        })
    }

    /// 第一步：上传视频字节
    async fn upload_bytes(
        &self,
        session: &InstagramSession,
        upload_id: &str,
        bytes: Vec<u8>,
    ) -> Result<(), PlatformError> {
        let entity_name = format!("{}_0", upload_id);
        let params = json!({
            "upload_id": upload_id,
            "media_type": "2",
            "is_clips_video": "1",
        });

        let response = self
            .http
            .post(self.url(&format!("/rupload_igvideo/{}", entity_name)))
            .header("Authorization", &session.authorization)
            .header("X-Entity-Name", &entity_name)
            .header("X-Entity-Length", bytes.len().to_string())
            .header("Offset", "0")
            .header("X-Instagram-Rupload-Params", params.to_string())
            .header("Content-Type", "application/octet-stream")
            .body(bytes)
            .send()
            .await
            .map_err(|e| request_error(PLATFORM, "upload", self.timeout_secs, e, false))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(PlatformError::upload(
                PLATFORM,
                format!("视频上传失败 ({}): {}", status, body),
            ))
        }
    }

    /// 第二步：带文案发布为 Reels
    async fn configure(
        &self,
        session: &InstagramSession,
        upload_id: &str,
        caption: &Caption,
    ) -> Result<(), PlatformError> {
        let response = self
            .http
            .post(self.url("/api/v1/media/configure_to_clips/"))
            .header("Authorization", &session.authorization)
            .form(&[
                ("upload_id", upload_id),
                ("caption", caption.as_str()),
                ("clips_share_preview_to_feed", "1"),
            ])
            .send()
            .await
            .map_err(|e| request_error(PLATFORM, "publish", self.timeout_secs, e, false))?;

        let status = response.status();
        let body: StatusResponse = response
            .json()
            .await
            .map_err(|e| PlatformError::upload(PLATFORM, format!("无法解析发布响应: {}", e)))?;

        if status.is_success() && body.status.as_deref() == Some("ok") {
            Ok(())
        } else {
            Err(PlatformError::upload(
                PLATFORM,
                format!("发布失败 ({}): {}", status, body.message.unwrap_or_default()),
            ))
        }
    }
}

#[async_trait]
impl PlatformAdapter for InstagramClient {
    fn platform(&self) -> Platform {
        PLATFORM
    }

    async fn authenticate(&mut self) -> Result<SessionSource, PlatformError> {
        if let Some(session) = self.restore().await {
            info!("✅ Instagram 会话已从缓存恢复");
            self.session = Some(session);
            return Ok(SessionSource::Restored);
        }

        let session = self.login().await?;
        info!("✅ Instagram 登录成功 (user {})", session.user_id);

        // 缓存写入失败不影响本次运行
        if let Err(e) = self.store.save(PLATFORM, &session).await {
            warn!("⚠️ {}", e);
        }
        self.session = Some(session);
        Ok(SessionSource::FreshLogin)
    }

    async fn upload(&self, file: &Path, caption: &Caption) -> Result<(), PlatformError> {
        let session = self
            .session
            .as_ref()
            .ok_or(PlatformError::NotAuthenticated { platform: PLATFORM })?;

        let bytes = tokio::fs::read(file).await.map_err(|e| {
            PlatformError::upload(PLATFORM, format!("无法读取 {}: {}", file.display(), e))
        })?;
        let upload_id = Utc::now().timestamp_millis().to_string();

        self.upload_bytes(session, &upload_id, bytes).await?;
        self.configure(session, &upload_id, caption).await?;

        info!(
            "✅ Instagram 上传成功: {}",
            file.file_name().unwrap_or_default().to_string_lossy()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use tempfile::{tempdir, TempDir};

    fn client(server: &Server, session_dir: &Path) -> InstagramClient {
        InstagramClient::new(
            Client::new(),
            server.url(),
            "marimba",
            "secret",
            SessionStore::new(session_dir),
            30,
        )
    }

    async fn mock_login(server: &mut Server, hits: usize) -> mockito::Mock {
        server
            .mock("POST", "/api/v1/accounts/login/")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("username".into(), "marimba".into()),
                Matcher::UrlEncoded("password".into(), "secret".into()),
            ]))
            .with_status(200)
            .with_header(AUTHORIZATION_HEADER, "Bearer IGT:2:fresh")
            .with_body(r#"{"status":"ok","logged_in_user":{"pk":4242,"username":"marimba"}}"#)
            .expect(hits)
            .create_async()
            .await
    }

    async fn cached_session(dir: &TempDir, authorization: &str) {
        let session = InstagramSession {
            user_id: "4242".to_string(),
            authorization: authorization.to_string(),
            created_at: Utc::now(),
        };
        SessionStore::new(dir.path())
            .save(PLATFORM, &session)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_corrupt_cache_falls_back_to_login_then_restores() {
        let mut server = Server::new_async().await;
        let login = mock_login(&mut server, 1).await;
        let verify = server
            .mock("GET", "/api/v1/accounts/current_user/")
            .match_header("authorization", "Bearer IGT:2:fresh")
            .with_status(200)
            .with_body(r#"{"status":"ok"}"#)
            .expect(1)
            .create_async()
            .await;

        let dir = tempdir().unwrap();
        let cache = SessionStore::new(dir.path()).path_for(PLATFORM);
        std::fs::write(&cache, "{ definitely not json").unwrap();

        let mut first = client(&server, dir.path());
        assert_eq!(first.authenticate().await.unwrap(), SessionSource::FreshLogin);

        let saved: InstagramSession =
            serde_json::from_str(&std::fs::read_to_string(&cache).unwrap()).unwrap();
        assert_eq!(saved.user_id, "4242");
        assert_eq!(saved.authorization, "Bearer IGT:2:fresh");

        // 第二次运行直接恢复缓存，不再登录
        let mut second = client(&server, dir.path());
        assert_eq!(second.authenticate().await.unwrap(), SessionSource::Restored);
        assert_eq!(second.session(), Some(&saved));

        login.assert_async().await;
        verify.assert_async().await;
    }

    #[tokio::test]
    async fn test_rejected_cache_triggers_login() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/api/v1/accounts/current_user/")
            .with_status(401)
            .with_body(r#"{"message":"login_required"}"#)
            .create_async()
            .await;
        let login = mock_login(&mut server, 1).await;

        let dir = tempdir().unwrap();
        cached_session(&dir, "Bearer IGT:2:stale").await;

        let mut instagram = client(&server, dir.path());
        assert_eq!(
            instagram.authenticate().await.unwrap(),
            SessionSource::FreshLogin
        );
        assert_eq!(
            instagram.session().unwrap().authorization,
            "Bearer IGT:2:fresh"
        );
        login.assert_async().await;
    }

    #[tokio::test]
    async fn test_login_failure_is_authentication_error() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/api/v1/accounts/login/")
            .with_status(400)
            .with_body(r#"{"status":"fail","message":"bad_password"}"#)
            .create_async()
            .await;

        let dir = tempdir().unwrap();
        let mut instagram = client(&server, dir.path());
        let err = instagram.authenticate().await.unwrap_err();

        assert!(matches!(err, PlatformError::Authentication { .. }));
        assert!(err.to_string().contains("bad_password"));
        assert!(!SessionStore::new(dir.path()).path_for(PLATFORM).exists());
    }

    #[tokio::test]
    async fn test_missing_credentials_fail_without_request() {
        let mut server = Server::new_async().await;
        let login = server
            .mock("POST", "/api/v1/accounts/login/")
            .expect(0)
            .create_async()
            .await;

        let dir = tempdir().unwrap();
        let mut instagram = InstagramClient::new(
            Client::new(),
            server.url(),
            "",
            "",
            SessionStore::new(dir.path()),
            30,
        );
        assert!(instagram.authenticate().await.is_err());
        login.assert_async().await;
    }

    #[tokio::test]
    async fn test_upload_then_configure() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/api/v1/accounts/current_user/")
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;
        let rupload = server
            .mock("POST", Matcher::Regex(r"^/rupload_igvideo/\d+_0$".to_string()))
            .match_header("authorization", "Bearer IGT:2:cached")
            .match_body("reel bytes")
            .with_status(200)
            .with_body(r#"{"status":"ok"}"#)
            .expect(1)
            .create_async()
            .await;
        let configure = server
            .mock("POST", "/api/v1/media/configure_to_clips/")
            .match_body(Matcher::UrlEncoded("caption".into(), "Marimba!".into()))
            .with_status(200)
            .with_body(r#"{"status":"ok"}"#)
            .expect(1)
            .create_async()
            .await;

        let dir = tempdir().unwrap();
        cached_session(&dir, "Bearer IGT:2:cached").await;
        let file = dir.path().join("a.mp4");
        std::fs::write(&file, b"reel bytes").unwrap();

        let mut instagram = client(&server, dir.path());
        instagram.authenticate().await.unwrap();
        instagram
            .upload(&file, &Caption::new("Marimba!"))
            .await
            .unwrap();

        rupload.assert_async().await;
        configure.assert_async().await;
    }

    #[tokio::test]
    async fn test_configure_rejection_is_upload_error() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/api/v1/accounts/current_user/")
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;
        server
            .mock("POST", Matcher::Regex(r"^/rupload_igvideo/".to_string()))
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;
        server
            .mock("POST", "/api/v1/media/configure_to_clips/")
            .with_status(200)
            .with_body(r#"{"status":"fail","message":"transcode not finished"}"#)
            .create_async()
            .await;

        let dir = tempdir().unwrap();
        cached_session(&dir, "Bearer IGT:2:cached").await;
        let file = dir.path().join("a.mp4");
        std::fs::write(&file, b"reel bytes").unwrap();

        let mut instagram = client(&server, dir.path());
        instagram.authenticate().await.unwrap();
        let err = instagram
            .upload(&file, &Caption::new("x"))
            .await
            .unwrap_err();
        assert!(matches!(err, PlatformError::Upload { .. }));
    }

    #[tokio::test]
    async fn test_upload_without_session_is_rejected() {
        let server = Server::new_async().await;
        let dir = tempdir().unwrap();
        let instagram = client(&server, dir.path());

        let err = instagram
            .upload(Path::new("a.mp4"), &Caption::new("x"))
            .await
            .unwrap_err();
        assert!(matches!(err, PlatformError::NotAuthenticated { .. }));
    }
}
