//! 会话存储 - 基础设施层
//!
//! 按平台持久化已认证会话，让后续运行免于重新登录。
//! 只有会话可恢复的平台适配器会使用它。

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

use crate::error::SessionError;
use crate::models::Platform;

/// 基于文件的会话存储
///
/// 每个平台一个 JSON 文件：`<dir>/<platform>_session.json`
#[derive(Debug, Clone)]
pub struct SessionStore {
    dir: PathBuf,
}

impl SessionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// 平台会话文件路径
    pub fn path_for(&self, platform: Platform) -> PathBuf {
        self.dir.join(format!("{}_session.json", platform.key()))
    }

    /// 读取缓存的会话
    ///
    /// # 返回
    /// - `Ok(None)`: 没有缓存
    /// - `Ok(Some(_))`: 缓存可用
    /// - `Err(_)`: 缓存损坏或无法读取（调用方应回退到完整登录）
    pub async fn load<S: DeserializeOwned>(
        &self,
        platform: Platform,
    ) -> Result<Option<S>, SessionError> {
        let path = self.path_for(platform);
        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("{} 没有会话缓存: {}", platform, path.display());
                return Ok(None);
            }
            Err(source) => return Err(SessionError::ReadFailed { path, source }),
        };

        let session = serde_json::from_str(&content)
            .map_err(|source| SessionError::Corrupt { path, source })?;
        Ok(Some(session))
    }

    /// 保存会话，覆盖已有缓存
    ///
    /// 先写临时文件再重命名，避免中断时留下半截 JSON
    pub async fn save<S: Serialize>(
        &self,
        platform: Platform,
        session: &S,
    ) -> Result<(), SessionError> {
        let path = self.path_for(platform);
        let json = serde_json::to_string_pretty(session).map_err(SessionError::Serialize)?;

        fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| SessionError::WriteFailed {
                path: self.dir.clone(),
                source,
            })?;

        let tmp_path = path.with_extension("json.tmp");
        write_then_rename(&tmp_path, &path, json.as_bytes())
            .await
            .map_err(|source| SessionError::WriteFailed { path, source })?;

        debug!("{} 会话已缓存", platform);
        Ok(())
    }
}

async fn write_then_rename(tmp_path: &Path, path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    fs::write(tmp_path, bytes).await?;
    fs::rename(tmp_path, path).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::tempdir;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct FakeSession {
        token: String,
    }

    #[tokio::test]
    async fn test_missing_cache_is_none() {
        let dir = tempdir().unwrap();
        let store = SessionStore::new(dir.path());
        let loaded: Option<FakeSession> = store.load(Platform::Instagram).await.unwrap();
        assert!(loaded.is_none());
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = tempdir().unwrap();
        let store = SessionStore::new(dir.path());
        let session = FakeSession {
            token: "abc".to_string(),
        };

        store.save(Platform::Instagram, &session).await.unwrap();
        assert!(dir.path().join("instagram_session.json").exists());

        let loaded: Option<FakeSession> = store.load(Platform::Instagram).await.unwrap();
        assert_eq!(loaded, Some(session));
    }

    #[tokio::test]
    async fn test_corrupt_cache_is_error() {
        let dir = tempdir().unwrap();
        let store = SessionStore::new(dir.path());
        std::fs::write(store.path_for(Platform::Instagram), "{not json").unwrap();

        let result: Result<Option<FakeSession>, _> = store.load(Platform::Instagram).await;
        assert!(matches!(result, Err(SessionError::Corrupt { .. })));
    }
}
