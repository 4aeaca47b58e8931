use crate::error::ConfigError;
use crate::models::Clip;
use std::path::Path;
use tokio::fs;
use tracing::debug;

/// 扫描暂存目录，返回扩展名在白名单内的片段快照
///
/// 结果按文件名排序；子目录和不支持的文件会被忽略。
/// 暂存目录不存在或无法读取属于配置错误。
pub async fn scan_staging(staging_dir: &Path) -> Result<Vec<Clip>, ConfigError> {
    if !fs::try_exists(staging_dir).await.unwrap_or(false) {
        return Err(ConfigError::DirectoryNotFound {
            path: staging_dir.to_path_buf(),
        });
    }

    let mut entries = fs::read_dir(staging_dir)
        .await
        .map_err(|source| ConfigError::FileReadFailed {
            path: staging_dir.to_path_buf(),
            source,
        })?;

    let mut clips = Vec::new();
    loop {
        let entry = match entries.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(source) => {
                return Err(ConfigError::FileReadFailed {
                    path: staging_dir.to_path_buf(),
                    source,
                })
            }
        };

        let is_file = entry
            .file_type()
            .await
            .map(|t| t.is_file())
            .unwrap_or(false);
        if !is_file {
            continue;
        }

        match Clip::from_path(entry.path()) {
            Some(clip) => clips.push(clip),
            None => debug!("忽略不支持的文件: {}", entry.path().display()),
        }
    }

    clips.sort_by(|a, b| a.display_name.cmp(&b.display_name));
    Ok(clips)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ClipFormat;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_scan_filters_and_sorts() {
        let dir = tempdir().unwrap();
        for name in ["b.webm", "a.mp4", "notes.txt", "C.MOV"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        std::fs::create_dir(dir.path().join("nested.mp4")).unwrap();

        let clips = scan_staging(dir.path()).await.unwrap();
        let names: Vec<&str> = clips.iter().map(|c| c.display_name.as_str()).collect();
        assert_eq!(names, vec!["C.MOV", "a.mp4", "b.webm"]);
        assert_eq!(clips[2].format, ClipFormat::Webm);
    }

    #[tokio::test]
    async fn test_missing_staging_is_config_error() {
        let dir = tempdir().unwrap();
        let err = scan_staging(&dir.path().join("absent")).await.unwrap_err();
        assert!(matches!(err, ConfigError::DirectoryNotFound { .. }));
    }
}
