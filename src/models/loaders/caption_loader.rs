use crate::models::CaptionPool;
use std::path::Path;
use tokio::fs;
use tracing::{info, warn};

/// 从文案文件加载文案池
///
/// 每行一条文案，空白行忽略。文件缺失、无法读取或没有有效行时
/// 使用兜底文案，因此本函数不会失败。
pub async fn load_captions(captions_file: &Path) -> CaptionPool {
    let content = match fs::read_to_string(captions_file).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!(
                "⚠️ 未找到文案文件 {}，使用默认文案",
                captions_file.display()
            );
            return CaptionPool::fallback();
        }
        Err(e) => {
            warn!(
                "⚠️ 无法读取文案文件 {}: {}，使用默认文案",
                captions_file.display(),
                e
            );
            return CaptionPool::fallback();
        }
    };

    let pool = CaptionPool::from_lines(&content);
    if pool.is_fallback() {
        warn!("⚠️ 文案文件 {} 为空，使用默认文案", captions_file.display());
    } else {
        info!("📝 已加载 {} 条文案", pool.len());
    }
    pool
}
