use std::path::{Path, PathBuf};

/// 片段格式
///
/// 由扩展名推断，决定是否需要转码
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClipFormat {
    Mp4,
    Mov,
    Webm,
    Mkv,
}

impl ClipFormat {
    /// 从扩展名解析格式（不区分大小写），不在白名单内返回 None
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "mp4" => Some(ClipFormat::Mp4),
            "mov" => Some(ClipFormat::Mov),
            "webm" => Some(ClipFormat::Webm),
            "mkv" => Some(ClipFormat::Mkv),
            _ => None,
        }
    }

    /// 从路径解析格式
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    /// 平台是否直接接受该格式
    pub fn is_platform_accepted(self) -> bool {
        matches!(self, ClipFormat::Mp4 | ClipFormat::Mov)
    }

    /// 是否需要先转码
    pub fn needs_normalization(self) -> bool {
        !self.is_platform_accepted()
    }

    pub fn extension(self) -> &'static str {
        match self {
            ClipFormat::Mp4 => "mp4",
            ClipFormat::Mov => "mov",
            ClipFormat::Webm => "webm",
            ClipFormat::Mkv => "mkv",
        }
    }
}

/// 待处理片段
///
/// 只存在于单次运行中，在运行开始时由目录扫描发现
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clip {
    /// 暂存目录中的位置
    pub source_path: PathBuf,
    /// 文件名（用于日志和台账匹配）
    pub display_name: String,
    /// 文件格式
    pub format: ClipFormat,
}

impl Clip {
    /// 从路径创建片段，扩展名不在白名单内时返回 None
    pub fn from_path(path: impl Into<PathBuf>) -> Option<Self> {
        let source_path = path.into();
        let format = ClipFormat::from_path(&source_path)?;
        let display_name = source_path.file_name()?.to_str()?.to_string();
        Some(Self {
            source_path,
            display_name,
            format,
        })
    }

    /// 不含扩展名的文件名
    pub fn stem(&self) -> &str {
        self.source_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(&self.display_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_extension_is_case_insensitive() {
        assert_eq!(ClipFormat::from_extension("MP4"), Some(ClipFormat::Mp4));
        assert_eq!(ClipFormat::from_extension("WebM"), Some(ClipFormat::Webm));
        assert_eq!(ClipFormat::from_extension("avi"), None);
    }

    #[test]
    fn test_only_webm_and_mkv_need_normalization() {
        assert!(!ClipFormat::Mp4.needs_normalization());
        assert!(!ClipFormat::Mov.needs_normalization());
        assert!(ClipFormat::Webm.needs_normalization());
        assert!(ClipFormat::Mkv.needs_normalization());
    }

    #[test]
    fn test_clip_from_path() {
        let clip = Clip::from_path("/staging/b.webm").unwrap();
        assert_eq!(clip.display_name, "b.webm");
        assert_eq!(clip.stem(), "b");
        assert_eq!(clip.format, ClipFormat::Webm);

        assert!(Clip::from_path("/staging/notes.txt").is_none());
    }
}
