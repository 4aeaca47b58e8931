use std::fmt;

/// 文案来源为空或缺失时使用的兜底文案
pub const FALLBACK_CAPTION: &str = "Uploaded via API";

/// 单条文案，加载后不可变
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Caption(String);

impl Caption {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Caption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 文案池
///
/// 构造后保证非空
#[derive(Debug, Clone)]
pub struct CaptionPool {
    captions: Vec<Caption>,
}

impl CaptionPool {
    /// 从按行组织的文本构建文案池，空白行被忽略
    ///
    /// 没有任何有效行时退化为单条兜底文案
    pub fn from_lines(text: &str) -> Self {
        let captions: Vec<Caption> = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(Caption::new)
            .collect();

        if captions.is_empty() {
            Self::fallback()
        } else {
            Self { captions }
        }
    }

    /// 只包含兜底文案的文案池
    pub fn fallback() -> Self {
        Self {
            captions: vec![Caption::new(FALLBACK_CAPTION)],
        }
    }

    /// 是否退化为兜底文案
    pub fn is_fallback(&self) -> bool {
        self.captions.len() == 1 && self.captions[0].as_str() == FALLBACK_CAPTION
    }

    pub fn len(&self) -> usize {
        self.captions.len()
    }

    pub fn as_slice(&self) -> &[Caption] {
        &self.captions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_lines_are_ignored() {
        let pool = CaptionPool::from_lines("first\n\n   \n second \r\nthird\n");
        let texts: Vec<&str> = pool.as_slice().iter().map(Caption::as_str).collect();
        assert_eq!(texts, vec!["first", "second", "third"]);
        assert!(!pool.is_fallback());
    }

    #[test]
    fn test_empty_source_falls_back() {
        let pool = CaptionPool::from_lines("\n \n");
        assert_eq!(pool.len(), 1);
        assert!(pool.is_fallback());
        assert_eq!(pool.as_slice()[0].as_str(), FALLBACK_CAPTION);
    }
}
