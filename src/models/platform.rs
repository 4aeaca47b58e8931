use std::fmt;

/// 平台枚举
///
/// 封闭的平台集合，新增平台即新增一个变体
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// TikTok（静态 Bearer Token）
    TikTok,
    /// Instagram Reels（可恢复的 Cookie 会话）
    Instagram,
}

impl Platform {
    /// 所有平台，按派发顺序排列
    pub const ALL: [Platform; 2] = [Platform::TikTok, Platform::Instagram];

    /// 获取显示名称
    pub fn name(self) -> &'static str {
        match self {
            Platform::TikTok => "TikTok",
            Platform::Instagram => "Instagram",
        }
    }

    /// 会话缓存使用的键
    pub fn key(self) -> &'static str {
        match self {
            Platform::TikTok => "tiktok",
            Platform::Instagram => "instagram",
        }
    }

    /// 从字符串解析平台（不区分大小写）
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tiktok" | "tt" => Some(Platform::TikTok),
            "instagram" | "ig" => Some(Platform::Instagram),
            _ => None,
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
