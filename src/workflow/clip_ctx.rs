//! 片段处理上下文
//!
//! 封装"我正在处理第几个片段"这一信息，只用于日志

use std::fmt::Display;

/// 片段处理上下文
#[derive(Debug, Clone)]
pub struct ClipCtx {
    /// 片段在本次待处理快照中的序号（从1开始）
    pub index: usize,

    /// 待处理片段总数
    pub total: usize,

    /// 片段文件名
    pub display_name: String,
}

impl ClipCtx {
    pub fn new(index: usize, total: usize, display_name: impl Into<String>) -> Self {
        Self {
            index,
            total,
            display_name: display_name.into(),
        }
    }
}

impl Display for ClipCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[片段 {}/{} {}]", self.index, self.total, self.display_name)
    }
}
