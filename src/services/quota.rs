//! 配额服务 - 业务能力层
//!
//! 只负责"这个平台还能不能传"，不关心流程

use std::collections::HashMap;

use crate::models::Platform;

/// 配额配置
///
/// 未配置上限的平台不受限制
#[derive(Debug, Clone, Default)]
pub struct QuotaConfig {
    limits: HashMap<Platform, u32>,
}

impl QuotaConfig {
    /// 设置平台的每日上限
    pub fn with_limit(mut self, platform: Platform, max: u32) -> Self {
        self.limits.insert(platform, max);
        self
    }

    pub fn limit(&self, platform: Platform) -> Option<u32> {
        self.limits.get(&platform).copied()
    }
}

/// 配额控制器
///
/// 计数只在本次运行内有效；计数永远不会超过上限
#[derive(Debug)]
pub struct QuotaController {
    config: QuotaConfig,
    counts: HashMap<Platform, u32>,
}

impl QuotaController {
    pub fn new(config: QuotaConfig) -> Self {
        Self {
            config,
            counts: HashMap::new(),
        }
    }

    /// 当前计数 < 上限时返回 true
    pub fn can_attempt(&self, platform: Platform) -> bool {
        match self.config.limit(platform) {
            Some(max) => self.count(platform) < max,
            None => true,
        }
    }

    /// 记录一次已派发的上传
    ///
    /// 只应在 `can_attempt` 为 true 时调用；已到上限时不再增长
    pub fn record_attempt(&mut self, platform: Platform) {
        if !self.can_attempt(platform) {
            return;
        }
        *self.counts.entry(platform).or_insert(0) += 1;
    }

    /// 本次运行已派发的次数
    pub fn count(&self, platform: Platform) -> u32 {
        self.counts.get(&platform).copied().unwrap_or(0)
    }

    pub fn limit(&self, platform: Platform) -> Option<u32> {
        self.config.limit(platform)
    }
}
