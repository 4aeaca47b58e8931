//! 节奏控制 - 业务能力层
//!
//! 两次片段处理之间插入 [min, max] 内均匀随机的等待，避免固定节奏被识别

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;

/// 随机间隔策略
///
/// 可以用固定种子构造，测试中可复现
#[derive(Debug)]
pub struct PacingPolicy {
    min: Duration,
    max: Duration,
    rng: StdRng,
}

impl PacingPolicy {
    /// 创建使用系统熵的策略
    ///
    /// `min > max` 时两者交换
    pub fn new(min: Duration, max: Duration) -> Self {
        Self::with_rng(min, max, StdRng::from_entropy())
    }

    /// 使用固定种子创建
    pub fn with_seed(min: Duration, max: Duration, seed: u64) -> Self {
        Self::with_rng(min, max, StdRng::seed_from_u64(seed))
    }

    fn with_rng(min: Duration, max: Duration, rng: StdRng) -> Self {
        let (min, max) = if min <= max { (min, max) } else { (max, min) };
        Self { min, max, rng }
    }

    /// 下一次等待时长，落在 [min, max] 内
    pub fn next_delay(&mut self) -> Duration {
        if self.min == self.max {
            return self.min;
        }
        self.rng.gen_range(self.min..=self.max)
    }

    pub fn window(&self) -> (Duration, Duration) {
        (self.min, self.max)
    }
}
