//! 文案选择服务 - 业务能力层

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::models::{Caption, CaptionPool};

/// 文案选择器
///
/// 从预加载的文案池中均匀随机选取，文案池保证非空，因此 `select` 不会失败
#[derive(Debug)]
pub struct CaptionSelector {
    pool: CaptionPool,
    rng: StdRng,
}

impl CaptionSelector {
    pub fn new(pool: CaptionPool) -> Self {
        Self {
            pool,
            rng: StdRng::from_entropy(),
        }
    }

    /// 使用固定种子创建（测试用）
    pub fn with_seed(pool: CaptionPool, seed: u64) -> Self {
        Self {
            pool,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// 为一个片段选取文案
    pub fn select(&mut self) -> Caption {
        self.pool
            .as_slice()
            .choose(&mut self.rng)
            .cloned()
            .unwrap_or_else(|| Caption::new(crate::models::FALLBACK_CAPTION))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FALLBACK_CAPTION;
    use std::collections::HashSet;

    #[test]
    fn test_fallback_pool_always_returns_fallback() {
        let mut selector = CaptionSelector::new(CaptionPool::from_lines(""));
        for _ in 0..50 {
            assert_eq!(selector.select().as_str(), FALLBACK_CAPTION);
        }
    }

    #[test]
    fn test_selection_covers_pool() {
        let pool = CaptionPool::from_lines("a\nb\nc\n");
        let mut selector = CaptionSelector::with_seed(pool, 3);

        let seen: HashSet<String> = (0..200)
            .map(|_| selector.select().as_str().to_string())
            .collect();
        assert_eq!(seen.len(), 3);
    }
}
