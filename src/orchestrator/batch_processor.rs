//! 批量片段处理器 - 编排层
//!
//! ## 核心功能
//!
//! 1. **待处理快照**：运行开始时用台账过滤一次，之后不再重新扫描
//! 2. **顺序处理**：逐个交给 `ClipFlow`
//! 3. **节奏控制**：片段之间等待随机时长
//! 4. **全局统计**：汇总每个片段的报告
//!
//! 台账写入失败意味着无法保证不重复上传，此时立即终止运行。

use tracing::info;

use crate::error::AppResult;
use crate::models::{Clip, RunStats};
use crate::services::PacingPolicy;
use crate::workflow::{ClipCtx, ClipFlow};

/// 批量片段处理器
pub struct Orchestrator {
    flow: ClipFlow,
    pacing: PacingPolicy,
}

impl Orchestrator {
    pub fn new(flow: ClipFlow, pacing: PacingPolicy) -> Self {
        Self { flow, pacing }
    }

    pub fn flow(&self) -> &ClipFlow {
        &self.flow
    }

    /// 处理扫描到的全部片段
    ///
    /// # 参数
    /// - `clips`: 暂存目录的扫描结果
    ///
    /// # 返回
    /// 返回本次运行的统计；台账写入失败时返回错误
    pub async fn run(&mut self, clips: Vec<Clip>) -> AppResult<RunStats> {
        let mut stats = RunStats {
            scanned: clips.len(),
            ..Default::default()
        };

        let pending = self.pending_snapshot(clips, &mut stats).await;
        let total = pending.len();

        for (i, clip) in pending.iter().enumerate() {
            if i > 0 {
                let delay = self.pacing.next_delay();
                info!("⏳ 等待 {:.1}s 后处理下一个片段...", delay.as_secs_f64());
                tokio::time::sleep(delay).await;
                stats.delays.push(delay);
            }

            let ctx = ClipCtx::new(i + 1, total, clip.display_name.as_str());
            let report = self.flow.run(clip, &ctx).await?;
            stats.record(report);
        }

        Ok(stats)
    }

    /// 过滤出尚未处理的片段
    async fn pending_snapshot(&self, clips: Vec<Clip>, stats: &mut RunStats) -> Vec<Clip> {
        let ledger = self.flow.ledger();
        let mut pending = Vec::with_capacity(clips.len());
        for clip in clips {
            if ledger.is_pending(&clip.display_name).await {
                pending.push(clip);
            } else {
                info!("⏭️ {} 已处理过，跳过", clip.display_name);
                stats.already_processed += 1;
            }
        }
        pending
    }
}
