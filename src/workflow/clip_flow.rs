//! 片段处理流程 - 流程层
//!
//! 核心职责：定义"一个片段"的完整生命周期
//!
//! 状态顺序：
//! 1. Pending
//! 2. Normalizing（仅当格式需要转码）
//! 3. Dispatching（转码失败时跳过）
//! 4. Finalizing：汇总结果 → 释放临时文件 → 写台账
//! 5. Done
//!
//! Finalizing 是唯一出口，成功和失败都会走到这里。

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::LedgerError;
use crate::infrastructure::LedgerStore;
use crate::models::{Clip, ClipDisposition, ClipReport, ClipStage, Platform};
use crate::services::{CaptionSelector, FormatNormalizer, NormalizedClip};
use crate::utils::logging::truncate_text;
use crate::workflow::{ClipCtx, DispatchResult, PlatformDispatcher};

/// 片段处理流程
///
/// - 持有派发器、文案选择器和台账
/// - 一次只处理一个片段
pub struct ClipFlow {
    normalizer: FormatNormalizer,
    captions: CaptionSelector,
    dispatcher: PlatformDispatcher,
    ledger: Arc<dyn LedgerStore>,
}

impl ClipFlow {
    pub fn new(
        normalizer: FormatNormalizer,
        captions: CaptionSelector,
        dispatcher: PlatformDispatcher,
        ledger: Arc<dyn LedgerStore>,
    ) -> Self {
        Self {
            normalizer,
            captions,
            dispatcher,
            ledger,
        }
    }

    pub fn ledger(&self) -> &dyn LedgerStore {
        self.ledger.as_ref()
    }

    pub fn dispatcher(&self) -> &PlatformDispatcher {
        &self.dispatcher
    }

    /// 处理单个片段
    ///
    /// # 返回
    /// - `Ok(report)`: 片段已写入台账
    /// - `Err(_)`: 台账写入失败，调用方应终止整个运行
    pub async fn run(&mut self, clip: &Clip, ctx: &ClipCtx) -> Result<ClipReport, LedgerError> {
        let mut stages = vec![ClipStage::Pending];
        info!("{} 🎬 开始处理", ctx);

        // ========== Normalizing ==========
        let normalized = if clip.format.needs_normalization() {
            stages.push(ClipStage::Normalizing);
            info!("{} 🔄 格式 {} 需要转码", ctx, clip.format.extension());
            self.normalizer.normalize(clip).await
        } else {
            Ok(NormalizedClip::Original(clip.source_path.clone()))
        };

        // ========== Dispatching ==========
        let (dispatch, normalized, transcode_error) = match normalized {
            Ok(normalized) => {
                stages.push(ClipStage::Dispatching);
                let caption = self.captions.select();
                debug!("{} 文案: {}", ctx, truncate_text(caption.as_str(), 40));
                let result = self
                    .dispatcher
                    .dispatch(normalized.path(), &caption, ctx)
                    .await;
                (result, Some(normalized), None)
            }
            Err(e) => (DispatchResult::default(), None, Some(e.to_string())),
        };

        // ========== Finalizing ==========
        stages.push(ClipStage::Finalizing);
        let succeeded: Vec<Platform> = dispatch
            .outcomes
            .iter()
            .filter(|o| o.succeeded)
            .map(|o| o.platform)
            .collect();

        let disposition = match transcode_error {
            Some(detail) => ClipDisposition::TranscodeFailed(detail),
            None if succeeded.is_empty() => ClipDisposition::Failed,
            None => ClipDisposition::Uploaded(succeeded),
        };
        log_outcome(ctx, &disposition);

        if let Some(normalized) = normalized {
            normalized.release();
        }

        self.ledger
            .mark_processed(&clip.source_path, &clip.display_name)
            .await?;
        stages.push(ClipStage::Done);

        Ok(ClipReport {
            display_name: clip.display_name.clone(),
            disposition,
            outcomes: dispatch.outcomes,
            skipped: dispatch.skipped,
            stages,
        })
    }
}

/// 每个片段一行汇总
fn log_outcome(ctx: &ClipCtx, disposition: &ClipDisposition) {
    match disposition {
        ClipDisposition::Uploaded(platforms) => {
            let names: Vec<&str> = platforms.iter().map(|p| p.name()).collect();
            info!("{} ✅ 上传完成: {}", ctx, names.join(", "));
        }
        ClipDisposition::Failed => {
            warn!("{} ⚠️ 没有任何平台上传成功，仍记为已处理", ctx);
        }
        ClipDisposition::TranscodeFailed(detail) => {
            warn!("{} ❌ 转码失败，跳过全部上传: {}", ctx, detail);
        }
    }
}
