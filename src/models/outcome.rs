use std::collections::BTreeMap;
use std::time::Duration;

use crate::models::Platform;

/// 单次（片段, 平台）上传尝试的结果
///
/// 不会持久化，仅用于决定片段的最终日志和成功平台集合
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOutcome {
    pub platform: Platform,
    pub succeeded: bool,
    pub error_detail: Option<String>,
}

impl UploadOutcome {
    pub fn success(platform: Platform) -> Self {
        Self {
            platform,
            succeeded: true,
            error_detail: None,
        }
    }

    pub fn failure(platform: Platform, detail: impl Into<String>) -> Self {
        Self {
            platform,
            succeeded: false,
            error_detail: Some(detail.into()),
        }
    }
}

/// 平台被跳过的原因（未派发，不消耗配额）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// 今日配额已用完
    QuotaExhausted,
    /// 认证失败，本次运行不再尝试
    Unusable,
}

/// 片段在状态机中的阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipStage {
    Pending,
    Normalizing,
    Dispatching,
    Finalizing,
    Done,
}

/// 片段的最终处置
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClipDisposition {
    /// 至少一个平台上传成功
    Uploaded(Vec<Platform>),
    /// 所有平台都失败（或没有任何平台被派发）
    Failed,
    /// 转码失败，未做任何上传尝试
    TranscodeFailed(String),
}

impl ClipDisposition {
    pub fn is_success(&self) -> bool {
        matches!(self, ClipDisposition::Uploaded(_))
    }
}

/// 单个片段的处理报告
#[derive(Debug, Clone)]
pub struct ClipReport {
    pub display_name: String,
    pub disposition: ClipDisposition,
    pub outcomes: Vec<UploadOutcome>,
    pub skipped: Vec<(Platform, SkipReason)>,
    /// 依次经过的阶段
    pub stages: Vec<ClipStage>,
}

impl ClipReport {
    /// 成功的平台列表
    pub fn succeeded_platforms(&self) -> Vec<Platform> {
        self.outcomes
            .iter()
            .filter(|o| o.succeeded)
            .map(|o| o.platform)
            .collect()
    }
}

/// 单平台统计
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PlatformStats {
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
}

/// 整次运行的统计
#[derive(Debug, Default, Clone)]
pub struct RunStats {
    /// 扫描到的片段总数
    pub scanned: usize,
    /// 因已在已处理目录而跳过的数量
    pub already_processed: usize,
    /// 至少一个平台成功
    pub uploaded: usize,
    /// 全部平台失败
    pub failed: usize,
    /// 转码失败
    pub transcode_failed: usize,
    pub per_platform: BTreeMap<Platform, PlatformStats>,
    /// 实际等待过的间隔
    pub delays: Vec<Duration>,
    pub reports: Vec<ClipReport>,
}

impl RunStats {
    /// 本次运行完成处置的片段数
    pub fn processed(&self) -> usize {
        self.uploaded + self.failed + self.transcode_failed
    }

    /// 汇总一个片段的报告
    pub fn record(&mut self, report: ClipReport) {
        match &report.disposition {
            ClipDisposition::Uploaded(_) => self.uploaded += 1,
            ClipDisposition::Failed => self.failed += 1,
            ClipDisposition::TranscodeFailed(_) => self.transcode_failed += 1,
        }

        for outcome in &report.outcomes {
            let entry = self.per_platform.entry(outcome.platform).or_default();
            if outcome.succeeded {
                entry.succeeded += 1;
            } else {
                entry.failed += 1;
            }
        }
        for (platform, _) in &report.skipped {
            self.per_platform.entry(*platform).or_default().skipped += 1;
        }

        self.reports.push(report);
    }
}
