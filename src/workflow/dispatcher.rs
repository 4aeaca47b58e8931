//! 平台派发 - 流程层
//!
//! 持有全部已启用的平台适配器，负责：
//! - 配额检查（先于认证，配额用完的平台不会触发登录）
//! - 惰性认证，每个平台每次运行最多一次，结果被记住
//! - 为每个网络操作加上调用方可见的超时
//!
//! 平台之间互相独立，一个平台失败不影响其他平台。

use std::path::Path;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{error, info, warn};

use crate::clients::{PlatformAdapter, SessionSource};
use crate::error::PlatformError;
use crate::models::{Caption, Platform, SkipReason, UploadOutcome};
use crate::services::QuotaController;
use crate::workflow::ClipCtx;

/// 平台认证状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AuthState {
    NotAttempted,
    Ready,
    /// 认证失败，本次运行内不再尝试
    Unusable,
}

struct AdapterSlot {
    adapter: Box<dyn PlatformAdapter>,
    state: AuthState,
}

/// 单个片段的派发结果
#[derive(Debug, Default)]
pub struct DispatchResult {
    pub outcomes: Vec<UploadOutcome>,
    pub skipped: Vec<(Platform, SkipReason)>,
}

/// 平台派发器
pub struct PlatformDispatcher {
    slots: Vec<AdapterSlot>,
    quota: QuotaController,
    auth_timeout: Duration,
    upload_timeout: Duration,
}

impl PlatformDispatcher {
    /// # 参数
    /// - `adapters`: 已启用的平台适配器（按派发顺序）
    /// - `quota`: 配额控制器
    /// - `request_timeout`: 认证和上传的超时
    pub fn new(
        adapters: Vec<Box<dyn PlatformAdapter>>,
        quota: QuotaController,
        request_timeout: Duration,
    ) -> Self {
        Self {
            slots: adapters
                .into_iter()
                .map(|adapter| AdapterSlot {
                    adapter,
                    state: AuthState::NotAttempted,
                })
                .collect(),
            quota,
            auth_timeout: request_timeout,
            upload_timeout: request_timeout,
        }
    }

    /// 分别设置认证和上传的超时
    pub fn with_timeouts(mut self, auth_timeout: Duration, upload_timeout: Duration) -> Self {
        self.auth_timeout = auth_timeout;
        self.upload_timeout = upload_timeout;
        self
    }

    /// 已启用的平台
    pub fn platforms(&self) -> Vec<Platform> {
        self.slots.iter().map(|s| s.adapter.platform()).collect()
    }

    pub fn quota(&self) -> &QuotaController {
        &self.quota
    }

    /// 平台是否因认证失败被标记为不可用
    pub fn is_unusable(&self, platform: Platform) -> bool {
        self.slots
            .iter()
            .any(|s| s.adapter.platform() == platform && s.state == AuthState::Unusable)
    }

    /// 把一个文件派发到所有可用平台
    ///
    /// 依次处理每个平台，不短路：某个平台失败后继续下一个
    pub async fn dispatch(
        &mut self,
        file: &Path,
        caption: &Caption,
        ctx: &ClipCtx,
    ) -> DispatchResult {
        let mut result = DispatchResult::default();

        for slot in self.slots.iter_mut() {
            let platform = slot.adapter.platform();

            if !self.quota.can_attempt(platform) {
                info!(
                    "{} ⏭️ {} 今日配额已用完 ({}/{})，跳过",
                    ctx,
                    platform,
                    self.quota.count(platform),
                    self.quota.limit(platform).unwrap_or_default()
                );
                result.skipped.push((platform, SkipReason::QuotaExhausted));
                continue;
            }

            if !Self::ensure_authenticated(slot, self.auth_timeout).await {
                result.skipped.push((platform, SkipReason::Unusable));
                continue;
            }

            self.quota.record_attempt(platform);
            info!("{} 📤 正在上传到 {}...", ctx, platform);

            let upload = slot.adapter.upload(file, caption);
            let outcome = match timeout(self.upload_timeout, upload).await {
                Ok(Ok(())) => UploadOutcome::success(platform),
                Ok(Err(e)) => {
                    error!("{} ❌ {}", ctx, e);
                    UploadOutcome::failure(platform, e.to_string())
                }
                Err(_) => {
                    let e = PlatformError::Timeout {
                        platform,
                        operation: "upload",
                        timeout_secs: self.upload_timeout.as_secs(),
                    };
                    error!("{} ❌ {}", ctx, e);
                    UploadOutcome::failure(platform, e.to_string())
                }
            };
            result.outcomes.push(outcome);
        }

        result
    }

    /// 确保平台已认证
    ///
    /// 只在第一次需要时认证；失败（包括超时）后平台在本次运行内不可用
    async fn ensure_authenticated(slot: &mut AdapterSlot, auth_timeout: Duration) -> bool {
        match slot.state {
            AuthState::Ready => return true,
            AuthState::Unusable => return false,
            AuthState::NotAttempted => {}
        }

        let platform = slot.adapter.platform();
        info!("🔐 正在认证 {}...", platform);

        let result = match timeout(auth_timeout, slot.adapter.authenticate()).await {
            Ok(result) => result,
            Err(_) => Err(PlatformError::Timeout {
                platform,
                operation: "authenticate",
                timeout_secs: auth_timeout.as_secs(),
            }),
        };

        match result {
            Ok(source) => {
                let how = match source {
                    SessionSource::StaticToken => "静态 Token",
                    SessionSource::Restored => "缓存会话",
                    SessionSource::FreshLogin => "重新登录",
                };
                info!("✅ {} 认证成功 ({})", platform, how);
                slot.state = AuthState::Ready;
                true
            }
            Err(e) => {
                error!("❌ {}", e);
                warn!("⚠️ {} 本次运行内不再尝试", platform);
                slot.state = AuthState::Unusable;
                false
            }
        }
    }
}
