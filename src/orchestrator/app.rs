//! 应用 - 编排层
//!
//! 按配置组装一次上传运行所需的全部组件：
//! 配置校验 → 清理遗留临时文件 → HTTP 客户端与平台适配器 → 文案池 → 转码器 → 台账
//!
//! 只有这里知道具体的平台客户端和 ffmpeg，下层都只依赖接口。

use std::sync::Arc;
use tracing::{info, warn};

use crate::clients::{InstagramClient, PlatformAdapter, TikTokClient};
use crate::config::Config;
use crate::error::AppResult;
use crate::infrastructure::{
    build_http_client, sweep_orphans, FfmpegRunner, FsLedger, SessionStore,
};
use crate::models::{load_captions, scan_staging, Platform, RunStats};
use crate::orchestrator::Orchestrator;
use crate::services::{CaptionSelector, FormatNormalizer, PacingPolicy, QuotaController};
use crate::utils::logging::{log_clips_loaded, log_startup, print_final_stats};
use crate::workflow::{ClipFlow, PlatformDispatcher};

/// 应用主结构
pub struct App {
    config: Config,
    orchestrator: Orchestrator,
}

impl App {
    /// 初始化应用
    ///
    /// 配置错误在这里直接返回，不会进入处理循环
    pub async fn initialize(config: Config) -> AppResult<Self> {
        config.validate()?;
        log_startup(&config);

        let swept = sweep_orphans(&config.temp_dir);
        if swept > 0 {
            info!("🧹 已清理 {} 个遗留的临时文件", swept);
        }

        let http = build_http_client(config.request_timeout())?;
        let adapters = build_adapters(&config, http);

        let captions = load_captions(&config.captions_file).await;

        let transcoder = FfmpegRunner::new(
            config.ffmpeg_path.clone(),
            config.ffprobe_path.clone(),
            config.transcode_timeout(),
        );
        let normalizer = FormatNormalizer::new(Arc::new(transcoder), config.temp_dir.clone());

        let dispatcher = PlatformDispatcher::new(
            adapters,
            QuotaController::new(config.quota_config()),
            config.request_timeout(),
        );

        let flow = ClipFlow::new(
            normalizer,
            CaptionSelector::new(captions),
            dispatcher,
            Arc::new(FsLedger::new(config.processed_dir.clone())),
        );
        let pacing = PacingPolicy::new(config.min_delay(), config.max_delay());

        Ok(Self {
            config,
            orchestrator: Orchestrator::new(flow, pacing),
        })
    }

    /// 运行应用主逻辑
    pub async fn run(mut self) -> AppResult<RunStats> {
        info!("\n📁 正在扫描 {} ...", self.config.staging_dir.display());
        let clips = scan_staging(&self.config.staging_dir).await?;

        if clips.is_empty() {
            warn!("⚠️ 没有找到待上传的片段，程序结束");
            return Ok(RunStats::default());
        }
        log_clips_loaded(clips.len());

        let stats = self.orchestrator.run(clips).await?;
        print_final_stats(&stats, &self.config.log_file);

        Ok(stats)
    }
}

/// 为每个启用的平台创建适配器
fn build_adapters(config: &Config, http: reqwest::Client) -> Vec<Box<dyn PlatformAdapter>> {
    let timeout_secs = config.request_timeout_secs;

    config
        .enabled_platforms()
        .into_iter()
        .map(|platform| -> Box<dyn PlatformAdapter> {
            match platform {
                Platform::TikTok => Box::new(TikTokClient::new(
                    http.clone(),
                    config.tiktok_upload_endpoint.clone(),
                    config.tiktok_publish_endpoint.clone(),
                    config.tiktok_access_token.clone(),
                    timeout_secs,
                )),
                Platform::Instagram => Box::new(InstagramClient::new(
                    http.clone(),
                    config.instagram_api_base_url.clone(),
                    config.instagram_username.clone(),
                    config.instagram_password.clone(),
                    SessionStore::new(config.session_dir.clone()),
                    timeout_secs,
                )),
            }
        })
        .collect()
}
