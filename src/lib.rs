//! # Clip Uploader
//!
//! 把本地生成的视频片段分发到多个社交平台的 Rust 应用程序
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（目录、外部进程、HTTP 客户端），只暴露能力
//! - `FsLedger` - 已处理目录即台账，保证每个片段只尝试一次
//! - `SessionStore` - 平台会话缓存
//! - `FfmpegRunner` / `TempArtifact` - 外部转码与临时文件清理
//!
//! ### ② 业务能力层（Services / Clients）
//! - `services/` - 描述"我能做什么"，只处理单个片段
//! - `FormatNormalizer` - 平台不接受的格式才转码
//! - `CaptionSelector` - 随机文案
//! - `QuotaController` / `PacingPolicy` - 每日配额与随机间隔
//! - `clients/` - `PlatformAdapter` 的 TikTok / Instagram 实现
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一个片段"的完整处理流程
//! - `ClipCtx` - 上下文封装（序号 + 文件名）
//! - `PlatformDispatcher` - 配额检查、惰性认证、超时
//! - `ClipFlow` - 状态机（Pending → Normalizing → Dispatching → Finalizing → Done）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/app` - 按配置组装组件
//! - `orchestrator/batch_processor` - 待处理快照、顺序处理、节奏控制
//!
//! ## 模块结构

pub mod cli;
pub mod clients;
pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use clients::{PlatformAdapter, SessionSource};
pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::{FsLedger, LedgerStore, Transcoder};
pub use models::{Caption, CaptionPool, Clip, ClipDisposition, Platform, RunStats};
pub use orchestrator::{App, Orchestrator};
pub use services::{ClipPreparer, FormatNormalizer, PacingPolicy, QuotaConfig, QuotaController};
pub use workflow::{ClipCtx, ClipFlow, PlatformDispatcher};
