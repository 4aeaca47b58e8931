//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责一次运行的整体调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `app` - 应用
//! - 校验配置、清理上次遗留的临时文件
//! - 按配置组装平台适配器、转码器、台账
//! - 扫描暂存目录并输出全局统计
//!
//! ### `batch_processor` - 批量片段处理器
//! - 用台账过滤出待处理快照（只取一次）
//! - 严格顺序处理每个片段
//! - 在片段之间插入随机间隔（第一个之前和最后一个之后都不等待）
//! - 台账写入失败时终止运行
//!
//! ## 层次关系
//!
//! ```text
//! app (配置 → 组装)
//!     ↓
//! batch_processor (处理 Vec<Clip>)
//!     ↓
//! workflow::ClipFlow (处理单个 Clip)
//!     ↓
//! workflow::PlatformDispatcher (配额 / 认证 / 超时)
//!     ↓
//! services + clients (能力层：转码 / 文案 / 节奏 / 平台)
//!     ↓
//! infrastructure (基础设施：ffmpeg / 台账 / 会话 / HTTP)
//! ```
//!
//! ## 设计原则
//!
//! 1. **单一职责**：app 管组装，batch_processor 管批量
//! 2. **顺序执行**：不并发处理片段，也不并发派发平台
//! 3. **向下依赖**：编排层 → workflow → services → infrastructure
//! 4. **无业务逻辑**：只做调度和统计，不做具体业务判断

pub mod app;
pub mod batch_processor;

// 重新导出主要类型
pub use app::App;
pub use batch_processor::Orchestrator;
