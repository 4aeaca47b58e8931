//! 基础设施层（Infrastructure Layer）
//!
//! 持有稀缺资源（文件系统目录、外部进程、HTTP 客户端），只暴露能力，
//! 不认识 Clip 的处理流程。

pub mod ffmpeg;
pub mod http;
pub mod ledger;
pub mod session_store;
pub mod temp_artifact;
pub mod transcoder;

pub use ffmpeg::{FfmpegRunner, MediaInfo};
pub use http::build_http_client;
pub use ledger::{FsLedger, LedgerStore};
pub use session_store::SessionStore;
pub use temp_artifact::{sweep_orphans, TempArtifact, CONVERTED_SUFFIX};
pub use transcoder::{ClipEditor, Transcoder};
