pub mod caption;
pub mod clip;
pub mod loaders;
pub mod outcome;
pub mod platform;

pub use caption::{Caption, CaptionPool, FALLBACK_CAPTION};
pub use clip::{Clip, ClipFormat};
pub use loaders::{load_captions, scan_staging};
pub use outcome::{
    ClipDisposition, ClipReport, ClipStage, PlatformStats, RunStats, SkipReason, UploadOutcome,
};
pub use platform::Platform;
