pub mod caption_selector;
pub mod clip_preparer;
pub mod normalizer;
pub mod pacing;
pub mod quota;

pub use caption_selector::CaptionSelector;
pub use clip_preparer::{ClipPreparer, PrepareOutcome, PrepareStats};
pub use normalizer::{FormatNormalizer, NormalizedClip};
pub use pacing::PacingPolicy;
pub use quota::{QuotaConfig, QuotaController};
