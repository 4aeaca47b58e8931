pub mod caption_loader;
pub mod clip_scanner;

pub use caption_loader::load_captions;
pub use clip_scanner::scan_staging;
