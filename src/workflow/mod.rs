pub mod clip_ctx;
pub mod clip_flow;
pub mod dispatcher;

pub use clip_ctx::ClipCtx;
pub use clip_flow::ClipFlow;
pub use dispatcher::{DispatchResult, PlatformDispatcher};
