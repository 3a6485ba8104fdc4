//! Contract between the runtime loop and the application.

mod app;
mod ctx;
mod layer;

pub use app::{App, AppControl};
pub use ctx::{FrameCtx, FrameTarget, WindowCtx};
pub use layer::{Layer, LayerStack};
