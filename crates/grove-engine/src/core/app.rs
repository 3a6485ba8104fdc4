use winit::event::WindowEvent;

use super::ctx::FrameCtx;

/// Control directive returned by app callbacks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// Application driven by [`Runtime`](crate::window::Runtime).
pub trait App {
    /// Called for every window event before the runtime handles it.
    fn on_window_event(&mut self, event: &WindowEvent) -> AppControl {
        let _ = event;
        AppControl::Continue
    }

    /// Fixed-rate update, run zero or more times before each frame.
    ///
    /// `dt` is the step length in seconds and is the same on every call.
    fn on_update(&mut self, dt: f32) -> AppControl {
        let _ = dt;
        AppControl::Continue
    }

    /// Called once per redraw, after the frame's fixed updates.
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl;

    /// Called once when the runtime shuts down.
    fn on_exit(&mut self) {}
}
