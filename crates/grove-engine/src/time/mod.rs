//! Frame timing.
//!
//! One `FrameClock` per render loop; call `tick()` once per presented frame.
//! `FixedStep` turns the variable frame time into fixed-rate updates.

mod fixed_step;
mod frame_clock;

pub use fixed_step::{FixedStep, FixedSteps, DEFAULT_MAX_STEPS, DEFAULT_TICK_RATE};
pub use frame_clock::{FrameClock, FrameTime, IntervalTimer};
