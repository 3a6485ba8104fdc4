//! Grove engine crate.
//!
//! A batched 2D quad renderer ([`gfx::Renderer2D`]) over a small GPU backend
//! contract, plus the window/device runtime that hosts it.

pub mod coords;
pub mod core;
pub mod device;
pub mod gfx;
pub mod logging;
pub mod paint;
pub mod time;
pub mod window;
