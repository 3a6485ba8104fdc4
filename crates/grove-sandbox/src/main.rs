//! Interactive sandbox for the batched 2D renderer.
//!
//! WASD pans, Q/E rotates, the mouse wheel zooms, F1 toggles the stats
//! overlay, Escape quits.

mod app;
mod camera;
mod layers;
mod textures;

use grove_engine::device::GpuInit;
use grove_engine::logging::{init_logging, LoggingConfig};
use grove_engine::window::{Runtime, RuntimeConfig};

fn main() -> anyhow::Result<()> {
    init_logging(LoggingConfig::default());

    let config = RuntimeConfig {
        title: "grove sandbox".to_string(),
        ..RuntimeConfig::default()
    };
    Runtime::run(config, GpuInit::default(), app::Sandbox::new())
}
