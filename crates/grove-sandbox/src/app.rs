use std::time::Duration;

use anyhow::{Context, Result};
use winit::event::{ElementState, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

use grove_engine::coords::Mat4;
use grove_engine::core::{App, AppControl, FrameCtx, LayerStack};
use grove_engine::device::Gpu;
use grove_engine::gfx::{
    FilterMode, GpuBackend, Renderer2D, Renderer2DConfig, Statistics, SubTexture, TextureDesc,
    TextureHandle, UniformValue, WgpuBackend, WrapMode, QUAD_FRAGMENT_WGSL, QUAD_VERTEX_WGSL,
};
use grove_engine::paint::Color;
use grove_engine::time::IntervalTimer;

use crate::layers::{OverlayLayer, WorldLayer};
use crate::textures;

const CLEAR: Color = Color::DARK_GRAY;
const SWATCH_COUNT: usize = 20;

/// GPU resources created on the first frame, once a surface format is known.
pub struct Scene {
    renderer: Renderer2D<WgpuBackend>,
    checker: SubTexture,
    tiles: Vec<SubTexture>,
    swatches: Vec<TextureHandle>,
}

/// State shared by the sandbox layers.
#[derive(Default)]
pub struct SandboxCx {
    pub scene: Option<Scene>,
    /// Logical window size.
    pub viewport: (f32, f32),
    /// Simulation time in seconds, advanced by fixed updates.
    pub time: f32,
    pub world_stats: Statistics,
    pub overlay_stats: Statistics,
}

pub struct Sandbox {
    layers: LayerStack<SandboxCx>,
    cx: SandboxCx,
    stats_timer: IntervalTimer,
}

impl Sandbox {
    pub fn new() -> Self {
        let mut cx = SandboxCx::default();
        let mut layers = LayerStack::new();
        layers.push(&mut cx, Box::new(WorldLayer::new()));
        layers.push(&mut cx, Box::new(OverlayLayer::new()));
        Self {
            layers,
            cx,
            stats_timer: IntervalTimer::new(Duration::from_secs(1)),
        }
    }

    fn log_stats(&self) {
        let (world, overlay) = (self.cx.world_stats, self.cx.overlay_stats);
        log::info!(
            "world: {} draws, {} quads, {} vertices, {} indices, {} textures (last batch) \
             | overlay: {} draws, {} quads",
            world.draw_calls,
            world.quad_count,
            world.total_vertex_count(),
            world.total_index_count(),
            world.texture_count,
            overlay.draw_calls,
            overlay.quad_count
        );
    }
}

impl Default for Sandbox {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    fn new(gpu: &Gpu<'_>) -> Result<Self> {
        let backend = WgpuBackend::new(
            gpu.device().clone(),
            gpu.queue().clone(),
            gpu.surface_format(),
        );
        let mut renderer = Renderer2D::with_config(
            backend,
            QUAD_VERTEX_WGSL,
            QUAD_FRAGMENT_WGSL,
            &Renderer2DConfig::default(),
        )
        .context("failed to create 2D renderer")?;

        let backend = renderer.backend_mut();

        let (size, pixels) = textures::checker(8, 8, [235, 235, 235, 255], [200, 60, 90, 255]);
        let checker = backend
            .create_texture(
                &TextureDesc::rgba8(size, size, &pixels)
                    .with_filters(FilterMode::Linear, FilterMode::Nearest)
                    .with_wrap(WrapMode::Repeat, WrapMode::Repeat),
            )
            .context("checker texture")?;

        let (cols, rows, tile) = (4, 2, 16);
        let (aw, ah, pixels) = textures::tile_atlas(cols, rows, tile);
        let atlas = backend
            .create_texture(&TextureDesc::rgba8(aw, ah, &pixels))
            .context("tile atlas")?;
        let tiles = (0..rows)
            .flat_map(|cy| (0..cols).map(move |cx| (cx, cy)))
            .map(|(cx, cy)| SubTexture::from_grid(atlas, cx, cy, tile, tile, aw, ah))
            .collect();

        let swatches = (0..SWATCH_COUNT)
            .map(|i| {
                let rgba = textures::hsv(i as f32 / SWATCH_COUNT as f32, 0.8, 1.0).to_rgba8();
                backend
                    .create_texture(&TextureDesc::rgba8(1, 1, &rgba))
                    .with_context(|| format!("swatch texture {i}"))
            })
            .collect::<Result<Vec<_>>>()?;

        log::info!(
            "sandbox scene ready: {} quads per batch, {} textures",
            renderer.max_quads(),
            SWATCH_COUNT + 3
        );

        Ok(Self {
            renderer,
            checker: SubTexture::full(checker),
            tiles,
            swatches,
        })
    }

    pub fn draw_world(&mut self, view_projection: Mat4, t: f32) -> Statistics {
        let r = &mut self.renderer;
        r.set_uniform("uTime", Some(UniformValue::Float(t)));
        r.begin_scene(view_projection);

        // Background grid of solid quads.
        for gy in -12..12 {
            for gx in -20..20 {
                let c = textures::hsv((gx + gy) as f32 / 64.0 + t * 0.05, 0.35, 0.35);
                r.draw_quad(gx as f32 * 28.0, gy as f32 * 28.0, 24.0, 24.0, c, 0.0);
            }
        }

        // Ring of single-colour textures; more than fit in one batch's slots.
        for (i, tex) in self.swatches.iter().enumerate() {
            let a = i as f32 / self.swatches.len() as f32 * std::f32::consts::TAU + t * 0.3;
            let (x, y) = (a.cos() * 220.0, a.sin() * 220.0);
            r.draw_textured_quad(x, y, 36.0, 36.0, *tex, Color::WHITE, a);
        }

        // Atlas tiles in a row.
        for (i, tile) in self.tiles.iter().enumerate() {
            let x = (i as f32 - (self.tiles.len() as f32 - 1.0) * 0.5) * 40.0;
            r.draw_sub_texture_quad(x, 140.0, 32.0, 32.0, tile, Color::WHITE, 0.0);
        }

        // Rotating checker sprite, tinted by a pulse.
        let pulse = 0.75 + 0.25 * (t * 2.0).sin();
        let tint = Color::new(pulse, pulse, 1.0, 1.0);
        r.draw_sub_texture_quad(0.0, 0.0, 128.0, 128.0, &self.checker, tint, t);
        let faded = Color::WHITE.with_alpha(0.5);
        r.draw_textured_quad(0.0, 0.0, 64.0, 64.0, self.checker.texture, faded, -t);

        r.end_scene();
        r.stats()
    }

    pub fn draw_overlay(&mut self, view_projection: Mat4, world: Statistics) -> Statistics {
        let r = &mut self.renderer;
        r.begin_scene(view_projection);

        r.draw_quad(110.0, 30.0, 200.0, 40.0, Color::from_rgba8(12, 14, 18, 160), 0.0);
        // One bar per world draw call.
        for i in 0..world.draw_calls.min(16) {
            let x = 20.0 + i as f32 * 12.0;
            r.draw_quad(x, 30.0, 8.0, 24.0, Color::YELLOW, 0.0);
        }

        r.end_scene();
        r.stats()
    }
}

impl App for Sandbox {
    fn on_window_event(&mut self, event: &WindowEvent) -> AppControl {
        if let WindowEvent::KeyboardInput { event: key, .. } = event {
            let escape = key.physical_key == PhysicalKey::Code(KeyCode::Escape);
            if escape && key.state == ElementState::Pressed {
                return AppControl::Exit;
            }
        }
        self.layers.dispatch_event(&mut self.cx, event);
        AppControl::Continue
    }

    fn on_update(&mut self, dt: f32) -> AppControl {
        self.cx.time += dt;
        self.layers.update(&mut self.cx, dt);
        AppControl::Continue
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        if self.cx.scene.is_none() {
            match Scene::new(ctx.gpu) {
                Ok(scene) => self.cx.scene = Some(scene),
                Err(e) => {
                    log::error!("sandbox setup failed: {e:#}");
                    return AppControl::Exit;
                }
            }
        }

        self.cx.viewport = ctx.window.logical_size();
        let alpha = ctx.alpha;
        let (layers, cx) = (&mut self.layers, &mut self.cx);
        let control = ctx.render(CLEAR, |target| {
            if let Some(scene) = cx.scene.as_mut() {
                scene.renderer.backend_mut().bind_target(target.view.clone());
            }
            layers.render(cx, alpha);
            if let Some(scene) = cx.scene.as_mut() {
                scene.renderer.backend_mut().unbind_target();
            }
        });

        if self.stats_timer.tick(ctx.time.dt) {
            self.log_stats();
        }
        control
    }

    fn on_exit(&mut self) {
        log::debug!("detaching {} layers", self.layers.len());
        self.layers.clear(&mut self.cx);
        log::info!("sandbox shut down");
    }
}
