//! Sandbox layers: the pannable world below, the stats overlay on top.

use std::collections::HashSet;

use winit::event::{ElementState, MouseScrollDelta, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

use grove_engine::coords::Vec2;
use grove_engine::core::Layer;
use grove_engine::gfx::Statistics;

use crate::app::SandboxCx;
use crate::camera::OrthoCamera2D;

/// World units per second at zoom 1.
const PAN_SPEED: f32 = 400.0;
/// Radians per second.
const SPIN_SPEED: f32 = 1.0;

const CAMERA_KEYS: [KeyCode; 6] = [
    KeyCode::KeyW,
    KeyCode::KeyA,
    KeyCode::KeyS,
    KeyCode::KeyD,
    KeyCode::KeyQ,
    KeyCode::KeyE,
];

/// Key code and state of a keyboard event.
fn key_of(event: &WindowEvent) -> Option<(KeyCode, ElementState)> {
    match event {
        WindowEvent::KeyboardInput { event, .. } => match event.physical_key {
            PhysicalKey::Code(code) => Some((code, event.state)),
            PhysicalKey::Unidentified(_) => None,
        },
        _ => None,
    }
}

/// World scene with a camera moved at the fixed update rate.
///
/// Rendering interpolates between the last two simulated camera states.
pub struct WorldLayer {
    camera: OrthoCamera2D,
    held: HashSet<KeyCode>,
    position: Vec2,
    previous_position: Vec2,
    rotation: f32,
    previous_rotation: f32,
}

impl WorldLayer {
    pub fn new() -> Self {
        Self {
            camera: OrthoCamera2D::new(1.0, 1.0),
            held: HashSet::new(),
            position: Vec2::zero(),
            previous_position: Vec2::zero(),
            rotation: 0.0,
            previous_rotation: 0.0,
        }
    }

    /// Returns `true` for camera keys.
    fn on_key(&mut self, code: KeyCode, state: ElementState) -> bool {
        if !CAMERA_KEYS.contains(&code) {
            return false;
        }
        match state {
            ElementState::Pressed => self.held.insert(code),
            ElementState::Released => self.held.remove(&code),
        };
        true
    }

    fn zoom_by(&mut self, lines: f32) {
        let zoom = self.camera.zoom() * (1.0 + lines * 0.1);
        self.camera.set_zoom(zoom);
    }

    fn axis(&self, negative: KeyCode, positive: KeyCode) -> f32 {
        let held = |k: KeyCode| self.held.contains(&k) as i32;
        (held(positive) - held(negative)) as f32
    }

    fn step(&mut self, dt: f32) {
        self.previous_position = self.position;
        self.previous_rotation = self.rotation;

        let speed = PAN_SPEED * dt / self.camera.zoom();
        let dir = Vec2::new(
            self.axis(KeyCode::KeyA, KeyCode::KeyD),
            self.axis(KeyCode::KeyW, KeyCode::KeyS),
        );
        self.position = self.position + dir * speed;
        self.rotation += self.axis(KeyCode::KeyQ, KeyCode::KeyE) * SPIN_SPEED * dt;
    }

    /// Camera position and rotation `alpha` of the way into the current step.
    fn interpolated(&self, alpha: f32) -> (Vec2, f32) {
        let position = self.previous_position.lerp(self.position, alpha);
        let rotation = self.previous_rotation + (self.rotation - self.previous_rotation) * alpha;
        (position, rotation)
    }
}

impl Layer<SandboxCx> for WorldLayer {
    fn name(&self) -> &str {
        "world"
    }

    fn on_update(&mut self, _cx: &mut SandboxCx, dt: f32) {
        self.step(dt);
    }

    fn on_render(&mut self, cx: &mut SandboxCx, alpha: f32) {
        let Some(scene) = cx.scene.as_mut() else {
            return;
        };

        let (position, rotation) = self.interpolated(alpha);
        self.camera.set_viewport(cx.viewport.0, cx.viewport.1);
        self.camera.set_position(position.x, position.y);
        self.camera.set_rotation(rotation);
        cx.world_stats = scene.draw_world(self.camera.view_projection(), cx.time);
    }

    fn on_event(&mut self, _cx: &mut SandboxCx, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::MouseWheel { delta, .. } => {
                let lines = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(p) => p.y as f32 / 40.0,
                };
                self.zoom_by(lines);
                true
            }
            WindowEvent::Focused(false) => {
                self.held.clear();
                false
            }
            _ => key_of(event).is_some_and(|(code, state)| self.on_key(code, state)),
        }
    }
}

/// Screen-space stats panel; F1 toggles it.
pub struct OverlayLayer {
    camera: OrthoCamera2D,
    visible: bool,
}

impl OverlayLayer {
    pub fn new() -> Self {
        Self {
            camera: OrthoCamera2D::screen(1.0, 1.0),
            visible: true,
        }
    }

    /// Returns `true` for the toggle key, which lower layers never see.
    fn on_key(&mut self, code: KeyCode, state: ElementState) -> bool {
        if code != KeyCode::F1 {
            return false;
        }
        if state == ElementState::Pressed {
            self.visible = !self.visible;
        }
        true
    }
}

impl Layer<SandboxCx> for OverlayLayer {
    fn name(&self) -> &str {
        "overlay"
    }

    fn on_render(&mut self, cx: &mut SandboxCx, _alpha: f32) {
        if !self.visible {
            cx.overlay_stats = Statistics::default();
            return;
        }
        let Some(scene) = cx.scene.as_mut() else {
            return;
        };

        let (w, h) = cx.viewport;
        self.camera.set_viewport(w, h);
        self.camera.set_position(w * 0.5, h * 0.5);
        cx.overlay_stats = scene.draw_overlay(self.camera.view_projection(), cx.world_stats);
    }

    fn on_event(&mut self, _cx: &mut SandboxCx, event: &WindowEvent) -> bool {
        key_of(event).is_some_and(|(code, state)| self.on_key(code, state))
    }
}
