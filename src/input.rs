//! Fly-style camera controls.
//!
//! Keyboard and mouse events set movement and rotation intents; [`FlyControls::update`]
//! integrates them into the camera once per frame.

use glam::{Quat, Vec3};
use winit::event::{ElementState, MouseButton};
use winit::keyboard::KeyCode;

use crate::renderer::camera::Camera;

/// Speeds and damping for the fly controls.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InputConfig {
    /// Translation speed (units per second)
    pub movement_speed: f32,
    /// Speed multiplier while Shift is held
    pub slow_multiplier: f32,
    /// Rotation speed (radians per second at full input)
    pub roll_speed: f32,
    /// Scale applied to mouse-look input
    pub look_sensitivity: f32,
    /// Ease movement toward the input instead of snapping
    pub enable_damping: bool,
    /// Fraction of the remaining difference closed per 1/60 s
    pub damping_factor: f32,
    /// Only steer with the mouse while a button is held
    pub drag_to_look: bool,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            movement_speed: 300.0,
            slow_multiplier: 0.1,
            roll_speed: 0.8,
            look_sensitivity: 0.2,
            enable_damping: true,
            damping_factor: 0.15,
            drag_to_look: true,
        }
    }
}

/// Which movement and rotation keys are held, plus mouse-look state.
#[derive(Debug, Default, Clone)]
pub struct InputState {
    pub forward: bool,
    pub back: bool,
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
    pub pitch_up: bool,
    pub pitch_down: bool,
    pub yaw_left: bool,
    pub yaw_right: bool,
    pub roll_left: bool,
    pub roll_right: bool,
    pub shift_pressed: bool,
    /// Number of mouse buttons held
    pub mouse_buttons: u32,
    /// Mouse-look yaw input in -1.0..=1.0 (positive turns left)
    pub mouse_yaw: f32,
    /// Mouse-look pitch input in -1.0..=1.0 (positive tilts up)
    pub mouse_pitch: f32,
    /// Viewport size in pixels
    pub viewport: (f32, f32),
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_looking(&self) -> bool {
        self.mouse_buttons > 0
    }

    /// Local-space translation intent, each axis in -1.0..=1.0.
    pub fn movement_vector(&self) -> Vec3 {
        Vec3::new(
            axis(self.right, self.left),
            axis(self.up, self.down),
            axis(self.back, self.forward),
        )
    }

    /// Local-space rotation intent around (x, y, z).
    pub fn rotation_vector(&self, look_sensitivity: f32, drag_to_look: bool) -> Vec3 {
        let mut rotation = Vec3::new(
            axis(self.pitch_up, self.pitch_down),
            axis(self.yaw_left, self.yaw_right),
            axis(self.roll_left, self.roll_right),
        );
        if self.is_looking() || !drag_to_look {
            rotation.x += self.mouse_pitch * look_sensitivity;
            rotation.y += self.mouse_yaw * look_sensitivity;
        }
        rotation
    }
}

fn axis(positive: bool, negative: bool) -> f32 {
    (positive as i32 - negative as i32) as f32
}

/// Application key bindings that sit above the fly controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shortcut {
    Quit,
    Export,
}

/// Match a key event against the application bindings.
///
/// Only presses trigger a shortcut. Releases always fall through so a key
/// that doubles as a movement key (S) is let go even if Ctrl went down while
/// it was held.
pub fn shortcut(key: KeyCode, state: ElementState, ctrl: bool) -> Option<Shortcut> {
    if state != ElementState::Pressed {
        return None;
    }
    match key {
        KeyCode::Escape => Some(Shortcut::Quit),
        KeyCode::KeyS if ctrl => Some(Shortcut::Export),
        _ => None,
    }
}

/// Six-degree-of-freedom fly controller.
pub struct FlyControls {
    pub config: InputConfig,
    pub state: InputState,
    /// Damped translation currently applied
    velocity: Vec3,
    /// Damped rotation currently applied
    spin: Vec3,
}

impl FlyControls {
    pub fn new() -> Self {
        Self {
            config: InputConfig::default(),
            state: InputState::new(),
            velocity: Vec3::ZERO,
            spin: Vec3::ZERO,
        }
    }

    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.state.viewport = (width as f32, height as f32);
    }

    /// Handle keyboard key press/release. Returns true if the key was used.
    pub fn handle_keyboard(&mut self, key: KeyCode, state: ElementState, camera: &mut Camera) -> bool {
        let pressed = state == ElementState::Pressed;
        if key == KeyCode::Home {
            if pressed {
                *camera = Camera::new();
                self.stop();
            }
            return true;
        }

        let s = &mut self.state;

        match key {
            KeyCode::ShiftLeft | KeyCode::ShiftRight => s.shift_pressed = pressed,
            KeyCode::KeyW => s.forward = pressed,
            KeyCode::KeyS => s.back = pressed,
            KeyCode::KeyA => s.left = pressed,
            KeyCode::KeyD => s.right = pressed,
            KeyCode::KeyR => s.up = pressed,
            KeyCode::KeyF => s.down = pressed,
            KeyCode::ArrowUp => s.pitch_up = pressed,
            KeyCode::ArrowDown => s.pitch_down = pressed,
            KeyCode::ArrowLeft => s.yaw_left = pressed,
            KeyCode::ArrowRight => s.yaw_right = pressed,
            KeyCode::KeyQ => s.roll_left = pressed,
            KeyCode::KeyE => s.roll_right = pressed,
            _ => return false,
        }
        true
    }

    /// Handle mouse button press/release.
    pub fn handle_mouse_button(&mut self, _button: MouseButton, state: ElementState) {
        match state {
            ElementState::Pressed => self.state.mouse_buttons += 1,
            ElementState::Released => {
                self.state.mouse_buttons = self.state.mouse_buttons.saturating_sub(1)
            }
        }
        if !self.state.is_looking() && self.config.drag_to_look {
            self.state.mouse_yaw = 0.0;
            self.state.mouse_pitch = 0.0;
        }
    }

    /// Handle cursor movement: steer by the cursor's offset from the viewport center.
    pub fn handle_mouse_move(&mut self, x: f32, y: f32) {
        if self.config.drag_to_look && !self.state.is_looking() {
            return;
        }
        let (width, height) = self.state.viewport;
        if width <= 0.0 || height <= 0.0 {
            return;
        }
        let half_width = width / 2.0;
        let half_height = height / 2.0;

        self.state.mouse_yaw = (-(x - half_width) / half_width).clamp(-1.0, 1.0);
        self.state.mouse_pitch = (-(y - half_height) / half_height).clamp(-1.0, 1.0);
    }

    /// Drop all held input and any residual motion.
    pub fn stop(&mut self) {
        let viewport = self.state.viewport;
        self.state = InputState {
            viewport,
            ..InputState::new()
        };
        self.velocity = Vec3::ZERO;
        self.spin = Vec3::ZERO;
    }

    /// Advance the camera by `dt` seconds of input.
    pub fn update(&mut self, camera: &mut Camera, dt: f32) {
        let mut speed = self.config.movement_speed;
        if self.state.shift_pressed {
            speed *= self.config.slow_multiplier;
        }

        let target_velocity = self.state.movement_vector();
        let target_spin = self
            .state
            .rotation_vector(self.config.look_sensitivity, self.config.drag_to_look);

        if self.config.enable_damping {
            // Same decay per second at any frame rate
            let keep = 1.0 - self.config.damping_factor.clamp(0.0, 1.0);
            let k = 1.0 - keep.powf(dt * 60.0);
            self.velocity += (target_velocity - self.velocity) * k;
            self.spin += (target_spin - self.spin) * k;
        } else {
            self.velocity = target_velocity;
            self.spin = target_spin;
        }

        camera.translate_local(self.velocity * speed * dt);

        let r = self.spin * self.config.roll_speed * dt;
        if r != Vec3::ZERO {
            camera.rotate_local(Quat::from_xyzw(r.x, r.y, r.z, 1.0).normalize());
        }
    }

    /// Current damped translation intent.
    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }
}

impl Default for FlyControls {
    fn default() -> Self {
        Self::new()
    }
}
