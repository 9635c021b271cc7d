//! 3D scene: camera, lights, orbit controls and click picking

use bevy::input::mouse::{AccumulatedMouseMotion, AccumulatedMouseScroll, MouseScrollUnit};
use bevy::prelude::*;
use bevy::window::PrimaryWindow;
use bevy_egui::EguiContexts;
use bevy_picking::mesh_picking::ray_cast::MeshRayCast;
use nucleus_core::PointerPosition;

use crate::app::Viewer;
use crate::parts::{PartRayCaster, PartScene};
use crate::ui::egui_wants_pointer;

/// Pointer travel (logical pixels) beyond which a press is a drag, not a click
const CLICK_DRAG_THRESHOLD: f32 = 5.0;

pub struct ScenePlugin;

impl Plugin for ScenePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<CameraSettings>()
            .init_resource::<ClickState>()
            .add_systems(Startup, setup_scene)
            .add_systems(Update, (update_camera, handle_part_click));
    }
}

/// Marker component for the main camera
#[derive(Component)]
pub struct MainCamera;

/// Orbit camera state, Y up
#[derive(Debug, Clone, Resource)]
pub struct CameraSettings {
    pub distance: f32,
    pub target_distance: f32,
    pub azimuth: f32,
    pub elevation: f32,
    pub target: Vec3,
    pub target_focus: Vec3,
    pub sensitivity: f32,
    pub zoom_speed: f32,
    pub smooth_factor: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            distance: 20.0,
            target_distance: 20.0,
            azimuth: 0.0,
            elevation: 0.0,
            target: Vec3::ZERO,
            target_focus: Vec3::ZERO,
            sensitivity: 0.005,
            zoom_speed: 0.1,
            smooth_factor: 0.05,
        }
    }
}

impl CameraSettings {
    /// Camera position on the orbit sphere around `target`
    pub fn eye(&self) -> Vec3 {
        let x = self.distance * self.azimuth.sin() * self.elevation.cos();
        let y = self.distance * self.elevation.sin();
        let z = self.distance * self.azimuth.cos() * self.elevation.cos();
        self.target + Vec3::new(x, y, z)
    }

    pub fn orbit(&mut self, delta: Vec2) {
        self.azimuth -= delta.x * self.sensitivity;
        self.elevation = (self.elevation + delta.y * self.sensitivity).clamp(-1.5, 1.5);
    }

    /// Pan in the camera's screen plane
    pub fn pan(&mut self, delta: Vec2) {
        let right = Vec3::new(self.azimuth.cos(), 0.0, -self.azimuth.sin());
        let pan_speed = self.distance * 0.002;
        self.target_focus -= right * delta.x * pan_speed;
        self.target_focus += Vec3::Y * delta.y * pan_speed;
    }

    /// Scroll lines towards (positive) or away from the target
    pub fn zoom(&mut self, lines: f32) {
        let zoom_factor = 1.0 - lines * self.zoom_speed;
        self.target_distance = (self.target_distance * zoom_factor).clamp(1.0, 500.0);
    }

    /// Damped approach of distance and target towards their goals
    pub fn step(&mut self, dt: f32) {
        let lerp_factor = 1.0 - (-self.smooth_factor * 60.0 * dt).exp();
        self.distance += (self.target_distance - self.distance) * lerp_factor;
        self.target += (self.target_focus - self.target) * lerp_factor;
    }
}

/// Where the current left press started, if it started over the 3D view
#[derive(Resource, Default)]
pub struct ClickState {
    press_position: Option<Vec2>,
}

fn setup_scene(mut commands: Commands, settings: Res<CameraSettings>) {
    commands.spawn((
        Camera3d::default(),
        Projection::Perspective(PerspectiveProjection {
            fov: 75.0_f32.to_radians(),
            near: 0.1,
            far: 1000.0,
            ..default()
        }),
        Transform::from_translation(settings.eye()).looking_at(settings.target, Vec3::Y),
        AmbientLight {
            color: Color::srgb_u8(0x40, 0x40, 0x40),
            brightness: 400.0,
            ..default()
        },
        MainCamera,
    ));

    commands.spawn((
        DirectionalLight {
            illuminance: 4000.0,
            ..default()
        },
        Transform::from_xyz(0.0, 1.0, 1.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));
}

fn update_camera(
    mut camera_query: Query<&mut Transform, With<MainCamera>>,
    mut settings: ResMut<CameraSettings>,
    mouse_motion: Res<AccumulatedMouseMotion>,
    mouse_scroll: Res<AccumulatedMouseScroll>,
    mouse_button: Res<ButtonInput<MouseButton>>,
    time: Res<Time>,
    mut contexts: EguiContexts,
) {
    // Panels and labels get the pointer first
    let egui_wants_pointer = egui_wants_pointer(&mut contexts);

    if !egui_wants_pointer {
        if mouse_button.pressed(MouseButton::Left) {
            settings.orbit(mouse_motion.delta);
        }
        if mouse_button.pressed(MouseButton::Right) {
            settings.pan(mouse_motion.delta);
        }

        let lines = match mouse_scroll.unit {
            MouseScrollUnit::Line => mouse_scroll.delta.y,
            MouseScrollUnit::Pixel => mouse_scroll.delta.y / 100.0,
        };
        if lines != 0.0 {
            settings.zoom(lines);
        }
    }

    settings.step(time.delta_secs());

    if let Ok(mut transform) = camera_query.single_mut() {
        transform.translation = settings.eye();
        transform.look_at(settings.target, Vec3::Y);
    }
}

/// Select the part under the pointer on a left click
fn handle_part_click(
    mut click: ResMut<ClickState>,
    mut viewer: ResMut<Viewer>,
    mut scene: PartScene,
    mut ray_cast: MeshRayCast,
    camera_query: Query<(&Camera, &GlobalTransform), With<MainCamera>>,
    mouse_button: Res<ButtonInput<MouseButton>>,
    windows: Query<&Window, With<PrimaryWindow>>,
    mut contexts: EguiContexts,
) {
    let Ok(window) = windows.single() else {
        return;
    };

    if mouse_button.just_pressed(MouseButton::Left) {
        click.press_position = if egui_wants_pointer(&mut contexts) {
            None
        } else {
            window.cursor_position()
        };
    }

    if !mouse_button.just_released(MouseButton::Left) {
        return;
    }
    let (Some(start), Some(end)) = (click.press_position.take(), window.cursor_position()) else {
        return;
    };
    if start.distance(end) > CLICK_DRAG_THRESHOLD {
        return;
    }

    let Ok((camera, camera_transform)) = camera_query.single() else {
        return;
    };
    let pointer = PointerPosition::new(end, Vec2::new(window.width(), window.height()));
    let mut caster = PartRayCaster {
        ray_cast: &mut ray_cast,
        camera,
        camera_transform,
    };

    match viewer.click(pointer, &mut caster, &mut scene) {
        Some(id) => tracing::debug!(%id, "Click hit part"),
        None => tracing::debug!(x = end.x, y = end.y, "Click missed"),
    }
}
