use bevy::input::mouse::MouseScrollUnit;
use bevy::math::EulerRot;
use bevy::{
    input::mouse::{MouseMotion, MouseWheel},
    prelude::*,
};

const MIN_PITCH: f32 = -1.55;
const MAX_PITCH: f32 = 1.55;

/// Orbit camera state. The camera sits `distance` away from `focus_point`
/// along the view direction given by `yaw` and `pitch`.
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct ViewportCamera {
    pub focus_point: Vec3,
    pub distance: f32,
    pub pitch: f32,
    pub yaw: f32,
    pub min_distance: f32,
    pub max_distance: f32,
}

impl Default for ViewportCamera {
    fn default() -> Self {
        Self {
            focus_point: Vec3::ZERO,
            distance: 2.0,
            pitch: -0.35,
            yaw: 0.6,
            min_distance: 0.02,
            max_distance: 200.0,
        }
    }
}

impl ViewportCamera {
    pub fn rotation(&self) -> Quat {
        Quat::from_euler(EulerRot::YXZ, self.yaw, self.pitch, 0.0)
    }

    /// Unit vector from the focus point towards the camera.
    pub fn back(&self) -> Vec3 {
        (self.rotation() * Vec3::Z).normalize()
    }

    pub fn eye(&self) -> Vec3 {
        self.focus_point + self.back() * self.distance
    }

    pub fn orbit(&mut self, delta: Vec2) {
        let yaw_sens = 0.0050;
        let pitch_sens = 0.0045;
        self.yaw += -delta.x * yaw_sens;
        self.pitch = (self.pitch - delta.y * pitch_sens).clamp(MIN_PITCH, MAX_PITCH);
    }

    /// Move the focus point in the view plane, scaled so the content under
    /// the pointer roughly follows it.
    pub fn pan(&mut self, delta: Vec2, viewport_height: f32, fov_y: f32) {
        let rotation = self.rotation();
        let right = rotation * Vec3::X;
        let up = rotation * Vec3::Y;
        let world_per_px = 2.0 * self.distance * (fov_y * 0.5).tan() / viewport_height.max(1.0);
        self.focus_point += (-right * delta.x + up * delta.y) * world_per_px;
    }

    /// Positive steps move closer.
    pub fn zoom(&mut self, steps: f32) {
        self.distance =
            (self.distance * (-steps * 0.12).exp()).clamp(self.min_distance, self.max_distance);
    }
}

/// Left drag orbits, right drag pans, wheel zooms.
pub fn camera_controller(
    mut camera_query: Query<(&mut Transform, &Camera, &Projection), With<Camera3d>>,
    mut orbit: ResMut<ViewportCamera>,
    mouse_button: Res<ButtonInput<MouseButton>>,
    mut mouse_motion: EventReader<MouseMotion>,
    mut scroll_events: EventReader<MouseWheel>,
    keyboard: Res<ButtonInput<KeyCode>>,
    time: Res<Time>,
) {
    let Ok((mut camera_transform, camera, projection)) = camera_query.single_mut() else {
        return;
    };

    let mouse_delta: Vec2 = mouse_motion.read().map(|m| m.delta).sum();

    if mouse_delta != Vec2::ZERO {
        if mouse_button.pressed(MouseButton::Left) {
            orbit.orbit(mouse_delta);
        } else if mouse_button.pressed(MouseButton::Right) {
            let viewport_height = camera.logical_viewport_size().map_or(720.0, |s| s.y);
            let fov = match projection {
                Projection::Perspective(perspective) => perspective.fov,
                _ => std::f32::consts::FRAC_PI_4,
            };
            orbit.pan(mouse_delta, viewport_height, fov);
        }
    }

    // Mouse wheel scroll accumulation (pixel and line scroll)
    let mut scroll_accum = 0.0;
    for ev in scroll_events.read() {
        scroll_accum += match ev.unit {
            MouseScrollUnit::Line => ev.y,
            MouseScrollUnit::Pixel => ev.y * 0.05,
        };
    }
    if scroll_accum.abs() > f32::EPSILON {
        orbit.zoom(scroll_accum);
    }

    // Arrow keys orbit, +/- zoom
    let mut key_orbit = Vec2::ZERO;
    if keyboard.pressed(KeyCode::ArrowLeft) { key_orbit.x -= 1.0; }
    if keyboard.pressed(KeyCode::ArrowRight) { key_orbit.x += 1.0; }
    if keyboard.pressed(KeyCode::ArrowUp) { key_orbit.y -= 1.0; }
    if keyboard.pressed(KeyCode::ArrowDown) { key_orbit.y += 1.0; }
    if key_orbit != Vec2::ZERO {
        orbit.orbit(key_orbit * 400.0 * time.delta_secs());
    }
    if keyboard.pressed(KeyCode::Equal) { orbit.zoom(6.0 * time.delta_secs()); }
    if keyboard.pressed(KeyCode::Minus) { orbit.zoom(-6.0 * time.delta_secs()); }

    let target_rot = orbit.rotation();
    let target_pos = orbit.eye();

    let lerp_speed = (12.0 * time.delta_secs()).min(1.0);
    camera_transform.translation = camera_transform.translation.lerp(target_pos, lerp_speed);
    camera_transform.rotation = camera_transform.rotation.slerp(target_rot, lerp_speed);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eye_sits_at_distance_from_focus() {
        let orbit = ViewportCamera {
            focus_point: Vec3::new(1.0, 2.0, 3.0),
            distance: 5.0,
            ..default()
        };
        assert!((orbit.eye().distance(orbit.focus_point) - 5.0).abs() < 1e-5);
    }

    #[test]
    fn camera_looks_at_focus() {
        let orbit = ViewportCamera::default();
        let transform = Transform::from_translation(orbit.eye()).with_rotation(orbit.rotation());
        let forward = transform.forward();
        let to_focus = (orbit.focus_point - orbit.eye()).normalize();
        assert!(forward.dot(to_focus) > 0.9999);
    }

    #[test]
    fn pitch_is_clamped() {
        let mut orbit = ViewportCamera::default();
        orbit.orbit(Vec2::new(0.0, -100_000.0));
        assert_eq!(orbit.pitch, MAX_PITCH);
    }

    #[test]
    fn zoom_stays_within_limits() {
        let mut orbit = ViewportCamera::default();
        orbit.zoom(1000.0);
        assert_eq!(orbit.distance, orbit.min_distance);
        orbit.zoom(-1000.0);
        assert_eq!(orbit.distance, orbit.max_distance);
    }

    #[test]
    fn pan_moves_focus_in_view_plane() {
        let mut orbit = ViewportCamera::default();
        let before = orbit.focus_point;
        orbit.pan(Vec2::new(10.0, 0.0), 720.0, std::f32::consts::FRAC_PI_4);
        let moved = orbit.focus_point - before;
        assert!(moved.length() > 0.0);
        assert!(moved.dot(orbit.back()).abs() < 1e-5);
    }
}
