//! Orbit camera for inspecting the voxel volume.
//!
//! The camera circles the world origin, where the extraction places the
//! volume. Mouse drag accumulates yaw/pitch deltas and the scroll wheel
//! accumulates zoom; both are consumed once per frame in `update`, which
//! springs the live distance and rotation toward their targets so the
//! motion stays smooth at uneven frame times.

use glam::{Quat, Vec2, Vec3};
use winit::dpi::PhysicalPosition;
use winit::event::{ElementState, MouseButton, MouseScrollDelta};

/// Third-person camera orbiting the volume at the world origin.
pub struct OrbitCamera {
    // Core camera state
    pub center: Vec3,
    pub distance: f32,
    pub target_distance: f32,
    pub rotation: Quat,
    pub target_rotation: Quat,

    // Up axis for yaw; pitch is constrained to stay perpendicular to it
    pub up_direction: Vec3,

    // Mouse state
    is_dragging: bool,
    last_mouse_pos: Option<PhysicalPosition<f64>>,
    accumulated_mouse_delta: Vec2,
    accumulated_scroll: f32,

    // Configuration
    pub mouse_sensitivity: f32,
    pub zoom_speed: f32,
    pub enable_spring: bool,
    pub spring_stiffness: f32,
    pub spring_damping: f32,
}

impl OrbitCamera {
    /// Closest approach to the volume; keeps the near plane out of the cells.
    pub const MIN_DISTANCE: f32 = 0.6;

    pub fn new(distance: f32) -> Self {
        // Initial rotation: looking down at the volume from a 45-degree angle
        let initial_rotation = Quat::from_rotation_x(-std::f32::consts::FRAC_PI_4);

        Self {
            center: Vec3::ZERO,
            distance,
            target_distance: distance,
            rotation: initial_rotation,
            target_rotation: initial_rotation,
            up_direction: Vec3::Y,
            is_dragging: false,
            last_mouse_pos: None,
            accumulated_mouse_delta: Vec2::ZERO,
            accumulated_scroll: 0.0,
            mouse_sensitivity: 0.003,
            zoom_speed: 0.25,
            enable_spring: true,
            spring_stiffness: 50.0,
            spring_damping: 0.9,
        }
    }

    /// Get the current camera position in world space
    pub fn position(&self) -> Vec3 {
        let offset = self.rotation * Vec3::new(0.0, 0.0, self.distance);
        self.center + offset
    }

    /// Handle mouse button input
    pub fn handle_mouse_button(&mut self, button: MouseButton, state: ElementState) {
        if button == MouseButton::Left {
            self.is_dragging = state == ElementState::Pressed;
            if !self.is_dragging {
                self.last_mouse_pos = None;
            }
        }
    }

    /// Handle mouse movement
    pub fn handle_mouse_move(&mut self, position: PhysicalPosition<f64>) {
        if self.is_dragging {
            if let Some(last_pos) = self.last_mouse_pos {
                let delta_x = (position.x - last_pos.x) as f32;
                let delta_y = (position.y - last_pos.y) as f32;

                self.accumulated_mouse_delta.x += delta_x;
                self.accumulated_mouse_delta.y += delta_y;
            }
            self.last_mouse_pos = Some(position);
        }
    }

    /// Handle mouse scroll for zooming
    pub fn handle_scroll(&mut self, delta: MouseScrollDelta) {
        let scroll_amount = match delta {
            MouseScrollDelta::LineDelta(_x, y) => y,
            MouseScrollDelta::PixelDelta(pos) => (pos.y / 100.0) as f32,
        };

        self.accumulated_scroll += scroll_amount;
    }

    /// Update camera state (call once per frame)
    pub fn update(&mut self, dt: f32) {
        // 1. ZOOM (scroll) - additive, constant speed regardless of distance
        if self.accumulated_scroll.abs() > 0.001 {
            self.target_distance -= self.accumulated_scroll * self.zoom_speed;
            self.target_distance = self.target_distance.max(Self::MIN_DISTANCE);
        }
        self.accumulated_scroll = 0.0;

        // Spring interpolation toward the target distance and rotation
        if self.enable_spring {
            let distance_error = self.target_distance - self.distance;
            let velocity = distance_error * self.spring_stiffness * dt;
            self.distance += velocity * (1.0 - self.spring_damping);

            self.rotation = self.rotation.slerp(
                self.target_rotation,
                self.spring_stiffness * dt * (1.0 - self.spring_damping),
            );
        } else {
            self.distance = self.target_distance;
            self.rotation = self.target_rotation;
        }

        // 2. ROTATION (mouse) - longitude/latitude around the up axis
        if self.accumulated_mouse_delta.length_squared() > 0.0 {
            let delta = self.accumulated_mouse_delta * self.mouse_sensitivity;

            // Yaw (longitude): rotate around the up direction
            let yaw_rotation = Quat::from_axis_angle(self.up_direction, -delta.x);
            self.target_rotation = yaw_rotation * self.target_rotation;

            // Pitch (latitude): rotate around the camera's right axis, but ensure
            // the right axis is perpendicular to the up direction to prevent tilt drift
            let camera_right = self.target_rotation * Vec3::X;
            let projected_right =
                camera_right - self.up_direction * camera_right.dot(self.up_direction);
            let right_axis = projected_right.normalize_or_zero();

            // Only apply pitch if we have a valid right axis (not looking straight up/down)
            if right_axis.length_squared() > 0.001 {
                let pitch_rotation = Quat::from_axis_angle(right_axis, -delta.y);
                self.target_rotation = pitch_rotation * self.target_rotation;
            }
            self.target_rotation = self.target_rotation.normalize();
        }
        self.accumulated_mouse_delta = Vec2::ZERO;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera_without_spring() -> OrbitCamera {
        let mut camera = OrbitCamera::new(2.5);
        camera.enable_spring = false;
        camera
    }

    #[test]
    fn initial_view_faces_the_origin() {
        let camera = OrbitCamera::new(2.5);
        let position = camera.position();

        assert!((position.length() - 2.5).abs() < 1e-4);
        assert!(position.y > 0.0, "camera should start above the volume");
        assert!(position.z > 0.0, "camera should start in front of the volume");

        let forward = camera.rotation * Vec3::NEG_Z;
        let to_center = (camera.center - position).normalize();
        assert!(forward.dot(to_center) > 0.999);
    }

    #[test]
    fn scroll_zooms_in_by_zoom_speed() {
        let mut camera = camera_without_spring();
        camera.handle_scroll(MouseScrollDelta::LineDelta(0.0, 2.0));
        camera.update(1.0 / 60.0);

        assert!((camera.distance - (2.5 - 2.0 * camera.zoom_speed)).abs() < 1e-5);
    }

    #[test]
    fn zoom_stops_at_minimum_distance() {
        let mut camera = camera_without_spring();
        camera.handle_scroll(MouseScrollDelta::LineDelta(0.0, 1000.0));
        camera.update(1.0 / 60.0);

        assert_eq!(camera.distance, OrbitCamera::MIN_DISTANCE);
    }

    #[test]
    fn horizontal_drag_preserves_height_and_distance() {
        let mut camera = camera_without_spring();
        let height_before = camera.position().y;

        camera.handle_mouse_button(MouseButton::Left, ElementState::Pressed);
        camera.handle_mouse_move(PhysicalPosition::new(0.0, 0.0));
        camera.handle_mouse_move(PhysicalPosition::new(200.0, 0.0));
        camera.update(1.0 / 60.0);
        // Mouse deltas land on the target; a second update settles the live state.
        camera.update(1.0 / 60.0);

        let position = camera.position();
        assert!((position.y - height_before).abs() < 1e-4);
        assert!((position.length() - 2.5).abs() < 1e-4);
        assert!(
            position.x.abs() > 0.1,
            "yaw should swing the camera sideways, got {position:?}"
        );
    }

    #[test]
    fn movement_without_drag_is_ignored() {
        let mut camera = camera_without_spring();
        let rotation_before = camera.rotation;

        camera.handle_mouse_move(PhysicalPosition::new(0.0, 0.0));
        camera.handle_mouse_move(PhysicalPosition::new(500.0, 300.0));
        camera.update(1.0 / 60.0);

        assert_eq!(camera.rotation, rotation_before);
    }

    #[test]
    fn releasing_the_button_clears_the_drag_anchor() {
        let mut camera = camera_without_spring();

        camera.handle_mouse_button(MouseButton::Left, ElementState::Pressed);
        camera.handle_mouse_move(PhysicalPosition::new(0.0, 0.0));
        camera.handle_mouse_button(MouseButton::Left, ElementState::Released);

        // A new drag must not inherit the old anchor point.
        camera.handle_mouse_button(MouseButton::Left, ElementState::Pressed);
        camera.handle_mouse_move(PhysicalPosition::new(400.0, 0.0));
        camera.update(1.0 / 60.0);

        assert_eq!(camera.rotation, camera.target_rotation);
        let forward = camera.rotation * Vec3::NEG_Z;
        let to_center = (camera.center - camera.position()).normalize();
        assert!(forward.dot(to_center) > 0.999);
    }
}
