//! Scene trait definition.
//!
//! Defines the common interface the application shell drives each frame.

use crate::camera::OrbitCamera;

/// Common interface for scenes.
///
/// Each scene manages its own state, renderer, and camera. The App
/// delegates to the active scene for updates and rendering.
pub trait Scene {
    /// Update the scene by the given delta time.
    fn update(&mut self, dt: f32);

    /// Render the scene to the given texture view.
    fn render(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        view: &wgpu::TextureView,
    );

    /// Handle window resize.
    fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32);

    /// Get a reference to the orbit camera.
    fn camera(&self) -> &OrbitCamera;

    /// Get a mutable reference to the orbit camera.
    fn camera_mut(&mut self) -> &mut OrbitCamera;

    /// Get the mip level currently on screen.
    fn current_level(&self) -> u32;

    /// Get the number of mip levels in the loaded volume.
    fn level_count(&self) -> u32;

    /// Get the number of instances drawn for the current level.
    fn visible_instance_count(&self) -> u32;

    /// Get the display name of the active volume preset.
    fn preset_name(&self) -> &'static str;
}
