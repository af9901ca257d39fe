//! Debug scene for walking a volume's mip chain.
//!
//! Owns the GPU volume, the extracted per-level instance records, the
//! level selection, and the instanced cube renderer. Rebuilding after a
//! preset switch replaces the records and index wholesale and re-clamps
//! the selected level, so stale metadata never survives a swap.

use crate::camera::OrbitCamera;
use crate::config::Settings;
use crate::rendering::VoxelDebugRenderer;
use crate::scene::Scene;
use crate::voxel::{
    extract_levels, presets, ExtractedLevels, LevelNavigator, VolumePreset, VoxelError,
    VoxelVolume,
};

/// Scene rendering one mip level of a voxel volume as instanced cubes.
pub struct VoxelDebugScene {
    /// GPU copy of the volume, mip chain included
    volume: VoxelVolume,
    /// Flat instance records plus the per-level index
    levels: ExtractedLevels,
    /// Clamped mip level selection
    navigator: LevelNavigator,
    /// Preset the volume was generated from
    preset: VolumePreset,
    /// Edge length of the base mip level
    edge_length: u32,
    /// Instanced cube renderer
    pub renderer: VoxelDebugRenderer,
    /// Camera controller
    pub camera: OrbitCamera,
}

impl VoxelDebugScene {
    /// Create the scene: generate the starting preset, bind it to the GPU,
    /// extract every mip level, and upload the instance records.
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        surface_config: &wgpu::SurfaceConfiguration,
        settings: &Settings,
    ) -> Result<Self, VoxelError> {
        let preset = settings.start_preset;
        let edge_length = settings.volume_edge_length;

        let data = presets::generate(preset, edge_length);
        let volume = VoxelVolume::new(device, queue, &data)?;
        let mips = Self::snapshot_mips(&volume, device, queue)?;
        let levels = extract_levels(edge_length, &mips)?;

        // The floor keeps an all-transparent preset from sizing the
        // instance buffer at zero.
        let capacity = levels.records.len().max(64);
        let mut renderer = VoxelDebugRenderer::new(device, surface_config, capacity);
        renderer.upload_records(device, queue, &levels.records);

        let mut navigator = LevelNavigator::new(levels.index.level_count());
        if navigator.set_level(settings.start_level as i32) {
            log::info!(
                "Start level {} out of range, clamped to {}",
                settings.start_level,
                navigator.current()
            );
        }

        let mut camera = OrbitCamera::new(settings.camera.distance);
        camera.mouse_sensitivity = settings.camera.mouse_sensitivity;
        camera.zoom_speed = settings.camera.zoom_speed;

        log::info!(
            "Voxel debug scene ready: preset {}, {} levels, {} instances",
            preset.name(),
            levels.index.level_count(),
            levels.index.total_count()
        );

        Ok(Self {
            volume,
            levels,
            navigator,
            preset,
            edge_length,
            renderer,
            camera,
        })
    }

    /// Read every mip level back from the GPU volume.
    fn snapshot_mips(
        volume: &VoxelVolume,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
    ) -> Result<Vec<Vec<u8>>, VoxelError> {
        (0..volume.mip_level_count())
            .map(|level| volume.read_back_level(device, queue, level))
            .collect()
    }

    /// Step the selected mip level by `delta`, clamping at the chain ends.
    pub fn step_level(&mut self, delta: i32) {
        let requested = self.navigator.current() as i32 + delta;
        if self.navigator.set_level(requested) {
            log::info!(
                "Mip level request {} clamped to {}",
                requested,
                self.navigator.current()
            );
        } else {
            log::info!(
                "Mip level {} ({} instances)",
                self.navigator.current(),
                self.visible_instance_count()
            );
        }
    }

    /// Switch to the next or previous preset and rebuild the volume.
    pub fn switch_preset(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        forward: bool,
    ) -> Result<(), VoxelError> {
        self.preset = if forward {
            self.preset.next()
        } else {
            self.preset.previous()
        };
        log::info!("Switching to preset {}", self.preset.name());
        self.rebuild(device, queue)
    }

    /// Regenerate the current preset from scratch.
    pub fn regenerate(&mut self, device: &wgpu::Device, queue: &wgpu::Queue) -> Result<(), VoxelError> {
        log::info!("Regenerating preset {}", self.preset.name());
        self.rebuild(device, queue)
    }

    /// Replace the volume, the extraction output, and the uploaded
    /// instance records, then re-clamp the level selection.
    fn rebuild(&mut self, device: &wgpu::Device, queue: &wgpu::Queue) -> Result<(), VoxelError> {
        let data = presets::generate(self.preset, self.edge_length);
        self.volume = VoxelVolume::new(device, queue, &data)?;
        let mips = Self::snapshot_mips(&self.volume, device, queue)?;
        self.levels = extract_levels(self.edge_length, &mips)?;
        self.renderer.upload_records(device, queue, &self.levels.records);
        self.navigator.rebind(self.levels.index.level_count());

        log::info!(
            "Rebuilt volume: {} levels, {} instances, level {} selected",
            self.levels.index.level_count(),
            self.levels.index.total_count(),
            self.navigator.current()
        );
        Ok(())
    }
}

impl Scene for VoxelDebugScene {
    fn update(&mut self, dt: f32) {
        self.camera.update(dt);
    }

    fn render(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, view: &wgpu::TextureView) {
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Voxel Debug Render Encoder"),
        });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Voxel Debug Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: 0.02,
                            g: 0.02,
                            b: 0.05,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: self.renderer.depth_view(),
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            // Exactly one level's slice of the shared instance buffer is
            // drawn; an empty level leaves the cleared background.
            if let Some(range) = self.levels.index.range(self.navigator.current()) {
                self.renderer.render_level(
                    &mut render_pass,
                    queue,
                    self.camera.position(),
                    self.camera.rotation,
                    range.instances(),
                );
            }
        }

        queue.submit(std::iter::once(encoder.finish()));
    }

    fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.renderer.resize(device, width, height);
    }

    fn camera(&self) -> &OrbitCamera {
        &self.camera
    }

    fn camera_mut(&mut self) -> &mut OrbitCamera {
        &mut self.camera
    }

    fn current_level(&self) -> u32 {
        self.navigator.current()
    }

    fn level_count(&self) -> u32 {
        self.navigator.level_count()
    }

    fn visible_instance_count(&self) -> u32 {
        self.levels
            .index
            .range(self.navigator.current())
            .map(|range| range.count)
            .unwrap_or(0)
    }

    fn preset_name(&self) -> &'static str {
        self.preset.name()
    }
}
