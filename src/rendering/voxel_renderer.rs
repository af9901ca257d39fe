//! Instanced cube rendering of extracted voxel levels.
//!
//! One static unit cube (8 vertices, 36 indices) is shared by every
//! instance; the occupied voxels of all mip levels ride in a single
//! instance buffer. A draw selects one level by restricting the instanced
//! draw call to that level's contiguous instance range.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Quat, Vec3};
use std::ops::Range;
use wgpu::util::DeviceExt;

/// Instance data for one occupied voxel cell.
///
/// This is the record format the mip extractor emits and the layout the
/// vertex shader reads per instance: translation, uniform edge scale,
/// normalized RGBA color.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct VoxelInstance {
    /// World position of the cell center
    pub position: [f32; 3],
    /// Edge length of the cell's cube
    pub scale: f32,
    /// Texel color with every channel divided by 255
    pub color: [f32; 4],
}

// Compile-time assertions to verify struct layout matches shader expectations
const _: () = assert!(
    std::mem::size_of::<VoxelInstance>() == 32,
    "VoxelInstance must be exactly 32 bytes to match shader layout"
);
const _: () = assert!(std::mem::align_of::<VoxelInstance>() == 4);

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct CameraUniform {
    view_proj: [[f32; 4]; 4],
    camera_pos: [f32; 3],
    _padding: f32,
}

/// Renderer for extracted voxel levels using GPU instancing.
pub struct VoxelDebugRenderer {
    pipeline: wgpu::RenderPipeline,
    /// Cube geometry shared by all instances
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
    /// Flat per-voxel records, all levels back to back
    instance_buffer: wgpu::Buffer,
    instance_capacity: usize,
    camera_bind_group: wgpu::BindGroup,
    camera_buffer: wgpu::Buffer,
    #[allow(dead_code)]
    depth_texture: wgpu::Texture,
    depth_view: wgpu::TextureView,
    width: u32,
    height: u32,
}

impl VoxelDebugRenderer {
    /// Create a new renderer with room for `capacity` voxel instances.
    pub fn new(
        device: &wgpu::Device,
        config: &wgpu::SurfaceConfiguration,
        capacity: usize,
    ) -> Self {
        let width = config.width;
        let height = config.height;

        let (vertices, indices) = Self::create_cube_geometry();

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Voxel Cube Vertex Buffer"),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Voxel Cube Index Buffer"),
            contents: bytemuck::cast_slice(&indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        let index_count = indices.len() as u32;

        let instance_buffer = Self::create_instance_buffer(device, capacity);

        // Create camera uniform buffer
        let camera_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Voxel Camera Buffer"),
            size: std::mem::size_of::<CameraUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let camera_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Voxel Camera Bind Group Layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });

        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Voxel Camera Bind Group"),
            layout: &camera_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Voxel Debug Shader"),
            source: wgpu::ShaderSource::Wgsl(
                include_str!("../../shaders/voxel_debug.wgsl").into(),
            ),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Voxel Debug Pipeline Layout"),
            bind_group_layouts: &[&camera_bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Voxel Debug Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[
                    // Vertex buffer (cube corner position)
                    wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &wgpu::vertex_attr_array![0 => Float32x3],
                    },
                    // Instance buffer
                    wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<VoxelInstance>()
                            as wgpu::BufferAddress,
                        step_mode: wgpu::VertexStepMode::Instance,
                        attributes: &wgpu::vertex_attr_array![
                            1 => Float32x3,  // position
                            2 => Float32,    // scale
                            3 => Float32x4,  // color
                        ],
                    },
                ],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: config.format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: Some(wgpu::Face::Back),
                unclipped_depth: false,
                polygon_mode: wgpu::PolygonMode::Fill,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: wgpu::TextureFormat::Depth32Float,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
            cache: None,
        });

        let (depth_texture, depth_view) = Self::create_depth_texture(device, width, height);

        Self {
            pipeline,
            vertex_buffer,
            index_buffer,
            index_count,
            instance_buffer,
            instance_capacity: capacity,
            camera_bind_group,
            camera_buffer,
            depth_texture,
            depth_view,
            width,
            height,
        }
    }

    /// Cube geometry shared by every instance: a unit cube centered at the
    /// origin, 12 triangles wound counter-clockwise when seen from outside.
    fn create_cube_geometry() -> (Vec<[f32; 3]>, Vec<u16>) {
        let vertices = vec![
            [-0.5, -0.5, -0.5],
            [-0.5, -0.5, 0.5],
            [-0.5, 0.5, 0.5],
            [-0.5, 0.5, -0.5],
            [0.5, 0.5, -0.5],
            [0.5, -0.5, -0.5],
            [0.5, 0.5, 0.5],
            [0.5, -0.5, 0.5],
        ];

        let indices = vec![
            0, 1, 2, 0, 2, 3, // -X
            3, 4, 5, 3, 5, 0, // -Z
            4, 6, 7, 4, 7, 5, // +X
            1, 7, 6, 1, 6, 2, // +Z
            1, 0, 5, 1, 5, 7, // -Y
            6, 4, 3, 6, 3, 2, // +Y
        ];

        (vertices, indices)
    }

    fn create_instance_buffer(device: &wgpu::Device, capacity: usize) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Voxel Instance Buffer"),
            size: (capacity.max(1) * std::mem::size_of::<VoxelInstance>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    fn create_depth_texture(
        device: &wgpu::Device,
        width: u32,
        height: u32,
    ) -> (wgpu::Texture, wgpu::TextureView) {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Voxel Depth Texture"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Depth32Float,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        (texture, view)
    }

    /// Replace the entire instance buffer with a fresh flat record sequence.
    ///
    /// Every rebuild is a full replace; instance ranges captured from a
    /// previous upload are invalid afterwards. Grows the buffer when the
    /// new sequence does not fit.
    pub fn upload_records(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        records: &[VoxelInstance],
    ) {
        if records.len() > self.instance_capacity {
            log::warn!(
                "Voxel instance buffer full: {} > {}. Reallocating.",
                records.len(),
                self.instance_capacity
            );
            self.instance_buffer = Self::create_instance_buffer(device, records.len());
            self.instance_capacity = records.len();
        }

        if !records.is_empty() {
            queue.write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(records));
        }
    }

    /// Depth attachment matching the current surface size.
    pub fn depth_view(&self) -> &wgpu::TextureView {
        &self.depth_view
    }

    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.width = width;
        self.height = height;

        let (depth_texture, depth_view) = Self::create_depth_texture(device, width, height);
        self.depth_texture = depth_texture;
        self.depth_view = depth_view;
    }

    /// Draw one mip level: a single indexed, instanced draw over the level's
    /// contiguous `offset..offset + count` slice of the record sequence.
    ///
    /// An empty range is a valid no-op.
    pub fn render_level(
        &self,
        render_pass: &mut wgpu::RenderPass<'_>,
        queue: &wgpu::Queue,
        camera_pos: Vec3,
        camera_rotation: Quat,
        instances: Range<u32>,
    ) {
        if instances.is_empty() {
            return;
        }

        // Update camera uniform
        let view_matrix = Mat4::look_at_rh(
            camera_pos,
            camera_pos + camera_rotation * Vec3::NEG_Z,
            camera_rotation * Vec3::Y,
        );
        let aspect = self.width as f32 / self.height as f32;
        let proj_matrix = Mat4::perspective_rh(45.0_f32.to_radians(), aspect, 0.01, 100.0);
        let view_proj = proj_matrix * view_matrix;

        let camera_uniform = CameraUniform {
            view_proj: view_proj.to_cols_array_2d(),
            camera_pos: camera_pos.to_array(),
            _padding: 0.0,
        };
        queue.write_buffer(&self.camera_buffer, 0, bytemuck::bytes_of(&camera_uniform));

        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(0, &self.camera_bind_group, &[]);
        render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        render_pass.set_vertex_buffer(1, self.instance_buffer.slice(..));
        render_pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint16);
        render_pass.draw_indexed(0..self.index_count, 0, instances);
    }
}
