//! GPU-resident volumetric texture with a precomputed mip chain.
//!
//! The volume is uploaded once per preset switch and never written again;
//! the extractor consumes it through blocking per-level readbacks.

use crate::voxel::extraction::expected_mip_levels;
use crate::voxel::presets::VolumeData;
use crate::voxel::VoxelError;

/// Mip-mapped RGBA8 3D texture plus the metadata the extractor needs.
pub struct VoxelVolume {
    texture: wgpu::Texture,
    texture_view: wgpu::TextureView,
    edge_length: u32,
    mip_level_count: u32,
}

impl VoxelVolume {
    /// Upload a CPU volume into a fresh GPU texture, every level populated.
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        data: &VolumeData,
    ) -> Result<Self, VoxelError> {
        validate_volume_data(data)?;

        let edge_length = data.edge_length;
        let mip_level_count = data.level_count();

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Voxel Volume Texture"),
            size: wgpu::Extent3d {
                width: edge_length,
                height: edge_length,
                depth_or_array_layers: edge_length,
            },
            mip_level_count,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D3,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_DST
                | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });

        for (level, mip) in data.mips.iter().enumerate() {
            let edge = edge_length >> level;
            queue.write_texture(
                wgpu::ImageCopyTexture {
                    texture: &texture,
                    mip_level: level as u32,
                    origin: wgpu::Origin3d::ZERO,
                    aspect: wgpu::TextureAspect::All,
                },
                mip,
                wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(edge * 4),
                    rows_per_image: Some(edge),
                },
                wgpu::Extent3d {
                    width: edge,
                    height: edge,
                    depth_or_array_layers: edge,
                },
            );
        }

        let texture_view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        log::info!(
            "Bound {0}x{0}x{0} voxel volume with {1} mip levels",
            edge_length,
            mip_level_count
        );

        Ok(Self {
            texture,
            texture_view,
            edge_length,
            mip_level_count,
        })
    }

    pub fn edge_length(&self) -> u32 {
        self.edge_length
    }

    pub fn mip_level_count(&self) -> u32 {
        self.mip_level_count
    }

    /// Sampled view over the full mip chain, for consumers that read the
    /// volume in shaders rather than through readback.
    pub fn texture_view(&self) -> &wgpu::TextureView {
        &self.texture_view
    }

    /// Blocking readback of one mip level.
    ///
    /// Copies the level into a mappable staging buffer, waits for the map,
    /// and returns tightly packed RGBA8 texels with x varying fastest, then
    /// y, then z. Runs at bind time and on preset switches only; this is a
    /// full GPU round trip and has no place in a frame.
    pub fn read_back_level(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        level: u32,
    ) -> Result<Vec<u8>, VoxelError> {
        if level >= self.mip_level_count {
            return Err(VoxelError::LevelOutOfRange {
                level,
                available: self.mip_level_count,
            });
        }

        let edge = self.edge_length >> level;
        let unpadded_bytes_per_row = edge * 4;
        // Texture to buffer copies require rows padded to the copy alignment.
        let padded = padded_bytes_per_row(unpadded_bytes_per_row);
        let buffer_size = padded as u64 * edge as u64 * edge as u64;

        let staging = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Voxel Readback Buffer"),
            size: buffer_size,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Voxel Readback Encoder"),
        });
        encoder.copy_texture_to_buffer(
            wgpu::ImageCopyTexture {
                texture: &self.texture,
                mip_level: level,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::ImageCopyBuffer {
                buffer: &staging,
                layout: wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(padded),
                    rows_per_image: Some(edge),
                },
            },
            wgpu::Extent3d {
                width: edge,
                height: edge,
                depth_or_array_layers: edge,
            },
        );
        queue.submit(std::iter::once(encoder.finish()));

        let slice = staging.slice(..);
        let (sender, receiver) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            sender.send(result).ok();
        });
        let _ = device.poll(wgpu::Maintain::Wait);
        receiver
            .recv()
            .map_err(|_| VoxelError::ReadbackChannelClosed)??;

        let view = slice.get_mapped_range();
        let texels = strip_row_padding(
            &view,
            unpadded_bytes_per_row as usize,
            padded as usize,
            (edge * edge) as usize,
        );
        drop(view);
        staging.unmap();

        Ok(texels)
    }
}

/// Check a CPU volume is uploadable: power-of-two edge, a complete mip
/// chain, and every level sized to its grid.
fn validate_volume_data(data: &VolumeData) -> Result<(), VoxelError> {
    if !data.edge_length.is_power_of_two() {
        return Err(VoxelError::EdgeNotPowerOfTwo(data.edge_length));
    }

    let expected = expected_mip_levels(data.edge_length);
    if data.level_count() != expected {
        return Err(VoxelError::MipCountMismatch {
            edge_length: data.edge_length,
            expected,
            actual: data.level_count(),
        });
    }

    for (level, mip) in data.mips.iter().enumerate() {
        let edge = (data.edge_length >> level) as usize;
        let expected = edge * edge * edge * 4;
        if mip.len() != expected {
            return Err(VoxelError::LevelSizeMismatch {
                level: level as u32,
                expected,
                actual: mip.len(),
            });
        }
    }

    Ok(())
}

fn padded_bytes_per_row(unpadded: u32) -> u32 {
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    ((unpadded + align - 1) / align) * align
}

/// Drop per-row copy padding, leaving tightly packed texels.
fn strip_row_padding(
    padded_data: &[u8],
    unpadded_bytes_per_row: usize,
    padded_bytes_per_row: usize,
    rows: usize,
) -> Vec<u8> {
    let mut out = Vec::with_capacity(unpadded_bytes_per_row * rows);
    for row in 0..rows {
        let start = row * padded_bytes_per_row;
        out.extend_from_slice(&padded_data[start..start + unpadded_bytes_per_row]);
    }
    out
}
