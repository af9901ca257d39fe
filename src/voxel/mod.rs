//! Sparse voxel volume handling.
//!
//! This module covers the path from a mip-mapped RGBA8 volume to renderable
//! instances: procedural presets build CPU volumes, `VoxelVolume` holds the
//! GPU texture and reads levels back, `extraction` turns read-back texels
//! into the flat record sequence, and `LevelNavigator` picks the level that
//! gets drawn.

pub mod extraction;
pub mod navigator;
pub mod presets;
pub mod volume;

pub use extraction::{expected_mip_levels, extract_levels, ExtractedLevels, LevelIndex, LevelRange};
pub use navigator::LevelNavigator;
pub use presets::{VolumeData, VolumePreset};
pub use volume::VoxelVolume;

/// Contract violations around volume binding, readback and extraction.
///
/// Out-of-range navigation is deliberately absent: level requests clamp
/// and report instead of failing.
#[derive(Debug, thiserror::Error)]
pub enum VoxelError {
    #[error("volume edge length {0} is not a positive power of two")]
    EdgeNotPowerOfTwo(u32),

    #[error("expected {expected} mip levels for edge length {edge_length}, got {actual}")]
    MipCountMismatch {
        edge_length: u32,
        expected: u32,
        actual: u32,
    },

    #[error("mip level {level} holds {actual} bytes, expected {expected}")]
    LevelSizeMismatch {
        level: u32,
        expected: usize,
        actual: usize,
    },

    #[error("mip level {level} is out of range for a volume with {available} levels")]
    LevelOutOfRange { level: u32, available: u32 },

    #[error("voxel readback map failed: {0}")]
    Readback(#[from] wgpu::BufferAsyncError),

    #[error("voxel readback channel closed before the map completed")]
    ReadbackChannelClosed,
}
