pub mod voxel_renderer;

pub use voxel_renderer::{VoxelDebugRenderer, VoxelInstance};
