//! Scene layer for the voxel mip viewer.
//!
//! This module provides the scene abstraction and the debug scene that
//! walks a volume's mip chain.

pub mod debug_scene;
pub mod traits;

pub use debug_scene::VoxelDebugScene;
pub use traits::Scene;
