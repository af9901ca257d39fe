//! # Voxel Mip Viewer: Sparse Voxel Debug Visualization
//!
//! Voxel Mip Viewer renders the mip chain of a volumetric RGBA8 texture as
//! instanced unit cubes, one mip level on screen at a time. It is the
//! debug-draw companion to sparse voxel pipelines: when cone tracing or
//! ray marching misbehaves, stepping through the levels shows exactly what
//! the coarser mips contain.
//!
//! ## Architecture Overview
//!
//! The codebase is organized into four main subsystems:
//!
//! ### 1. Voxel Core ([`voxel`])
//!
//! Everything that turns a volume into drawable records:
//! - [`voxel::presets`] - Procedural RGBA8 volumes with CPU-built mip chains
//! - [`voxel::VoxelVolume`] - The GPU 3D texture plus blocking mip readback
//! - [`voxel::extract_levels`] - Walks every mip level, keeps occupied cells,
//!   and packs them into one flat record buffer with a per-level index
//! - [`voxel::LevelNavigator`] - Clamped selection of the level on screen
//!
//! **Key Design**: extraction runs once per volume, not per frame. A frame
//! only selects a contiguous slice of the prebuilt instance buffer.
//!
//! ### 2. Rendering ([`rendering`])
//!
//! GPU visualization using wgpu:
//! - [`rendering::VoxelDebugRenderer`] - Instanced cube rendering of one
//!   level's slice of the shared instance buffer
//!
//! **Key Design**: a single draw call per frame, ranged over the selected
//! level's instances.
//!
//! ### 3. Scene ([`scene`])
//!
//! - [`scene::Scene`] - Interface the shell drives each frame
//! - [`scene::VoxelDebugScene`] - Owns the volume, the extraction output,
//!   the level selection, and the renderer; rebuilds on preset switches
//!
//! ### 4. Shell ([`app`], [`camera`], [`config`])
//!
//! - [`app::App`] - wgpu setup, window events, and the frame loop
//! - [`camera::OrbitCamera`] - Orbit camera with spring smoothing
//! - [`config::Settings`] - RON settings with safe fallbacks
//!
//! ## Data Flow
//!
//! ```text
//! Preset → Volume Upload → Mip Readback → Extraction → Instance Buffer
//!                                                          ↓
//!             Input Events → Level Selection → Ranged Instanced Draw
//! ```
//!
//! ## Dependencies
//!
//! - **Graphics**: `wgpu` (GPU abstraction), `winit` (windowing)
//! - **Math**: `glam` (SIMD math types), `bytemuck` (safe transmutation)
//! - **Serialization**: `serde` + `ron` (human-readable config files)
//! - **Diagnostics**: `log` + `env_logger` (structured logging),
//!   `thiserror` (error enums)

pub mod app;
pub mod camera;
pub mod config;
pub mod rendering;
pub mod scene;
pub mod voxel;
