//! # Voxel Mip Viewer Entry Point
//!
//! This is the main entry point for the voxel mip viewer. The actual
//! application logic is implemented in the `app` module.
//!
//! ## Quick Start
//!
//! The viewer fills a volumetric texture from a procedural preset, extracts
//! every mip level into an instanced cube buffer, and draws one level at a
//! time:
//! - `+` / `-` step the mip level up and down
//! - `.` / `,` cycle through the volume presets
//! - `R` regenerates the current preset
//! - Left mouse drag orbits, the scroll wheel zooms, `Escape` closes
//!
//! Settings are read from `settings.ron` in the working directory; missing
//! or malformed files fall back to built-in defaults.
//!
//! See the `lib.rs` module documentation for architecture details.

fn main() {
    // Initialize and run the viewer
    // All setup, event handling, and rendering is managed by the App struct
    voxel_mip_viewer::app::run();
}
