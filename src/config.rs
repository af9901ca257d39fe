//! Viewer settings loaded from `settings.ron`.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::camera::OrbitCamera;
use crate::voxel::VolumePreset;

/// Edge length used when the configured one cannot drive a mip chain.
const FALLBACK_EDGE_LENGTH: u32 = 32;

/// Viewer configuration.
///
/// Loaded from a RON file next to the executable. The shell falls back to
/// `Settings::default()` when the file is absent or malformed, so startup
/// never blocks on configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Initial window width in physical pixels
    pub window_width: u32,

    /// Initial window height in physical pixels
    pub window_height: u32,

    /// Edge length of the generated volume; must be a power of two
    pub volume_edge_length: u32,

    /// Preset filled into the volume at startup
    pub start_preset: VolumePreset,

    /// Mip level selected at startup (clamped to the available chain)
    pub start_level: u32,

    /// Camera tuning
    pub camera: CameraSettings,
}

/// Orbit camera tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraSettings {
    /// Orbit distance from the volume center
    pub distance: f32,

    /// Radians of rotation per pixel of mouse drag
    pub mouse_sensitivity: f32,

    /// Zoom units per scroll line
    pub zoom_speed: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            window_width: 600,
            window_height: 400,
            volume_edge_length: 32,
            start_preset: VolumePreset::default(),
            start_level: 0,
            camera: CameraSettings::default(),
        }
    }
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            distance: 2.5,
            mouse_sensitivity: 0.003,
            zoom_speed: 0.25,
        }
    }
}

impl Settings {
    /// Load settings from a RON file.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let contents = std::fs::read_to_string(path)?;
        let settings: Self = ron::from_str(&contents)?;
        Ok(settings.sanitized())
    }

    /// Clamp fields the rest of the viewer relies on.
    fn sanitized(mut self) -> Self {
        if self.volume_edge_length == 0 || !self.volume_edge_length.is_power_of_two() {
            log::warn!(
                "Volume edge length {} is not a power of two, using {}",
                self.volume_edge_length,
                FALLBACK_EDGE_LENGTH
            );
            self.volume_edge_length = FALLBACK_EDGE_LENGTH;
        }
        self.window_width = self.window_width.max(1);
        self.window_height = self.window_height.max(1);
        self.camera.distance = self.camera.distance.max(OrbitCamera::MIN_DISTANCE);
        self
    }
}

/// Error type for settings loading.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON parse error: {0}")]
    Ron(#[from] ron::error::SpannedError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_demo_window() {
        let settings = Settings::default();
        assert_eq!(settings.window_width, 600);
        assert_eq!(settings.window_height, 400);
        assert_eq!(settings.volume_edge_length, 32);
        assert_eq!(settings.start_level, 0);
    }

    #[test]
    fn parses_a_full_settings_file() {
        let text = "(
            window_width: 800,
            window_height: 600,
            volume_edge_length: 64,
            start_preset: Shell,
            start_level: 2,
            camera: (
                distance: 3.0,
                mouse_sensitivity: 0.004,
                zoom_speed: 0.3,
            ),
        )";

        let settings: Settings = ron::from_str(text).unwrap();
        assert_eq!(settings.volume_edge_length, 64);
        assert_eq!(settings.start_preset, VolumePreset::Shell);
        assert_eq!(settings.start_level, 2);
        assert_eq!(settings.camera.distance, 3.0);
    }

    #[test]
    fn default_settings_round_trip_through_ron() {
        let settings = Settings::default();
        let text =
            ron::ser::to_string_pretty(&settings, ron::ser::PrettyConfig::default()).unwrap();
        let parsed: Settings = ron::from_str(&text).unwrap();
        assert_eq!(parsed, settings);
    }

    #[test]
    fn sanitize_replaces_a_bad_edge_length() {
        let mut settings = Settings::default();
        settings.volume_edge_length = 12;
        assert_eq!(settings.sanitized().volume_edge_length, FALLBACK_EDGE_LENGTH);

        let mut settings = Settings::default();
        settings.volume_edge_length = 0;
        assert_eq!(settings.sanitized().volume_edge_length, FALLBACK_EDGE_LENGTH);
    }

    #[test]
    fn sanitize_keeps_a_valid_edge_length() {
        let mut settings = Settings::default();
        settings.volume_edge_length = 128;
        assert_eq!(settings.sanitized().volume_edge_length, 128);
    }

    #[test]
    fn sanitize_keeps_the_camera_outside_the_volume() {
        let mut settings = Settings::default();
        settings.camera.distance = 0.0;
        assert_eq!(settings.sanitized().camera.distance, OrbitCamera::MIN_DISTANCE);
    }
}
