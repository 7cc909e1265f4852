//! Game settings and tuning constants
//!
//! Every physical constant the simulation reads lives here so a level can be
//! re-tuned from a JSON file without recompiling.

use std::fs;
use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure to load, save or validate settings
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to access settings file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid setting `{field}`: {reason}")]
    Invalid { field: &'static str, reason: &'static str },
}

/// Game settings/tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === World ===
    /// Downward gravity magnitude
    pub gravity: f32,
    /// Solver iteration counts handed to the physics engine
    pub position_iterations: usize,
    pub velocity_iterations: usize,
    /// Seed for cloud spawning
    pub seed: u64,

    // === Character ===
    pub icarus_lift_force: f32,
    pub icarus_side_force: f32,
    pub icarus_air_resistance: f32,
    /// Restoring spring toward level flight
    pub icarus_angular_k: f32,
    pub icarus_angular_damping: f32,
    /// Seconds of active flight until exhausted
    pub flight_duration: f32,
    /// Seconds of rest to recover from full exhaustion
    pub rest_duration: f32,
    /// Melt time scale; damage rate is `1 / (sun_distance * melt_duration)`
    pub melt_duration: f32,
    /// Sun exposure does no damage and exhaustion never drops the character
    pub immortal: bool,

    // === Clouds ===
    /// Shadow reach below a cloud (also the shading threshold)
    pub shadow_length: f32,
    pub cloud_height: f32,
    /// Number of drifting clouds kept alive
    pub cloud_count: usize,
    pub cloud_max_x: f32,
    pub cloud_min_y: f32,
    pub cloud_max_y: f32,
    pub cloud_min_dx: f32,
    pub cloud_max_dx: f32,

    // === Camera / presentation ===
    pub camera_offset: Vec2,
    pub camera_min_y: f32,
    pub camera_max_y: f32,
    pub island_offset: Vec2,
    pub sky_color: [f32; 3],
    pub sea_color: [f32; 3],
    pub shadow_color: [f32; 3],
    pub fade_tone_duration: f32,
    pub fade_alpha_duration: f32,

    // === Window ===
    pub fullscreen: bool,
    /// Show FPS counter
    pub show_fps: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            gravity: 10.0,
            position_iterations: 10,
            velocity_iterations: 8,
            seed: 0x1C4_2005,

            icarus_lift_force: 15.0,
            icarus_side_force: 5.0,
            icarus_air_resistance: 0.5,
            icarus_angular_k: 1.0,
            icarus_angular_damping: 0.3,
            flight_duration: 10.0,
            rest_duration: 3.0,
            melt_duration: 0.2,
            immortal: false,

            shadow_length: 20.0,
            cloud_height: 1.0,
            cloud_count: 12,
            cloud_max_x: 30.0,
            cloud_min_y: 5.0,
            cloud_max_y: 95.0,
            cloud_min_dx: 0.5,
            cloud_max_dx: 2.0,

            camera_offset: Vec2::new(0.0, 2.0),
            camera_min_y: 5.0,
            camera_max_y: 95.0,
            island_offset: Vec2::new(0.0, 0.5),
            sky_color: [0.55, 0.75, 1.0],
            sea_color: [0.1, 0.3, 0.6],
            shadow_color: [0.4, 0.55, 0.8],
            fade_tone_duration: 1.0,
            fade_alpha_duration: 1.0,

            fullscreen: false,
            show_fps: false,
        }
    }
}

impl Settings {
    /// Load settings from a JSON file and validate them
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let json = fs::read_to_string(path.as_ref())?;
        let settings = Self::from_json(&json)?;
        log::info!("Loaded settings from {}", path.as_ref().display());
        Ok(settings)
    }

    /// Load settings, falling back to defaults when the file is missing or bad
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load(path.as_ref()) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("Using default settings ({})", e);
                Self::default()
            }
        }
    }

    /// Parse and validate settings from a JSON string
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Save settings as pretty JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SettingsError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path.as_ref(), json)?;
        log::info!("Settings saved to {}", path.as_ref().display());
        Ok(())
    }

    /// Check every constant that is used as a divisor or a sampling range
    pub fn validate(&self) -> Result<(), SettingsError> {
        fn positive(field: &'static str, value: f32) -> Result<(), SettingsError> {
            if value > 0.0 && value.is_finite() {
                Ok(())
            } else {
                Err(SettingsError::Invalid {
                    field,
                    reason: "must be positive",
                })
            }
        }

        positive("flight_duration", self.flight_duration)?;
        positive("rest_duration", self.rest_duration)?;
        positive("melt_duration", self.melt_duration)?;
        positive("fade_tone_duration", self.fade_tone_duration)?;
        positive("fade_alpha_duration", self.fade_alpha_duration)?;
        positive("shadow_length", self.shadow_length)?;
        positive("cloud_height", self.cloud_height)?;
        positive("cloud_max_x", self.cloud_max_x)?;

        if self.position_iterations == 0 || self.velocity_iterations == 0 {
            return Err(SettingsError::Invalid {
                field: "velocity_iterations",
                reason: "iteration counts must be at least 1",
            });
        }
        if self.cloud_min_y > self.cloud_max_y {
            return Err(SettingsError::Invalid {
                field: "cloud_min_y",
                reason: "must not exceed cloud_max_y",
            });
        }
        if self.cloud_min_dx < 0.0 || self.cloud_min_dx > self.cloud_max_dx {
            return Err(SettingsError::Invalid {
                field: "cloud_min_dx",
                reason: "must be non-negative and not exceed cloud_max_dx",
            });
        }
        if self.camera_min_y > self.camera_max_y {
            return Err(SettingsError::Invalid {
                field: "camera_min_y",
                reason: "must not exceed camera_max_y",
            });
        }
        Ok(())
    }
}
