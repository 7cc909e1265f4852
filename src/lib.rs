//! Icarus - fly from the island to the pearly gates without melting
//!
//! Core modules:
//! - `sim`: Fixed-step simulation (character state machine, clouds, fade, timers)
//! - `physics`: Thin facade over the rapier2d rigid-body world
//! - `settings`: Tunable game constants, JSON load/save
//! - `audio`: Sound cue dispatch to a pluggable backend
//! - `presentation`: Read-only frame snapshots for a renderer

pub mod audio;
pub mod physics;
pub mod presentation;
pub mod settings;
pub mod sim;

pub use settings::{Settings, SettingsError};

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f64 = 1.0 / 60.0;

    /// Cloud distance reported when nothing shades the character
    pub const NO_SHADOW_DISTANCE: f32 = 1000.0;
    /// Length of the downward ground probe from the character's center
    pub const GROUND_PROBE_LENGTH: f32 = 0.6;
    /// Seconds before the flap cue may fire again
    pub const FLAP_COOLDOWN_SECS: f64 = 1.0;

    /// Character body
    pub const ICARUS_RADIUS: f32 = 0.5;
    pub const ICARUS_DENSITY: f32 = 1.0;
    /// Target walking speed (drive force is `WALK_DRIVE * dir - velocity`)
    pub const WALK_DRIVE: f32 = 10.0;

    /// Cloud body
    pub const CLOUD_WIDTH: f32 = 4.5;
    pub const CLOUD_DENSITY: f32 = 1.0;
    /// Temple platforms sit this far below the temple sprite
    pub const TEMPLE_CLOUD_DROP: f32 = 1.5;

    /// Vertical distance from the gates that counts as arrival
    pub const WIN_HEIGHT_TOLERANCE: f32 = 2.0;

    /// World units visible vertically on screen
    pub const VIEW_HEIGHT: f32 = 15.0;
    /// Sea surface height (rendering only)
    pub const SEA_LEVEL: f32 = 1.5;
}

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::PI;
    while angle >= PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}

/// Sign of the horizontal input: -1 for left only, 1 for right only, 0 otherwise
#[inline]
pub fn axis(negative: bool, positive: bool) -> f32 {
    positive as i32 as f32 - negative as i32 as f32
}
