//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (clouds by spawn ID)
//! - No rendering or audio device dependencies

pub mod environment;
pub mod fade;
pub mod icarus;
pub mod input;
pub mod meter;
pub mod state;
pub mod tick;
pub mod timer;

pub use environment::{Cloud, CloudField, CloudSpawn, Island, ShadowQuad, Sun, Temple, shadow_quad};
pub use fade::Fade;
pub use icarus::{Icarus, Locomotion, StepContext, StepReport};
pub use input::{Control, ControlSet};
pub use meter::Meter;
pub use state::{ExitReason, GameScreen, Level, ScreenStatus, TimerEvent};
pub use tick::{advance, tick};
pub use timer::Timers;
