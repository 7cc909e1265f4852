//! Game screen state
//!
//! The screen owns the physics world and every actor in it, the fade overlay,
//! pending timers and the queue of sound cues for the presentation layer.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::environment::{CloudField, CloudSpawn, Island, Sun, Temple};
use super::fade::Fade;
use super::icarus::Icarus;
use super::input::{Control, ControlSet};
use super::timer::Timers;
use crate::audio::SoundCue;
use crate::consts::*;
use crate::physics::{Bounds, PhysicsWorld};
use crate::settings::Settings;

/// Static layout of a level
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Level {
    pub sun: Vec2,
    pub spawn: Vec2,
    pub island: Vec2,
    /// The goal temple
    pub gates: Vec2,
    /// Temples, each standing on a solid cloud
    pub temples: Vec<Vec2>,
    /// Anchored sensor clouds that only cast shade
    pub sky_clouds: Vec<Vec2>,
    pub bounds: Bounds,
}

impl Level {
    /// The climb from the island up to the pearly gates
    pub fn reference() -> Self {
        Self {
            sun: Vec2::new(0.0, 100.0),
            spawn: Vec2::new(2.0, 1.5),
            island: Vec2::ZERO,
            gates: Vec2::new(10.0, 90.0),
            temples: vec![
                Vec2::new(-10.0, 80.0),
                Vec2::new(-15.0, 70.0),
                Vec2::new(10.0, 60.0),
                Vec2::new(-20.0, 50.0),
                Vec2::new(25.0, 40.0),
                Vec2::new(15.0, 30.0),
                Vec2::new(5.0, 20.0),
                Vec2::new(-10.0, 10.0),
            ],
            sky_clouds: vec![Vec2::new(5.0, 95.0), Vec2::new(1.5, 8.0)],
            bounds: Bounds::default(),
        }
    }
}

impl Default for Level {
    fn default() -> Self {
        Self::reference()
    }
}

/// Deferred screen events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    /// Replace the fallen character
    Respawn,
    /// Leave the screen after reaching the gates
    Win,
    /// Let the flap cue fire again
    ClearFlap,
}

/// Why the screen was torn down
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExitReason {
    Won,
    Menu,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScreenStatus {
    Running,
    Exited(ExitReason),
}

/// A running game session
pub struct GameScreen {
    pub settings: Settings,
    pub level: Level,
    pub world: PhysicsWorld,
    pub sun: Sun,
    pub clouds: CloudField,
    pub island: Island,
    pub temples: Vec<Temple>,
    pub icarus: Icarus,
    pub controls: ControlSet,
    pub fade: Fade,
    pub timers: Timers<TimerEvent>,
    pub(crate) rng: Pcg32,
    /// Wall-clock seconds fed to the screen so far
    pub time: f64,
    /// Fixed ticks simulated so far
    pub time_ticks: u64,
    pub respawning: bool,
    pub winning: bool,
    /// Characters lost so far
    pub deaths: u32,
    status: ScreenStatus,
    pub(crate) cues: Vec<SoundCue>,
}

impl GameScreen {
    pub fn new(settings: Settings) -> Self {
        Self::with_level(settings, Level::reference())
    }

    /// Build a screen for `level`. Settings that fail validation are replaced
    /// by the defaults.
    pub fn with_level(settings: Settings, level: Level) -> Self {
        let settings = match settings.validate() {
            Ok(()) => settings,
            Err(e) => {
                log::warn!("Rejected settings ({}), using defaults", e);
                Settings::default()
            }
        };
        let mut world = PhysicsWorld::new(level.bounds, settings.gravity);
        let mut rng = Pcg32::seed_from_u64(settings.seed);
        let mut clouds = CloudField::new();
        let mut temples = Vec::with_capacity(level.temples.len() + 1);

        for &pos in &level.sky_clouds {
            clouds.spawn(&mut world, CloudSpawn::anchored(pos, true), settings.cloud_height);
        }
        let gates = std::iter::once((level.gates, true));
        let others = level.temples.iter().map(|&pos| (pos, false));
        for (position, is_gates) in gates.chain(others) {
            temples.push(Temple { position, is_gates });
            let platform = position - Vec2::new(0.0, TEMPLE_CLOUD_DROP);
            clouds.spawn(
                &mut world,
                CloudSpawn::anchored(platform, false),
                settings.cloud_height,
            );
        }
        let island = Island::spawn(&mut world, level.island, settings.island_offset);
        clouds.populate(&mut world, &mut rng, &settings, true);

        let icarus = Icarus::spawn(&mut world, level.spawn, &settings);
        let fade = Fade::new(settings.fade_tone_duration, settings.fade_alpha_duration);

        log::info!(
            "Game screen started: seed {}, {} clouds, {} temples",
            settings.seed,
            clouds.len(),
            temples.len()
        );

        Self {
            sun: Sun::new(level.sun),
            timers: Timers::new(SIM_DT),
            settings,
            level,
            world,
            clouds,
            island,
            temples,
            icarus,
            controls: ControlSet::new(),
            fade,
            rng,
            time: 0.0,
            time_ticks: 0,
            respawning: false,
            winning: false,
            deaths: 0,
            status: ScreenStatus::Running,
            cues: vec![SoundCue::WindLoopStart, SoundCue::LevelStart],
        }
    }

    /// Simulated time, always a whole number of ticks
    pub fn world_time(&self) -> f64 {
        self.time_ticks as f64 * SIM_DT
    }

    pub fn status(&self) -> ScreenStatus {
        self.status
    }

    pub fn is_running(&self) -> bool {
        self.status == ScreenStatus::Running
    }

    pub fn key_down(&mut self, control: Control) {
        if !self.is_running() {
            return;
        }
        if control == Control::Menu {
            self.teardown(ExitReason::Menu);
        } else {
            self.controls.press(control);
        }
    }

    pub fn key_up(&mut self, control: Control) {
        self.controls.release(control);
    }

    /// Feed wall-clock seconds; returns the number of fixed ticks run
    pub fn update(&mut self, elapsed: f64) -> u32 {
        super::tick::advance(self, elapsed)
    }

    /// Take the sound cues queued since the last call
    pub fn drain_cues(&mut self) -> Vec<SoundCue> {
        std::mem::take(&mut self.cues)
    }

    pub(crate) fn push_cue(&mut self, cue: SoundCue) {
        self.cues.push(cue);
    }

    /// Replace the current character with a fresh one at the spawn point
    pub fn respawn(&mut self) {
        self.respawning = false;
        self.deaths += 1;
        let fresh = Icarus::spawn(&mut self.world, self.level.spawn, &self.settings);
        let fallen = std::mem::replace(&mut self.icarus, fresh);
        fallen.despawn(&mut self.world);

        // The old character's cooldown must not leak into the new one
        self.timers.cancel(|e| *e == TimerEvent::ClearFlap);
        self.fade.request(false, false);
        self.push_cue(SoundCue::LevelStart);
        log::info!("Respawned (deaths: {})", self.deaths);
    }

    /// Stop the session: cancel every timer and silence audio
    pub fn teardown(&mut self, reason: ExitReason) {
        if !self.is_running() {
            return;
        }
        self.timers.clear();
        self.controls.release_all();
        self.push_cue(SoundCue::PauseAll);
        self.status = ScreenStatus::Exited(reason);
        log::info!("Game screen closed: {:?}", reason);
    }
}
