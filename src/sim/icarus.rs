//! The winged character
//!
//! Icarus owns one circular body and a small state machine:
//!
//! - `Flying`: flaps (lift), steers (side force) and feels air drag.
//!   Active flight tires him; heavy fatigue or damage weakens the lift.
//! - `Standing`: rests on solid ground, recovering from fatigue.
//! - `Walking`: drives along the ground toward a fixed walking speed.
//! - `Falling`: exhausted, melted or in the sea. Tumbles head-first until
//!   the screen respawns a fresh character.
//!
//! Sun exposure is checked every tick: a ray toward the sun that meets a
//! cloud within `shadow_length` means shade; otherwise wax melts at a rate
//! inversely proportional to the distance to the sun.

use std::f32::consts::PI;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::input::ControlSet;
use super::meter::Meter;
use crate::audio::SoundCue;
use crate::consts::*;
use crate::normalize_angle;
use crate::physics::{BodyDef, BodyHandle, BodyState, BodyTag, PhysicsWorld, Shape};
use crate::settings::Settings;

/// Locomotion state. Exactly one is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Locomotion {
    Flying,
    Standing,
    Walking,
    Falling,
}

impl Locomotion {
    /// Feet on the ground (walking sprite)
    pub fn is_grounded(&self) -> bool {
        matches!(self, Locomotion::Standing | Locomotion::Walking)
    }
}

/// Everything a character tick reads from or writes to the outside world
pub struct StepContext<'a> {
    pub world: &'a mut PhysicsWorld,
    pub sun: Vec2,
    pub controls: ControlSet,
    pub settings: &'a Settings,
    pub cues: &'a mut Vec<SoundCue>,
}

/// What happened during a character tick that the screen must react to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepReport {
    /// The flap cue fired; its cooldown must be scheduled
    pub flapped: bool,
    /// The state at the end of the tick differs from the start
    pub state_changed: bool,
}

#[derive(Debug, Clone)]
pub struct Icarus {
    body: BodyHandle,
    state: Locomotion,
    /// -1 facing left, 1 facing right
    facing: f32,
    sun_distance: f32,
    cloud_distance: f32,
    damage: Meter,
    fatigue: Meter,
    immortal: bool,
    melting: bool,
    /// Flap cue is cooling down
    flapped: bool,
    /// State was `Flying` at the end of the previous tick
    was_flying: bool,
}

impl Icarus {
    pub fn spawn(world: &mut PhysicsWorld, position: Vec2, settings: &Settings) -> Self {
        let body = world.create_body(BodyDef {
            density: ICARUS_DENSITY,
            ..BodyDef::new(
                BodyTag::Character,
                position,
                Shape::Circle {
                    radius: ICARUS_RADIUS,
                },
            )
        });

        Self {
            body,
            state: Locomotion::Flying,
            facing: 1.0,
            sun_distance: NO_SHADOW_DISTANCE,
            cloud_distance: NO_SHADOW_DISTANCE,
            damage: Meter::EMPTY,
            fatigue: Meter::EMPTY,
            immortal: settings.immortal,
            melting: false,
            flapped: false,
            was_flying: false,
        }
    }

    pub fn despawn(self, world: &mut PhysicsWorld) {
        world.destroy_body(self.body);
    }

    pub fn body(&self) -> BodyHandle {
        self.body
    }

    pub fn state(&self) -> Locomotion {
        self.state
    }

    pub fn facing(&self) -> f32 {
        self.facing
    }

    pub fn damage(&self) -> f32 {
        self.damage.value()
    }

    pub fn fatigue(&self) -> f32 {
        self.fatigue.value()
    }

    pub fn sun_distance(&self) -> f32 {
        self.sun_distance
    }

    pub fn cloud_distance(&self) -> f32 {
        self.cloud_distance
    }

    pub fn is_melting(&self) -> bool {
        self.melting
    }

    pub fn is_immortal(&self) -> bool {
        self.immortal
    }

    /// Flap cue is cooling down
    pub fn flap_cooling_down(&self) -> bool {
        self.flapped
    }

    /// Cooldown elapsed, the next entry into flight may flap again
    pub fn clear_flapped(&mut self) {
        self.flapped = false;
    }

    pub fn body_state(&self, world: &PhysicsWorld) -> Option<BodyState> {
        world.body_state(self.body)
    }

    pub fn position(&self, world: &PhysicsWorld) -> Vec2 {
        self.body_state(world).map(|b| b.position).unwrap_or_default()
    }

    /// Advance one fixed tick
    pub fn step(&mut self, ctx: &mut StepContext<'_>, dt: f32) -> StepReport {
        let old_state = self.state;

        self.update_heat(ctx, dt);
        self.update_distances(ctx.world, ctx.sun);
        self.update_state(ctx.world, ctx.controls);

        match self.state {
            Locomotion::Standing => self.step_standing(ctx, dt),
            Locomotion::Walking => self.step_walking(ctx),
            Locomotion::Flying => self.step_flying(ctx, dt),
            Locomotion::Falling => self.step_falling(ctx),
        }

        let state_changed = self.state != old_state;
        if state_changed {
            log::debug!("Icarus {:?} -> {:?}", old_state, self.state);
            self.update_sound(old_state, ctx.cues);
        }

        let flying = self.state == Locomotion::Flying;
        let flapped = flying && !self.was_flying && !self.flapped;
        if flapped {
            ctx.cues.push(SoundCue::Flap);
            self.flapped = true;
        }
        self.was_flying = flying;

        StepReport {
            flapped,
            state_changed,
        }
    }

    /// Melt in the sun, using last tick's distances
    fn update_heat(&mut self, ctx: &mut StepContext<'_>, dt: f32) {
        let exposed = self.cloud_distance > ctx.settings.shadow_length && !self.immortal;
        if exposed {
            if !self.melting {
                self.melting = true;
                ctx.cues.push(SoundCue::SizzleLoopStart);
            }
            let distance = self.sun_distance.max(f32::EPSILON);
            self.damage.accrue(dt / distance / ctx.settings.melt_duration);
        } else if self.melting {
            self.melting = false;
            ctx.cues.push(SoundCue::SizzleLoopStop);
        }
    }

    fn update_distances(&mut self, world: &PhysicsWorld, sun: Vec2) {
        let Some(body) = world.body_state(self.body) else {
            return;
        };
        self.sun_distance = body.position.distance(sun);

        // Shade comes from whatever cloud the sun ray meets first
        self.cloud_distance = world
            .raycast_first(body.position, sun, false)
            .filter(|hit| hit.tag == BodyTag::Cloud)
            .and_then(|hit| world.body_state(hit.body))
            .map(|cloud| body.position.distance(cloud.position))
            .unwrap_or(NO_SHADOW_DISTANCE);
    }

    fn update_state(&mut self, world: &PhysicsWorld, controls: ControlSet) {
        if self.state == Locomotion::Falling {
            return;
        }
        let Some(body) = world.body_state(self.body) else {
            return;
        };

        let spent = self.damage.is_spent() || self.fatigue.is_spent();
        if (!self.immortal && spent) || body.position.y <= 0.0 {
            self.state = Locomotion::Falling;
        } else if controls.up() {
            self.state = Locomotion::Flying;
        } else {
            // Look for ground beneath the feet
            let probe = body.position - Vec2::new(0.0, GROUND_PROBE_LENGTH);
            let on_ground = world
                .raycast_first(body.position, probe, false)
                .is_some_and(|hit| !hit.is_sensor);
            if on_ground {
                if !self.state.is_grounded() {
                    self.state = Locomotion::Standing;
                }
            } else {
                self.state = Locomotion::Flying;
            }
        }
    }

    fn restoring_torque(&self, body: &BodyState, settings: &Settings) -> f32 {
        -(body.angle * settings.icarus_angular_k
            + body.angular_velocity * settings.icarus_angular_damping)
    }

    fn step_standing(&mut self, ctx: &mut StepContext<'_>, dt: f32) {
        self.fatigue.recover(dt / ctx.settings.rest_duration);
        if ctx.controls.left() || ctx.controls.right() {
            self.state = Locomotion::Walking;
        }

        let Some(body) = ctx.world.body_state(self.body) else {
            return;
        };
        ctx.world.apply_force(self.body, -body.velocity, body.position);
        let torque = self.restoring_torque(&body, ctx.settings);
        ctx.world.apply_torque(self.body, torque);
    }

    fn step_walking(&mut self, ctx: &mut StepContext<'_>) {
        let controls = ctx.controls;
        if !controls.left() && !controls.right() {
            self.state = Locomotion::Standing;
            return;
        }
        if controls.single_direction() {
            self.facing = controls.horizontal();
        }

        let Some(body) = ctx.world.body_state(self.body) else {
            return;
        };
        let force = Vec2::new(controls.horizontal(), 0.0) * WALK_DRIVE - body.velocity;
        ctx.world.apply_force(self.body, force, body.position);
        let torque = self.restoring_torque(&body, ctx.settings);
        ctx.world.apply_torque(self.body, torque);
    }

    fn step_flying(&mut self, ctx: &mut StepContext<'_>, dt: f32) {
        let controls = ctx.controls;
        let settings = ctx.settings;
        if controls.any_movement() {
            // Flapping is tiring
            self.fatigue.accrue(dt / settings.flight_duration);
        }
        if controls.single_direction() {
            self.facing = controls.horizontal();
        }

        let Some(body) = ctx.world.body_state(self.body) else {
            return;
        };
        let up = if controls.up() { 1.0 } else { 0.0 };
        let lift = up * self.fatigue.derating() * self.damage.derating() * settings.icarus_lift_force;
        let side = controls.horizontal() * settings.icarus_side_force;
        let drag = -body.velocity * settings.icarus_air_resistance;

        ctx.world
            .apply_force(self.body, Vec2::new(side, lift) + drag, body.position);
        let torque = self.restoring_torque(&body, settings);
        ctx.world.apply_torque(self.body, torque);
    }

    /// Tumble toward upside down; gravity does the rest
    fn step_falling(&mut self, ctx: &mut StepContext<'_>) {
        let Some(body) = ctx.world.body_state(self.body) else {
            return;
        };
        let angle_error = normalize_angle(PI - body.angle);
        let torque = angle_error * ctx.settings.icarus_angular_k
            - body.angular_velocity * ctx.settings.icarus_angular_damping;
        ctx.world.apply_torque(self.body, torque);
    }

    fn update_sound(&self, old_state: Locomotion, cues: &mut Vec<SoundCue>) {
        if old_state == Locomotion::Walking {
            cues.push(SoundCue::WalkLoopStop);
        }
        if self.state == Locomotion::Walking {
            cues.push(SoundCue::WalkLoopStart);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::Bounds;
    use crate::sim::environment::{Cloud, CloudSpawn, Island};
    use crate::sim::input::Control;

    const DT: f32 = 1.0 / 60.0;
    const SUN: Vec2 = Vec2::new(0.0, 100.0);

    struct Rig {
        world: PhysicsWorld,
        settings: Settings,
        icarus: Icarus,
        cues: Vec<SoundCue>,
    }

    impl Rig {
        fn new(spawn: Vec2, settings: Settings) -> Self {
            let mut world = PhysicsWorld::new(Bounds::default(), settings.gravity);
            Island::spawn(&mut world, Vec2::ZERO, Vec2::ZERO);
            let icarus = Icarus::spawn(&mut world, spawn, &settings);
            Self {
                world,
                settings,
                icarus,
                cues: Vec::new(),
            }
        }

        fn on_island() -> Self {
            Self::new(Vec2::new(2.0, 1.5), Settings::default())
        }

        fn in_air() -> Self {
            Self::new(Vec2::new(0.0, 50.0), Settings::default())
        }

        fn tick(&mut self, controls: &[Control]) -> StepReport {
            let mut ctx = StepContext {
                world: &mut self.world,
                sun: SUN,
                controls: controls.iter().copied().collect(),
                settings: &self.settings,
                cues: &mut self.cues,
            };
            let report = self.icarus.step(&mut ctx, DT);
            self.world.step(
                DT,
                self.settings.position_iterations,
                self.settings.velocity_iterations,
            );
            report
        }
    }

    #[test]
    fn test_starts_flying() {
        let rig = Rig::on_island();
        assert_eq!(rig.icarus.state(), Locomotion::Flying);
        assert_eq!(rig.icarus.damage(), 0.0);
        assert_eq!(rig.icarus.fatigue(), 0.0);
    }

    #[test]
    fn test_lands_on_island() {
        let mut rig = Rig::on_island();
        rig.tick(&[]);
        assert_eq!(rig.icarus.state(), Locomotion::Standing);
    }

    #[test]
    fn test_walk_and_stop() {
        let mut rig = Rig::on_island();
        rig.tick(&[]);
        rig.cues.clear();

        rig.tick(&[Control::Right]);
        assert_eq!(rig.icarus.state(), Locomotion::Walking);
        assert_eq!(rig.icarus.facing(), 1.0);
        assert_eq!(rig.cues, vec![SoundCue::WalkLoopStart]);

        // Ground still below: walking is preserved, not reset to standing
        rig.tick(&[Control::Right]);
        assert_eq!(rig.icarus.state(), Locomotion::Walking);

        rig.cues.clear();
        rig.tick(&[]);
        assert_eq!(rig.icarus.state(), Locomotion::Standing);
        assert_eq!(rig.cues, vec![SoundCue::WalkLoopStop]);
    }

    #[test]
    fn test_walking_left_faces_left() {
        let mut rig = Rig::on_island();
        rig.tick(&[]);
        rig.tick(&[Control::Left]);
        rig.tick(&[Control::Left]);
        assert_eq!(rig.icarus.facing(), -1.0);
        assert_eq!(rig.icarus.state(), Locomotion::Walking);
    }

    #[test]
    fn test_up_takes_off_over_ground() {
        let mut rig = Rig::on_island();
        rig.tick(&[]);
        rig.cues.clear();
        rig.tick(&[Control::Up]);
        assert_eq!(rig.icarus.state(), Locomotion::Flying);
        assert!(rig.cues.contains(&SoundCue::Flap));
    }

    #[test]
    fn test_flap_is_edge_triggered() {
        let mut rig = Rig::in_air();
        let first = rig.tick(&[Control::Up]);
        assert!(first.flapped);
        assert!(rig.icarus.flap_cooling_down());
        for _ in 0..10 {
            assert!(!rig.tick(&[Control::Up]).flapped);
        }
        // Cooldown cleared, but still flying: no new edge
        rig.icarus.clear_flapped();
        assert!(!rig.tick(&[Control::Up]).flapped);
        let flaps = rig.cues.iter().filter(|c| **c == SoundCue::Flap).count();
        assert_eq!(flaps, 1);
    }

    #[test]
    fn test_flight_tires_only_when_active() {
        let mut rig = Rig::in_air();
        rig.tick(&[]);
        assert_eq!(rig.icarus.fatigue(), 0.0);

        let mut last = 0.0;
        for _ in 0..30 {
            rig.tick(&[Control::Up, Control::Left]);
            assert!(rig.icarus.fatigue() > last);
            last = rig.icarus.fatigue();
        }
        assert_eq!(rig.icarus.facing(), -1.0);
    }

    #[test]
    fn test_rest_recovers_fatigue() {
        let mut rig = Rig::on_island();
        rig.icarus.fatigue = Meter::new(0.5);
        rig.tick(&[]);
        let mut last = rig.icarus.fatigue();
        assert!(last < 0.5);
        for _ in 0..30 {
            rig.tick(&[]);
            assert!(rig.icarus.fatigue() <= last);
            last = rig.icarus.fatigue();
        }
    }

    #[test]
    fn test_exhaustion_falls_and_stays_fallen() {
        let mut rig = Rig::on_island();
        rig.icarus.fatigue = Meter::new(1.0);
        rig.tick(&[Control::Up]);
        assert_eq!(rig.icarus.state(), Locomotion::Falling);

        rig.icarus.fatigue = Meter::EMPTY;
        for _ in 0..5 {
            rig.tick(&[Control::Up]);
            assert_eq!(rig.icarus.state(), Locomotion::Falling);
        }
    }

    #[test]
    fn test_immortal_ignores_damage_but_not_sea() {
        let settings = Settings {
            immortal: true,
            ..Default::default()
        };
        let mut rig = Rig::new(Vec2::new(0.0, 50.0), settings.clone());
        rig.icarus.damage = Meter::new(2.0);
        rig.tick(&[]);
        assert_eq!(rig.icarus.state(), Locomotion::Flying);
        assert!(!rig.icarus.is_melting());

        let mut rig = Rig::new(Vec2::new(20.0, -0.5), settings);
        rig.tick(&[]);
        assert_eq!(rig.icarus.state(), Locomotion::Falling);
    }

    #[test]
    fn test_sun_exposure_melts() {
        let mut rig = Rig::in_air();
        rig.tick(&[]);
        assert!(rig.icarus.is_melting());
        assert_eq!(rig.cues.first(), Some(&SoundCue::SizzleLoopStart));
        assert_eq!(rig.icarus.cloud_distance(), NO_SHADOW_DISTANCE);
        assert!((rig.icarus.sun_distance() - 50.0).abs() < 1e-3);

        let mut last = rig.icarus.damage();
        assert!(last > 0.0);
        for _ in 0..30 {
            rig.tick(&[]);
            assert!(rig.icarus.damage() >= last);
            last = rig.icarus.damage();
        }
        let starts = rig
            .cues
            .iter()
            .filter(|c| **c == SoundCue::SizzleLoopStart)
            .count();
        assert_eq!(starts, 1);
    }

    #[test]
    fn test_cloud_shade_stops_melting() {
        let mut rig = Rig::in_air();
        let cloud = Cloud::spawn(
            &mut rig.world,
            1,
            CloudSpawn::anchored(Vec2::new(0.0, 60.0), true),
            1.0,
        );

        // First tick still uses the initial "no shadow" distance
        rig.tick(&[]);
        assert!(rig.icarus.is_melting());
        let expected = Vec2::new(0.0, 50.0).distance(cloud.position(&rig.world));
        assert!((rig.icarus.cloud_distance() - expected).abs() < 1e-3);

        rig.tick(&[]);
        assert!(!rig.icarus.is_melting());
        assert_eq!(rig.cues.last(), Some(&SoundCue::SizzleLoopStop));

        let shaded = rig.icarus.damage();
        for _ in 0..10 {
            rig.tick(&[]);
            assert_eq!(rig.icarus.damage(), shaded);
        }
    }

    #[test]
    fn test_far_cloud_gives_no_shade() {
        let mut rig = Rig::in_air();
        Cloud::spawn(
            &mut rig.world,
            1,
            CloudSpawn::anchored(Vec2::new(0.0, 90.0), true),
            1.0,
        );
        rig.tick(&[]);
        rig.tick(&[]);
        assert!(rig.icarus.cloud_distance() > rig.settings.shadow_length);
        assert!(rig.icarus.is_melting());
    }

    #[test]
    fn test_falling_tumbles_upside_down() {
        let mut rig = Rig::new(Vec2::new(0.0, 90.0), Settings::default());
        rig.icarus.damage = Meter::new(1.0);
        for _ in 0..180 {
            rig.tick(&[]);
        }
        assert_eq!(rig.icarus.state(), Locomotion::Falling);
        let angle = rig.icarus.body_state(&rig.world).unwrap().angle;
        assert!(angle.abs() > 2.5, "angle {}", angle);
    }
}
