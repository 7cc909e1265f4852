//! Sun, clouds and static scenery
//!
//! Drifting clouds are dynamic bodies held at constant altitude by an
//! upward force that cancels their weight; anchored clouds are static
//! platforms under temples.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::physics::{BodyDef, BodyHandle, BodyTag, PhysicsWorld, Shape};
use crate::settings::Settings;

/// The single point light. Only its position matters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sun {
    pub position: Vec2,
}

impl Sun {
    pub fn new(position: Vec2) -> Self {
        Self { position }
    }

    pub fn step(&mut self, _dt: f32) {}
}

/// Shadow cast below a cloud, opaque along the top edge and fading out
/// toward the bottom edge
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShadowQuad {
    pub top_left: Vec2,
    pub top_right: Vec2,
    pub bottom_right: Vec2,
    pub bottom_left: Vec2,
}

/// Project the top corners of a `width`-wide cloud away from the sun
pub fn shadow_quad(center: Vec2, width: f32, sun: Vec2, shadow_length: f32) -> ShadowQuad {
    let half = Vec2::new(width / 2.0, 0.0);
    let top_left = center - half;
    let top_right = center + half;
    let left_slope = (top_left - sun).normalize_or_zero();
    let right_slope = (top_right - sun).normalize_or_zero();
    ShadowQuad {
        top_left,
        top_right,
        bottom_right: top_right + right_slope * shadow_length,
        bottom_left: top_left + left_slope * shadow_length,
    }
}

/// How a cloud is spawned
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CloudSpawn {
    pub position: Vec2,
    pub velocity: Vec2,
    /// Sensor clouds cannot be stood on
    pub sensor: bool,
    /// Static clouds never move and are never culled
    pub anchored: bool,
}

impl CloudSpawn {
    pub fn drifting(position: Vec2, velocity: Vec2) -> Self {
        Self {
            position,
            velocity,
            sensor: true,
            anchored: false,
        }
    }

    pub fn anchored(position: Vec2, sensor: bool) -> Self {
        Self {
            position,
            velocity: Vec2::ZERO,
            sensor,
            anchored: true,
        }
    }
}

/// A cloud entity
#[derive(Debug, Clone)]
pub struct Cloud {
    pub id: u32,
    pub width: f32,
    pub height: f32,
    pub sensor: bool,
    pub anchored: bool,
    body: BodyHandle,
    mass: f32,
}

impl Cloud {
    pub fn spawn(world: &mut PhysicsWorld, id: u32, spawn: CloudSpawn, height: f32) -> Self {
        let body = world.create_body(BodyDef {
            linear_velocity: spawn.velocity,
            density: CLOUD_DENSITY,
            is_sensor: spawn.sensor,
            is_static: spawn.anchored,
            ..BodyDef::new(
                BodyTag::Cloud,
                spawn.position,
                Shape::Box {
                    half_width: CLOUD_WIDTH / 2.0,
                    half_height: height / 2.0,
                },
            )
        });
        let mass = if spawn.anchored {
            0.0
        } else {
            world.body_state(body).map(|b| b.mass).unwrap_or(0.0)
        };

        Self {
            id,
            width: CLOUD_WIDTH,
            height,
            sensor: spawn.sensor,
            anchored: spawn.anchored,
            body,
            mass,
        }
    }

    pub fn despawn(self, world: &mut PhysicsWorld) {
        world.destroy_body(self.body);
    }

    pub fn body(&self) -> BodyHandle {
        self.body
    }

    pub fn position(&self, world: &PhysicsWorld) -> Vec2 {
        world
            .body_state(self.body)
            .map(|b| b.position)
            .unwrap_or_default()
    }

    /// Cancel gravity and drop any vertical drift so the cloud keeps altitude
    pub fn step(&self, world: &mut PhysicsWorld, gravity: f32) {
        if self.anchored {
            return;
        }
        let Some(state) = world.body_state(self.body) else {
            return;
        };
        world.apply_force(self.body, Vec2::new(0.0, self.mass * gravity), state.position);
        world.set_velocity(self.body, Vec2::new(state.velocity.x, 0.0));
    }

    pub fn shadow(&self, world: &PhysicsWorld, sun: Vec2, shadow_length: f32) -> ShadowQuad {
        shadow_quad(self.position(world), self.width, sun, shadow_length)
    }
}

/// All clouds of a level, with population control for the drifting ones
#[derive(Debug, Clone)]
pub struct CloudField {
    clouds: Vec<Cloud>,
    next_id: u32,
}

impl Default for CloudField {
    fn default() -> Self {
        Self::new()
    }
}

impl CloudField {
    pub fn new() -> Self {
        Self {
            clouds: Vec::new(),
            next_id: 1,
        }
    }

    fn next_cloud_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn spawn(&mut self, world: &mut PhysicsWorld, spawn: CloudSpawn, height: f32) -> u32 {
        let id = self.next_cloud_id();
        self.clouds.push(Cloud::spawn(world, id, spawn, height));
        id
    }

    pub fn iter(&self) -> impl Iterator<Item = &Cloud> {
        self.clouds.iter()
    }

    pub fn len(&self) -> usize {
        self.clouds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clouds.is_empty()
    }

    /// Clouds that drift and count toward `cloud_count`
    pub fn drifting_count(&self) -> usize {
        self.clouds.iter().filter(|c| !c.anchored).count()
    }

    pub fn step(&self, world: &mut PhysicsWorld, gravity: f32) {
        for cloud in &self.clouds {
            cloud.step(world, gravity);
        }
    }

    /// Remove drifting clouds past `±max_x`; returns how many were removed
    pub fn cull(&mut self, world: &mut PhysicsWorld, max_x: f32) -> usize {
        let view: &PhysicsWorld = world;
        let (gone, kept): (Vec<Cloud>, Vec<Cloud>) = std::mem::take(&mut self.clouds)
            .into_iter()
            .partition(|c| !c.anchored && c.position(view).x.abs() > max_x);
        self.clouds = kept;

        let removed = gone.len();
        for cloud in gone {
            log::debug!("Cloud {} drifted out", cloud.id);
            cloud.despawn(world);
        }
        removed
    }

    /// Spawn drifting clouds until there are `cloud_count` of them
    ///
    /// Initial clouds are scattered across the sky; later ones enter from a
    /// random edge, heading inward.
    pub fn populate(
        &mut self,
        world: &mut PhysicsWorld,
        rng: &mut Pcg32,
        settings: &Settings,
        initial: bool,
    ) {
        while self.drifting_count() < settings.cloud_count {
            let side = if rng.random_bool(0.5) { 1.0 } else { -1.0 };
            let x = if initial {
                rng.random_range(-settings.cloud_max_x..=settings.cloud_max_x)
            } else {
                settings.cloud_max_x * side
            };
            let y = rng.random_range(settings.cloud_min_y..=settings.cloud_max_y);
            let dx = -side * rng.random_range(settings.cloud_min_dx..=settings.cloud_max_dx);

            self.spawn(
                world,
                CloudSpawn::drifting(Vec2::new(x, y), Vec2::new(dx, 0.0)),
                settings.cloud_height,
            );
        }
    }

    /// Cull, then replenish
    pub fn maintain(&mut self, world: &mut PhysicsWorld, rng: &mut Pcg32, settings: &Settings) {
        self.cull(world, settings.cloud_max_x);
        self.populate(world, rng, settings, false);
    }
}

/// The starting island: solid ground plus an offset sprite
#[derive(Debug, Clone)]
pub struct Island {
    pub sprite_offset: Vec2,
    body: BodyHandle,
}

impl Island {
    pub const HALF_EXTENTS: Vec2 = Vec2::new(3.5, 1.0);

    pub fn spawn(world: &mut PhysicsWorld, position: Vec2, sprite_offset: Vec2) -> Self {
        let body = world.create_body(BodyDef {
            is_static: true,
            ..BodyDef::new(
                BodyTag::Island,
                position,
                Shape::Box {
                    half_width: Self::HALF_EXTENTS.x,
                    half_height: Self::HALF_EXTENTS.y,
                },
            )
        });
        Self {
            sprite_offset,
            body,
        }
    }

    pub fn sprite_position(&self, world: &PhysicsWorld) -> Vec2 {
        world
            .body_state(self.body)
            .map(|b| b.position)
            .unwrap_or_default()
            + self.sprite_offset
    }
}

/// A temple sprite standing on its own anchored cloud
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Temple {
    pub position: Vec2,
    /// The golden temple that ends the level
    pub is_gates: bool,
}
