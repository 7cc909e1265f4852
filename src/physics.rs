//! Physics world adapter
//!
//! A narrow facade over rapier2d: body creation and removal, force and torque
//! application, a single nearest-hit raycast, and fixed-step integration.
//! The rest of the crate only sees `glam::Vec2` and opaque [`BodyHandle`]s.
//!
//! Forces and torques are one-step pushes: they are cleared after every
//! [`PhysicsWorld::step`], so actors re-apply them each tick.

use std::collections::HashMap;
use std::num::NonZeroUsize;

use glam::Vec2;
use rapier2d::prelude::*;
use serde::{Deserialize, Serialize};

/// Opaque reference to a body owned by the [`PhysicsWorld`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BodyHandle(RigidBodyHandle);

/// What kind of actor a body belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyTag {
    Character,
    Cloud,
    Island,
}

/// Collision shape of a body
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    Circle { radius: f32 },
    Box { half_width: f32, half_height: f32 },
}

/// Parameters for [`PhysicsWorld::create_body`]
#[derive(Debug, Clone, Copy)]
pub struct BodyDef {
    pub position: Vec2,
    pub linear_velocity: Vec2,
    pub shape: Shape,
    pub density: f32,
    /// Detected by raycasts but exerts no contact response
    pub is_sensor: bool,
    /// Zero mass, never moves
    pub is_static: bool,
    pub tag: BodyTag,
}

impl BodyDef {
    pub fn new(tag: BodyTag, position: Vec2, shape: Shape) -> Self {
        Self {
            position,
            linear_velocity: Vec2::ZERO,
            shape,
            density: 1.0,
            is_sensor: false,
            is_static: false,
            tag,
        }
    }
}

/// Snapshot of a body's kinematic state
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyState {
    pub position: Vec2,
    pub velocity: Vec2,
    pub angle: f32,
    pub angular_velocity: f32,
    pub mass: f32,
}

/// Nearest hit of a raycast
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub body: BodyHandle,
    pub tag: BodyTag,
    pub point: Vec2,
    pub is_sensor: bool,
}

/// Axis-aligned world region; dynamic bodies leaving it are frozen
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub lower: Vec2,
    pub upper: Vec2,
}

impl Bounds {
    pub fn contains(&self, p: Vec2) -> bool {
        p.cmpge(self.lower).all() && p.cmple(self.upper).all()
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self {
            lower: Vec2::new(-100.0, -10.0),
            upper: Vec2::new(100.0, 100.0),
        }
    }
}

#[inline]
fn to_vector(v: Vec2) -> Vector<Real> {
    vector![v.x, v.y]
}

#[inline]
fn to_point(v: Vec2) -> Point<Real> {
    point![v.x, v.y]
}

#[inline]
fn to_vec2(v: &Vector<Real>) -> Vec2 {
    Vec2::new(v.x, v.y)
}

/// Owns every rigid body of a game session
pub struct PhysicsWorld {
    bodies: RigidBodySet,
    colliders: ColliderSet,
    gravity: Vector<Real>,
    integration_parameters: IntegrationParameters,
    pipeline: PhysicsPipeline,
    island_manager: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    query_pipeline: QueryPipeline,
    bounds: Bounds,
    tags: HashMap<RigidBodyHandle, BodyTag>,
}

impl PhysicsWorld {
    /// Create a world pulling bodies toward -y with the given gravity magnitude
    pub fn new(bounds: Bounds, gravity: f32) -> Self {
        Self {
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            gravity: vector![0.0, -gravity],
            integration_parameters: IntegrationParameters::default(),
            pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            bounds,
            tags: HashMap::new(),
        }
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Number of live bodies
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Create a body with a single collider
    pub fn create_body(&mut self, def: BodyDef) -> BodyHandle {
        let builder = if def.is_static {
            RigidBodyBuilder::fixed()
        } else {
            RigidBodyBuilder::dynamic()
                .linvel(to_vector(def.linear_velocity))
                .can_sleep(false)
        };
        let handle = self
            .bodies
            .insert(builder.translation(to_vector(def.position)).build());

        let shape = match def.shape {
            Shape::Circle { radius } => SharedShape::ball(radius),
            Shape::Box {
                half_width,
                half_height,
            } => SharedShape::cuboid(half_width, half_height),
        };
        let collider = ColliderBuilder::new(shape)
            .density(def.density)
            .sensor(def.is_sensor)
            .build();
        self.colliders
            .insert_with_parent(collider, handle, &mut self.bodies);
        self.tags.insert(handle, def.tag);
        self.query_pipeline.update(&self.colliders);

        BodyHandle(handle)
    }

    /// Remove a body and its collider
    pub fn destroy_body(&mut self, handle: BodyHandle) {
        let removed = self.bodies.remove(
            handle.0,
            &mut self.island_manager,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            true,
        );
        if removed.is_none() {
            log::warn!("destroy_body on unknown handle {:?}", handle);
            return;
        }
        self.tags.remove(&handle.0);
        self.query_pipeline.update(&self.colliders);
    }

    pub fn contains(&self, handle: BodyHandle) -> bool {
        self.bodies.contains(handle.0)
    }

    /// Kinematic snapshot of a body, `None` once destroyed
    pub fn body_state(&self, handle: BodyHandle) -> Option<BodyState> {
        let rb = self.bodies.get(handle.0)?;
        Some(BodyState {
            position: to_vec2(rb.translation()),
            velocity: to_vec2(rb.linvel()),
            angle: rb.rotation().angle(),
            angular_velocity: rb.angvel(),
            mass: rb.mass(),
        })
    }

    /// Push a body for the next step
    pub fn apply_force(&mut self, handle: BodyHandle, force: Vec2, at_point: Vec2) {
        match self.bodies.get_mut(handle.0) {
            Some(rb) => rb.add_force_at_point(to_vector(force), to_point(at_point), true),
            None => log::warn!("apply_force on unknown handle {:?}", handle),
        }
    }

    /// Twist a body for the next step
    pub fn apply_torque(&mut self, handle: BodyHandle, torque: f32) {
        match self.bodies.get_mut(handle.0) {
            Some(rb) => rb.add_torque(torque, true),
            None => log::warn!("apply_torque on unknown handle {:?}", handle),
        }
    }

    pub fn set_velocity(&mut self, handle: BodyHandle, velocity: Vec2) {
        match self.bodies.get_mut(handle.0) {
            Some(rb) => rb.set_linvel(to_vector(velocity), true),
            None => log::warn!("set_velocity on unknown handle {:?}", handle),
        }
    }

    /// Nearest shape hit along the segment `from -> to`
    ///
    /// With `solid == false`, shapes that contain `from` are ignored (so a
    /// body never hits itself from its own center). With `solid == true`
    /// such shapes are reported at `from`.
    pub fn raycast_first(&self, from: Vec2, to: Vec2, solid: bool) -> Option<RayHit> {
        let dir = to - from;
        if dir.length_squared() <= f32::EPSILON {
            return None;
        }
        let origin = to_point(from);
        let ray = Ray::new(origin, to_vector(dir));

        let outside = |_: ColliderHandle, collider: &Collider| {
            !collider
                .shape()
                .contains_point(collider.position(), &origin)
        };
        let filter = if solid {
            QueryFilter::default()
        } else {
            QueryFilter::default().predicate(&outside)
        };

        let (collider_handle, toi) =
            self.query_pipeline
                .cast_ray(&self.bodies, &self.colliders, &ray, 1.0, solid, filter)?;
        let collider = self.colliders.get(collider_handle)?;
        let parent = collider.parent()?;
        let tag = *self.tags.get(&parent)?;
        let point = ray.point_at(toi);

        Some(RayHit {
            body: BodyHandle(parent),
            tag,
            point: Vec2::new(point.x, point.y),
            is_sensor: collider.is_sensor(),
        })
    }

    /// Advance every body by `dt`
    pub fn step(&mut self, dt: f32, position_iterations: usize, velocity_iterations: usize) {
        self.integration_parameters.dt = dt;
        self.integration_parameters.num_solver_iterations =
            NonZeroUsize::new(velocity_iterations).unwrap_or(NonZeroUsize::MIN);
        self.integration_parameters.num_internal_pgs_iterations = position_iterations.max(1);

        self.pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &(),
            &(),
        );

        let bounds = self.bounds;
        for (handle, rb) in self.bodies.iter_mut() {
            rb.reset_forces(false);
            rb.reset_torques(false);

            if rb.is_dynamic() && rb.is_enabled() && !bounds.contains(to_vec2(rb.translation())) {
                log::debug!("Body {:?} left the world bounds, freezing", handle);
                rb.set_enabled(false);
            }
        }
    }
}
