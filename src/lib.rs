//! SAT Physics – convex rigid-body collision and impulse engine for Rust.
//!
//! The crate detects overlaps between spheres, boxes, convex polyhedra and
//! static planes with separating-axis tests, builds clipped contact manifolds,
//! and resolves them with a sequential-impulse solver.

pub mod collision;
pub mod config;
pub mod core;
pub mod dynamics;
pub mod error;
pub mod utils;
pub mod world;

pub use glam::{Mat3, Quat, Vec3};

pub use core::soa::{BodyMut, BodyRef};

pub use collision::{
    contact::{ContactFeature, ContactManifold, ContactPoint},
    narrowphase::NarrowPhase,
    sat::SatAlgorithm,
};
pub use config::WorldConfig;
pub use core::{
    collider::{ColliderShape, ShapeKind},
    convex::{ConvexHullData, ConvexShape, ConvexShapeCache},
    plane::Plane,
    rigidbody::RigidBody,
    types::{Material, Transform, Velocity},
};
pub use dynamics::{
    integrator::Integrator,
    observer::{EventRecorder, ImpulseKind, SolverEvent, SolverObserver},
    solver::ContactSolver,
};
pub use error::PhysicsError;
pub use utils::allocator::{BodyHandle, GenerationalId};
pub use world::{BodySnapshot, PhysicsWorld};

/// High-level convenience wrapper that owns a [`PhysicsWorld`].
pub struct PhysicsEngine {
    world: PhysicsWorld,
}

impl PhysicsEngine {
    /// Creates a new physics engine with the provided default timestep.
    pub fn new(timestep: f32) -> Self {
        Self {
            world: PhysicsWorld::new(timestep),
        }
    }

    pub fn with_config(timestep: f32, config: WorldConfig) -> Self {
        Self {
            world: PhysicsWorld::with_config(timestep, config),
        }
    }

    /// Adds a rigid body to the world and returns its [`BodyHandle`].
    pub fn add_body(&mut self, body: RigidBody) -> error::Result<BodyHandle> {
        self.world.add_body(body)
    }

    /// Advances the simulation by the provided delta time.
    pub fn step(&mut self, dt: f32) {
        self.world.step(dt);
    }

    /// Advances the simulation by the world's default timestep.
    pub fn tick(&mut self) {
        let dt = self.world.time_step();
        self.world.step(dt);
    }

    /// Enables or disables parallel narrow-phase pair testing.
    pub fn set_parallel_enabled(&mut self, enabled: bool) {
        self.world.set_parallel_enabled(enabled);
    }

    /// Returns whether the engine is currently using parallel execution.
    pub fn parallel_enabled(&self) -> bool {
        self.world.parallel_enabled()
    }

    /// Immutable access to a rigid body by handle.
    pub fn get_body(&self, handle: BodyHandle) -> Option<BodyRef<'_>> {
        self.world.body(handle)
    }

    /// Mutable access to a rigid body by handle.
    pub fn get_body_mut(&mut self, handle: BodyHandle) -> Option<BodyMut<'_>> {
        self.world.body_mut(handle)
    }

    pub fn world(&self) -> &PhysicsWorld {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut PhysicsWorld {
        &mut self.world
    }
}
