//! Global configuration constants and the serializable world configuration.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Default gravity vector applied in the physics world (Y-up).
pub const DEFAULT_GRAVITY: [f32; 3] = [0.0, -9.81, 0.0];

/// Default integration timestep (in seconds).
pub const DEFAULT_TIME_STEP: f32 = 1.0 / 60.0;

/// Number of constraint solver iterations performed per step.
pub const DEFAULT_SOLVER_ITERATIONS: u32 = 4;

/// Fraction of the excess penetration turned into separating velocity each step.
pub const BAUMGARTE_TERM: f32 = 0.2;

/// Penetration tolerated before the Baumgarte bias kicks in.
pub const PENETRATION_SLOP: f32 = 0.01;

/// Multiplicative damping applied to both velocities after integration.
pub const DEFAULT_VELOCITY_DAMPING: f32 = 0.999;

/// Upper bound of contact points stored in a single manifold.
pub const MAX_CONTACT_COUNT: usize = 8;

/// Number of manifold slots available to the collision manager per step.
pub const MAX_COLLISION_COUNT: usize = 512;

/// Number of instance slots allocated by a default world.
pub const DEFAULT_BODY_CAPACITY: usize = 100;

/// Tunables consumed by [`crate::PhysicsWorld::with_config`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    pub gravity: Vec3,
    pub solver_iterations: u32,
    pub baumgarte: f32,
    pub penetration_slop: f32,
    pub velocity_damping: f32,
    pub body_capacity: usize,
    pub max_collisions: usize,
    /// Steps slower than this many milliseconds are reported through `log::warn!`.
    pub frame_budget_ms: Option<f32>,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            gravity: Vec3::from_array(DEFAULT_GRAVITY),
            solver_iterations: DEFAULT_SOLVER_ITERATIONS,
            baumgarte: BAUMGARTE_TERM,
            penetration_slop: PENETRATION_SLOP,
            velocity_damping: DEFAULT_VELOCITY_DAMPING,
            body_capacity: DEFAULT_BODY_CAPACITY,
            max_collisions: MAX_COLLISION_COUNT,
            frame_budget_ms: None,
        }
    }
}

impl WorldConfig {
    /// Same configuration with gravity switched off.
    pub fn without_gravity(mut self) -> Self {
        self.gravity = Vec3::ZERO;
        self
    }

    pub fn with_solver_iterations(mut self, iterations: u32) -> Self {
        self.solver_iterations = iterations.max(1);
        self
    }

    pub fn with_body_capacity(mut self, capacity: usize) -> Self {
        self.body_capacity = capacity;
        self
    }

    pub fn with_frame_budget(mut self, budget_ms: f32) -> Self {
        self.frame_budget_ms = Some(budget_ms);
        self
    }
}
