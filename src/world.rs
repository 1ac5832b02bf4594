pub mod collision_manager;

use std::sync::Arc;
use std::time::Instant;

use glam::{Quat, Vec3};
use log::{debug, warn};
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{
    collision::{
        contact::{ContactGeometry, ContactManifold},
        narrowphase::NarrowPhase,
    },
    config::{WorldConfig, DEFAULT_TIME_STEP},
    core::{
        collider::ShapeKind,
        convex::ConvexShape,
        rigidbody::RigidBody,
        soa::{BodiesSoA, BodyMut, BodyRef},
        types::MaterialPairProperties,
    },
    dynamics::{
        integrator::Integrator,
        observer::{SolverEvent, SolverObserver},
        solver::{ContactSolver, SolverStepMetrics},
    },
    error::{PhysicsError, Result},
    utils::{
        logging::{warn_if_frame_budget_exceeded, PipelineStage, ScopedTimer},
        BodyHandle,
    },
};
use collision_manager::CollisionManager;

/// Plain per-instance record for renderers and debug overlays.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BodySnapshot {
    pub handle: BodyHandle,
    pub shape: ShapeKind,
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
    pub linear_velocity: Vec3,
    pub angular_velocity: Vec3,
    pub angular_speed: f32,
}

/// Central simulation container orchestrating all subsystems.
pub struct PhysicsWorld {
    bodies: BodiesSoA,
    collisions: CollisionManager,
    solver: ContactSolver,
    integrator: Integrator,
    config: WorldConfig,
    time_step: f32,
    observer: Option<Arc<dyn SolverObserver>>,
    parallel_enabled: bool,
    last_metrics: SolverStepMetrics,
}

impl PhysicsWorld {
    pub fn new(time_step: f32) -> Self {
        Self::with_config(time_step, WorldConfig::default())
    }

    pub fn with_config(time_step: f32, config: WorldConfig) -> Self {
        let ts = if time_step <= 0.0 {
            DEFAULT_TIME_STEP
        } else {
            time_step
        };

        let mut solver = ContactSolver::new(config.solver_iterations);
        solver.baumgarte = config.baumgarte;
        solver.slop = config.penetration_slop;

        Self {
            bodies: BodiesSoA::with_capacity(config.body_capacity),
            collisions: CollisionManager::with_capacity(config.max_collisions),
            solver,
            integrator: Integrator::new(config.velocity_damping),
            config,
            time_step: ts,
            observer: None,
            parallel_enabled: false,
            last_metrics: SolverStepMetrics::default(),
        }
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    pub fn time_step(&self) -> f32 {
        self.time_step
    }

    pub fn gravity(&self) -> Vec3 {
        self.config.gravity
    }

    pub fn set_gravity(&mut self, gravity: Vec3) {
        self.config.gravity = gravity;
    }

    /// Runs the pair tests of the narrow phase on the rayon pool.
    ///
    /// Has no effect unless the `parallel` feature is compiled in.
    pub fn set_parallel_enabled(&mut self, enabled: bool) {
        self.parallel_enabled = enabled && cfg!(feature = "parallel");
    }

    pub fn parallel_enabled(&self) -> bool {
        self.parallel_enabled
    }

    pub fn set_observer(&mut self, observer: Arc<dyn SolverObserver>) {
        self.observer = Some(observer);
    }

    pub fn clear_observer(&mut self) {
        self.observer = None;
    }

    pub fn add_body(&mut self, body: RigidBody) -> Result<BodyHandle> {
        let kind = body.shape_kind();
        let handle = self.bodies.insert(body)?;
        debug!("added {:?} body in slot {}", kind, handle.index());
        Ok(handle)
    }

    pub fn add_sphere_collider(
        &mut self,
        position: Vec3,
        radius: f32,
        mass: f32,
        restitution: f32,
        is_static: bool,
    ) -> Result<BodyHandle> {
        self.add_body(
            RigidBody::sphere(radius)
                .with_position(position)
                .with_mass(mass)
                .with_restitution(restitution)
                .with_static(is_static),
        )
    }

    /// Adds a box with full edge lengths `size`.
    pub fn add_box_collider(
        &mut self,
        position: Vec3,
        size: Vec3,
        mass: f32,
        restitution: f32,
        is_static: bool,
    ) -> Result<BodyHandle> {
        self.add_body(
            RigidBody::cuboid(size)
                .with_position(position)
                .with_mass(mass)
                .with_restitution(restitution)
                .with_static(is_static),
        )
    }

    pub fn add_convex_collider(
        &mut self,
        position: Vec3,
        hull: ConvexShape,
        mass: f32,
        restitution: f32,
        is_static: bool,
    ) -> Result<BodyHandle> {
        self.add_body(
            RigidBody::convex(hull)
                .with_position(position)
                .with_mass(mass)
                .with_restitution(restitution)
                .with_static(is_static),
        )
    }

    /// Adds a static half-space through `point`.
    pub fn add_plane_collider(&mut self, point: Vec3, normal: Vec3) -> Result<BodyHandle> {
        self.add_body(RigidBody::plane(normal).with_position(point))
    }

    pub fn remove_body(&mut self, handle: BodyHandle) -> Result<RigidBody> {
        self.bodies
            .remove(handle)
            .ok_or(PhysicsError::UnknownBody(handle))
    }

    pub fn body(&self, handle: BodyHandle) -> Option<BodyRef<'_>> {
        self.bodies.get(handle)
    }

    pub fn body_mut(&mut self, handle: BodyHandle) -> Option<BodyMut<'_>> {
        self.bodies.get_mut(handle)
    }

    fn require_mut(&mut self, handle: BodyHandle) -> Result<BodyMut<'_>> {
        self.bodies
            .get_mut(handle)
            .ok_or(PhysicsError::UnknownBody(handle))
    }

    pub fn set_enabled(&mut self, handle: BodyHandle, enabled: bool) -> Result<()> {
        self.require_mut(handle)?.set_enabled(enabled);
        Ok(())
    }

    pub fn set_transform(
        &mut self,
        handle: BodyHandle,
        position: Vec3,
        rotation: Quat,
    ) -> Result<()> {
        self.require_mut(handle)?.set_pose(position, rotation);
        Ok(())
    }

    pub fn set_velocity(&mut self, handle: BodyHandle, linear: Vec3, angular: Vec3) -> Result<()> {
        self.require_mut(handle)?.set_velocity(linear, angular);
        Ok(())
    }

    pub fn set_friction(&mut self, handle: BodyHandle, friction: f32) -> Result<()> {
        self.require_mut(handle)?.material.friction = friction.max(0.0);
        Ok(())
    }

    pub fn set_restitution(&mut self, handle: BodyHandle, restitution: f32) -> Result<()> {
        self.require_mut(handle)?.material.restitution = restitution.max(0.0);
        Ok(())
    }

    pub fn bodies(&self) -> &BodiesSoA {
        &self.bodies
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Number of colliding pairs found by the last narrow phase.
    pub fn collision_count(&self) -> usize {
        self.collisions.len()
    }

    pub fn manifolds(&self) -> &[ContactManifold] {
        self.collisions.manifolds()
    }

    pub fn manifold_between(&self, a: BodyHandle, b: BodyHandle) -> Option<&ContactManifold> {
        self.collisions.find(a, b)
    }

    pub fn last_metrics(&self) -> SolverStepMetrics {
        self.last_metrics
    }

    pub fn snapshots(&self) -> Vec<BodySnapshot> {
        self.bodies
            .handles()
            .filter_map(|handle| {
                let body = self.bodies.get(handle)?;
                let shape = body.shape()?.kind();
                let transform = body.transform();
                let velocity = body.velocity();
                Some(BodySnapshot {
                    handle,
                    shape,
                    position: transform.position,
                    rotation: transform.rotation,
                    scale: transform.scale,
                    linear_velocity: velocity.linear,
                    angular_velocity: velocity.angular,
                    angular_speed: velocity.angular.length(),
                })
            })
            .collect()
    }

    /// Advances the simulation by exactly one tick of length `dt`.
    pub fn step(&mut self, dt: f32) {
        if dt <= 0.0 || !dt.is_finite() {
            return;
        }
        let started = Instant::now();
        let _step_timer = ScopedTimer::new(PipelineStage::Step);

        {
            let _timer = ScopedTimer::new(PipelineStage::Inertia);
            self.bodies.update_world_inertias();
        }
        {
            let _timer = ScopedTimer::new(PipelineStage::Gravity);
            self.bodies.apply_gravity(self.config.gravity, dt);
        }
        {
            let _timer = ScopedTimer::new(PipelineStage::NarrowPhase);
            self.detect_collisions();
        }
        {
            let _timer = ScopedTimer::new(PipelineStage::Presolve);
            self.solver
                .presolve(&self.bodies, self.collisions.manifolds_mut(), dt);
        }
        {
            let _timer = ScopedTimer::new(PipelineStage::Solve);
            self.last_metrics = self.solver.solve(
                &mut self.bodies,
                self.collisions.manifolds(),
                self.observer.as_deref(),
            );
        }
        {
            let _timer = ScopedTimer::new(PipelineStage::Integrate);
            self.integrator.step(&mut self.bodies, dt);
        }

        debug!(
            "step: {} bodies, {} manifolds, {} contacts",
            self.bodies.len(),
            self.collisions.len(),
            self.last_metrics.contacts_solved
        );
        if let Some(budget) = self.config.frame_budget_ms {
            warn_if_frame_budget_exceeded(started.elapsed(), budget);
        }
    }

    /// Clears the manifold table and runs the all-pairs narrow phase.
    ///
    /// Stale convex shapes are rebuilt first. Returns the collision count.
    pub fn detect_collisions(&mut self) -> usize {
        self.collisions.clean_frame();

        let active: Vec<usize> = self.bodies.active_indices().collect();
        for &index in &active {
            self.bodies.refresh_shape(index);
        }

        let mut pairs = Vec::new();
        for (x, &i) in active.iter().enumerate() {
            for &j in &active[x + 1..] {
                let (fi, fj) = (self.bodies.flags[i], self.bodies.flags[j]);
                if !fi.enabled || !fj.enabled || (fi.is_static && fj.is_static) {
                    continue;
                }
                pairs.push((i, j));
            }
        }

        let bodies = &self.bodies;
        let results: Vec<(usize, usize, ContactGeometry)> = if self.parallel_enabled {
            Self::test_pairs_parallel(bodies, &pairs)
        } else {
            pairs
                .iter()
                .filter_map(|&(i, j)| Self::test_pair(bodies, i, j).map(|g| (i, j, g)))
                .collect()
        };

        for (i, j, geometry) in results {
            let (Some(handle_a), Some(handle_b)) = (bodies.handle_at(i), bodies.handle_at(j)) else {
                continue;
            };
            let material =
                MaterialPairProperties::from_materials(&bodies.materials[i], &bodies.materials[j]);
            let manifold = ContactManifold::new(handle_a, handle_b, geometry, material);

            if let Some(observer) = &self.observer {
                observer.notify(&SolverEvent::ManifoldFound {
                    body_a: handle_a,
                    body_b: handle_b,
                    normal: manifold.normal,
                    point_count: manifold.len(),
                    deepest: manifold.deepest_depth(),
                });
            }
            self.collisions.renew_contacts(manifold);
        }

        if self.collisions.dropped() > 0 {
            warn!(
                "collision table full: dropped {} of {} colliding pairs",
                self.collisions.dropped(),
                self.collisions.dropped() + self.collisions.len()
            );
        }

        self.collisions.len()
    }

    fn test_pair(bodies: &BodiesSoA, i: usize, j: usize) -> Option<ContactGeometry> {
        let first = bodies.world_shape(i)?;
        let second = bodies.world_shape(j)?;
        NarrowPhase::collide(&first, &second).filter(|g| !g.points.is_empty())
    }

    #[cfg(feature = "parallel")]
    fn test_pairs_parallel(
        bodies: &BodiesSoA,
        pairs: &[(usize, usize)],
    ) -> Vec<(usize, usize, ContactGeometry)> {
        pairs
            .par_iter()
            .filter_map(|&(i, j)| Self::test_pair(bodies, i, j).map(|g| (i, j, g)))
            .collect()
    }

    #[cfg(not(feature = "parallel"))]
    fn test_pairs_parallel(
        bodies: &BodiesSoA,
        pairs: &[(usize, usize)],
    ) -> Vec<(usize, usize, ContactGeometry)> {
        pairs
            .iter()
            .filter_map(|&(i, j)| Self::test_pair(bodies, i, j).map(|g| (i, j, g)))
            .collect()
    }
}
