use glam::{Mat3, Vec3};

use super::observer::{ImpulseKind, SolverEvent, SolverObserver};
use crate::{
    collision::contact::ContactManifold,
    config::{BAUMGARTE_TERM, DEFAULT_SOLVER_ITERATIONS, PENETRATION_SLOP},
    core::soa::BodiesSoA,
};

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct SolverStepMetrics {
    pub manifolds_solved: usize,
    pub contacts_solved: usize,
    pub normal_impulse_sum: f32,
    pub tangent_impulse_sum: f32,
}

/// Sequential-impulse contact solver.
///
/// Manifolds are rebuilt every step, so impulses are not accumulated or carried
/// over between steps.
#[derive(Debug, Clone)]
pub struct ContactSolver {
    pub iterations: u32,
    pub baumgarte: f32,
    pub slop: f32,
}

impl Default for ContactSolver {
    fn default() -> Self {
        Self::new(DEFAULT_SOLVER_ITERATIONS)
    }
}

impl ContactSolver {
    pub fn new(iterations: u32) -> Self {
        Self {
            iterations: iterations.max(1),
            baumgarte: BAUMGARTE_TERM,
            slop: PENETRATION_SLOP,
        }
    }

    /// Caches lever arms, effective masses and the Baumgarte bias of every contact.
    ///
    /// Velocities are left untouched.
    pub fn presolve(&self, bodies: &BodiesSoA, manifolds: &mut [ContactManifold], dt: f32) {
        let inv_dt = if dt > 0.0 { 1.0 / dt } else { 0.0 };

        for manifold in manifolds.iter_mut() {
            let a = manifold.body_a.index();
            let b = manifold.body_b.index();
            let center_a = bodies.transforms[a].position;
            let center_b = bodies.transforms[b].position;
            let inv_mass_a = bodies.inverse_masses[a];
            let inv_mass_b = bodies.inverse_masses[b];
            let inv_inertia_a = bodies.inverse_inertias[a];
            let inv_inertia_b = bodies.inverse_inertias[b];
            let normal = manifold.normal;
            let tangents = manifold.tangents;

            for point in manifold.points.iter_mut() {
                let r_a = point.position - center_a;
                let r_b = point.position - center_b;
                let solver = &mut point.solver;

                solver.r_a = r_a;
                solver.r_b = r_b;
                solver.normal_mass = inverted_effective_mass(
                    normal,
                    r_a,
                    r_b,
                    inv_mass_a + inv_mass_b,
                    inv_inertia_a,
                    inv_inertia_b,
                );
                for (slot, tangent) in solver.tangent_mass.iter_mut().zip(tangents) {
                    *slot = inverted_effective_mass(
                        tangent,
                        r_a,
                        r_b,
                        inv_mass_a + inv_mass_b,
                        inv_inertia_a,
                        inv_inertia_b,
                    );
                }
                solver.bias = -self.baumgarte * inv_dt * (point.depth + self.slop).min(0.0);
            }
        }
    }

    /// Runs the fixed number of Gauss-Seidel passes over all manifolds.
    pub fn solve(
        &self,
        bodies: &mut BodiesSoA,
        manifolds: &[ContactManifold],
        observer: Option<&dyn SolverObserver>,
    ) -> SolverStepMetrics {
        let mut metrics = SolverStepMetrics {
            manifolds_solved: manifolds.len(),
            contacts_solved: manifolds.iter().map(ContactManifold::len).sum(),
            ..SolverStepMetrics::default()
        };

        for iteration in 0..self.iterations {
            for manifold in manifolds {
                self.solve_manifold(bodies, manifold, iteration, observer, &mut metrics);
            }
        }

        metrics
    }

    fn solve_manifold(
        &self,
        bodies: &mut BodiesSoA,
        manifold: &ContactManifold,
        iteration: u32,
        observer: Option<&dyn SolverObserver>,
        metrics: &mut SolverStepMetrics,
    ) {
        let a = manifold.body_a.index();
        let b = manifold.body_b.index();
        let normal = manifold.normal;

        for point in &manifold.points {
            let data = &point.solver;

            // Normal row: contacts only push.
            let relative = relative_velocity(bodies, a, b, data.r_a, data.r_b);
            let approach = -relative.dot(normal);
            let lambda =
                ((1.0 + manifold.restitution) * (approach + data.bias) * data.normal_mass).max(0.0);

            let impulse = normal * lambda;
            bodies.apply_impulse(a, impulse, data.r_a);
            bodies.apply_impulse(b, -impulse, data.r_b);
            metrics.normal_impulse_sum += lambda;
            notify(observer, manifold, ImpulseKind::Normal, lambda, iteration);

            // Friction rows, clamped to the Coulomb box.
            let limit = (manifold.friction * lambda).max(0.0);
            for (k, tangent) in manifold.tangents.iter().enumerate() {
                let relative = relative_velocity(bodies, a, b, data.r_a, data.r_b);
                let lambda_t =
                    (-relative.dot(*tangent) * data.tangent_mass[k]).clamp(-limit, limit);
                if lambda_t == 0.0 {
                    continue;
                }

                let impulse = *tangent * lambda_t;
                bodies.apply_impulse(a, impulse, data.r_a);
                bodies.apply_impulse(b, -impulse, data.r_b);
                metrics.tangent_impulse_sum += lambda_t.abs();
                notify(observer, manifold, ImpulseKind::Tangent(k as u8), lambda_t, iteration);
            }
        }
    }
}

/// `1 / (invM_A + invM_B + (r_A×d)·I⁻¹_A(r_A×d) + (r_B×d)·I⁻¹_B(r_B×d))`,
/// or 0 when degenerate.
fn inverted_effective_mass(
    direction: Vec3,
    r_a: Vec3,
    r_b: Vec3,
    inverse_mass_sum: f32,
    inv_inertia_a: Mat3,
    inv_inertia_b: Mat3,
) -> f32 {
    let ra_d = r_a.cross(direction);
    let rb_d = r_b.cross(direction);
    let k = inverse_mass_sum + ra_d.dot(inv_inertia_a * ra_d) + rb_d.dot(inv_inertia_b * rb_d);
    if k > f32::EPSILON {
        1.0 / k
    } else {
        0.0
    }
}

fn relative_velocity(bodies: &BodiesSoA, a: usize, b: usize, r_a: Vec3, r_b: Vec3) -> Vec3 {
    bodies.velocities[a].at_point(r_a) - bodies.velocities[b].at_point(r_b)
}

fn notify(
    observer: Option<&dyn SolverObserver>,
    manifold: &ContactManifold,
    kind: ImpulseKind,
    magnitude: f32,
    iteration: u32,
) {
    if let Some(observer) = observer {
        observer.notify(&SolverEvent::ImpulseApplied {
            body_a: manifold.body_a,
            body_b: manifold.body_b,
            kind,
            magnitude,
            iteration,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        collision::contact::{ContactFeature, ContactGeometry},
        core::{rigidbody::RigidBody, types::MaterialPairProperties},
        dynamics::observer::EventRecorder,
    };
    use approx::assert_abs_diff_eq;

    fn head_on_pair(restitution: f32) -> (BodiesSoA, Vec<ContactManifold>) {
        let mut bodies = BodiesSoA::with_capacity(2);
        let a = bodies
            .insert(
                RigidBody::sphere(1.0)
                    .with_position(Vec3::new(-0.9975, 0.0, 0.0))
                    .with_velocity(Vec3::X, Vec3::ZERO),
            )
            .expect("slot");
        let b = bodies
            .insert(
                RigidBody::sphere(1.0)
                    .with_position(Vec3::new(0.9975, 0.0, 0.0))
                    .with_velocity(Vec3::NEG_X, Vec3::ZERO),
            )
            .expect("slot");

        let geometry = ContactGeometry::single(
            Vec3::NEG_X,
            Vec3::new(0.0025, 0.0, 0.0),
            -0.005,
            ContactFeature::Point,
        );
        let material = MaterialPairProperties {
            restitution,
            friction: 0.0,
        };
        (bodies, vec![ContactManifold::new(a, b, geometry, material)])
    }

    #[test]
    fn presolve_does_not_touch_velocities() {
        let (bodies, mut manifolds) = head_on_pair(1.0);
        let before = bodies.velocities.clone();
        ContactSolver::default().presolve(&bodies, &mut manifolds, 1.0 / 60.0);
        assert_eq!(bodies.velocities, before);

        let data = manifolds[0].points[0].solver;
        assert_abs_diff_eq!(data.normal_mass, 0.5, epsilon = 1e-5);
        assert_eq!(data.bias, 0.0);
    }

    #[test]
    fn elastic_head_on_collision_reverses_velocities() {
        let (mut bodies, mut manifolds) = head_on_pair(1.0);
        let solver = ContactSolver::new(4);
        solver.presolve(&bodies, &mut manifolds, 1.0 / 60.0);
        solver.solve(&mut bodies, &manifolds, None);

        assert_abs_diff_eq!(bodies.velocities[0].linear.x, -1.0, epsilon = 1e-4);
        assert_abs_diff_eq!(bodies.velocities[1].linear.x, 1.0, epsilon = 1e-4);
    }

    #[test]
    fn normal_impulses_are_never_negative() {
        let (mut bodies, mut manifolds) = head_on_pair(0.5);
        let recorder = EventRecorder::new();
        let solver = ContactSolver::new(8);
        solver.presolve(&bodies, &mut manifolds, 1.0 / 60.0);
        let observer = recorder.as_ref() as &dyn SolverObserver;
        let metrics = solver.solve(&mut bodies, &manifolds, Some(observer));

        let normals: Vec<f32> = recorder
            .events()
            .into_iter()
            .filter_map(|event| match event {
                SolverEvent::ImpulseApplied {
                    kind: ImpulseKind::Normal,
                    magnitude,
                    ..
                } => Some(magnitude),
                _ => None,
            })
            .collect();
        assert_eq!(normals.len(), 8);
        assert!(normals.iter().all(|&m| m >= 0.0));
        assert!(metrics.normal_impulse_sum > 0.0);
    }

    #[test]
    fn penetration_beyond_slop_adds_bias() {
        let (bodies, mut manifolds) = head_on_pair(0.0);
        manifolds[0].points[0].depth = -0.11;
        let solver = ContactSolver::default();
        solver.presolve(&bodies, &mut manifolds, 0.1);
        assert_abs_diff_eq!(manifolds[0].points[0].solver.bias, 0.2, epsilon = 1e-5);
    }

    /// Unit sphere sliding along +X while resting on a static slab.
    fn sliding_sphere(friction: f32) -> (BodiesSoA, Vec<ContactManifold>) {
        let mut bodies = BodiesSoA::with_capacity(2);
        let ball = bodies
            .insert(
                RigidBody::sphere(1.0)
                    .with_position(Vec3::new(0.0, 1.0, 0.0))
                    .with_velocity(Vec3::new(2.0, -1.0, 0.0), Vec3::ZERO),
            )
            .expect("slot");
        let ground = bodies
            .insert(
                RigidBody::cuboid(Vec3::new(10.0, 1.0, 10.0))
                    .with_position(Vec3::new(0.0, -0.5, 0.0))
                    .with_static(true),
            )
            .expect("slot");

        let geometry = ContactGeometry::single(Vec3::Y, Vec3::ZERO, -0.005, ContactFeature::Point);
        let material = MaterialPairProperties {
            restitution: 0.0,
            friction,
        };
        (bodies, vec![ContactManifold::new(ball, ground, geometry, material)])
    }

    #[test]
    fn presolve_caches_tangent_effective_masses() {
        let (bodies, mut manifolds) = sliding_sphere(0.5);
        ContactSolver::default().presolve(&bodies, &mut manifolds, 1.0 / 60.0);

        // Lever arm is perpendicular to both tangents: 1 / (1 + 1 * 2.5 * 1).
        let data = manifolds[0].points[0].solver;
        assert_abs_diff_eq!(data.normal_mass, 1.0, epsilon = 1e-5);
        for mass in data.tangent_mass {
            assert_abs_diff_eq!(mass, 1.0 / 3.5, epsilon = 1e-5);
        }
        assert_eq!(data.r_a, Vec3::NEG_Y);
    }

    #[test]
    fn friction_impulses_stay_inside_the_coulomb_box() {
        let friction = 0.5;
        let (mut bodies, mut manifolds) = sliding_sphere(friction);
        let recorder = EventRecorder::new();
        let solver = ContactSolver::new(4);
        solver.presolve(&bodies, &mut manifolds, 1.0 / 60.0);
        let observer = recorder.as_ref() as &dyn SolverObserver;
        let metrics = solver.solve(&mut bodies, &manifolds, Some(observer));

        let mut last_normal = 0.0;
        let mut clamped = 0;
        let mut tangent_events = 0;
        for event in recorder.events() {
            let SolverEvent::ImpulseApplied {
                kind, magnitude, ..
            } = event
            else {
                continue;
            };
            match kind {
                ImpulseKind::Normal => last_normal = magnitude,
                ImpulseKind::Tangent(_) => {
                    tangent_events += 1;
                    let limit = friction * last_normal;
                    assert!(magnitude.abs() <= limit + 1e-6, "{magnitude} exceeds {limit}");
                    if (magnitude.abs() - limit).abs() < 1e-6 {
                        clamped += 1;
                    }
                }
            }
        }

        // Unclamped the first pass would ask for 2 / 3.5 against a limit of 0.5.
        assert!(tangent_events > 0);
        assert!(clamped > 0);
        assert!(metrics.tangent_impulse_sum > 0.0);
        assert!(bodies.velocities[0].linear.x < 2.0);
        assert!(bodies.velocities[0].angular.z < 0.0);
    }
}
