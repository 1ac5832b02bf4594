use crate::config::DEFAULT_VELOCITY_DAMPING;
use crate::core::{
    soa::BodiesSoA,
    types::{Transform, Velocity},
};
use crate::utils::math::integrate_rotation;

/// Integrator responsible for stepping rigid bodies forward in time.
#[derive(Debug, Clone)]
pub struct Integrator {
    /// Multiplier applied to both velocities after every step.
    pub damping: f32,
}

impl Default for Integrator {
    fn default() -> Self {
        Self::new(DEFAULT_VELOCITY_DAMPING)
    }
}

impl Integrator {
    pub fn new(damping: f32) -> Self {
        Self {
            damping: damping.clamp(0.0, 1.0),
        }
    }

    pub fn integrate_body(&self, transform: &mut Transform, velocity: &mut Velocity, dt: f32) {
        transform.position += velocity.linear * dt;
        transform.rotation = integrate_rotation(transform.rotation, velocity.angular, dt);

        velocity.linear *= self.damping;
        velocity.angular *= self.damping;
    }

    /// Advances every enabled, non-static body.
    pub fn step(&self, bodies: &mut BodiesSoA, dt: f32) {
        for index in 0..bodies.capacity() {
            if !bodies.is_movable(index) {
                continue;
            }
            self.integrate_body(&mut bodies.transforms[index], &mut bodies.velocities[index], dt);
        }
    }
}
