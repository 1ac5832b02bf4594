use glam::{Mat3, Quat, Vec3};

use super::{
    collider::{ColliderShape, ShapeKind},
    convex::ConvexShape,
    types::{Material, Transform, Velocity},
};
use crate::error::{PhysicsError, Result};

/// Description of one physics instance, used to create and read back slots.
#[derive(Debug, Clone, PartialEq)]
pub struct RigidBody {
    pub transform: Transform,
    pub velocity: Velocity,
    pub mass: f32,
    pub material: Material,
    pub shape: ColliderShape,
    pub is_static: bool,
    pub enabled: bool,
}

/// Inverse mass terms derived from a validated body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MassProperties {
    pub inverse_mass: f32,
    pub local_inverse_inertia: Mat3,
}

impl RigidBody {
    pub fn new(shape: ColliderShape) -> Self {
        Self {
            transform: Transform::default(),
            velocity: Velocity::default(),
            mass: 1.0,
            material: Material::default(),
            shape,
            is_static: false,
            enabled: true,
        }
    }

    pub fn sphere(radius: f32) -> Self {
        Self::new(ColliderShape::sphere(radius))
    }

    pub fn cuboid(size: Vec3) -> Self {
        Self::new(ColliderShape::cuboid(size))
    }

    pub fn convex(hull: ConvexShape) -> Self {
        Self::new(ColliderShape::ConvexMesh { hull })
    }

    /// Static half-space with outward `normal`.
    pub fn plane(normal: Vec3) -> Self {
        Self::new(ColliderShape::plane(normal)).with_static(true)
    }

    pub fn with_position(mut self, position: Vec3) -> Self {
        self.transform.position = position;
        self
    }

    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.transform.rotation = rotation;
        self
    }

    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.transform.scale = scale;
        self
    }

    pub fn with_mass(mut self, mass: f32) -> Self {
        self.mass = mass;
        self
    }

    pub fn with_material(mut self, material: Material) -> Self {
        self.material = material;
        self
    }

    pub fn with_restitution(mut self, restitution: f32) -> Self {
        self.material.restitution = restitution;
        self
    }

    pub fn with_friction(mut self, friction: f32) -> Self {
        self.material.friction = friction;
        self
    }

    pub fn with_velocity(mut self, linear: Vec3, angular: Vec3) -> Self {
        self.velocity = Velocity::new(linear, angular);
        self
    }

    pub fn with_static(mut self, is_static: bool) -> Self {
        self.is_static = is_static;
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn shape_kind(&self) -> ShapeKind {
        self.shape.kind()
    }

    /// Checks the body for configuration faults and derives its inverse mass terms.
    pub fn mass_properties(&self) -> Result<MassProperties> {
        self.shape.validate()?;
        if self.shape_kind() == ShapeKind::Plane && !self.is_static {
            return Err(PhysicsError::StaticPlaneRequired);
        }
        if !self.transform.position.is_finite() || !self.transform.rotation.is_finite() {
            return Err(PhysicsError::InvalidDimensions(self.transform.position));
        }

        if self.is_static {
            return Ok(MassProperties {
                inverse_mass: 0.0,
                local_inverse_inertia: Mat3::ZERO,
            });
        }

        if !self.mass.is_finite() || self.mass <= f32::EPSILON {
            return Err(PhysicsError::InvalidMass(self.mass));
        }

        let scale = self.shape.transform_scale(self.transform.scale);
        if !scale.is_finite() || scale.min_element() <= 0.0 {
            return Err(PhysicsError::InvalidDimensions(scale));
        }

        let inertia = self.shape.local_inertia(self.mass, scale);
        if inertia.determinant().abs() < f32::EPSILON {
            return Err(PhysicsError::InvalidMass(self.mass));
        }

        Ok(MassProperties {
            inverse_mass: 1.0 / self.mass,
            local_inverse_inertia: inertia.inverse(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn static_bodies_have_zero_inverses() {
        let props = RigidBody::cuboid(Vec3::ONE)
            .with_static(true)
            .with_mass(0.0)
            .mass_properties()
            .expect("static box is valid");
        assert_eq!(props.inverse_mass, 0.0);
        assert_eq!(props.local_inverse_inertia, Mat3::ZERO);
    }

    #[test]
    fn dynamic_sphere_inverse_inertia() {
        let props = RigidBody::sphere(1.0)
            .with_mass(2.5)
            .mass_properties()
            .expect("sphere is valid");
        assert_relative_eq!(props.inverse_mass, 0.4);
        // I = 2/5 m r^2 = 1.0
        assert_relative_eq!(props.local_inverse_inertia.x_axis.x, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn rejects_bad_mass_and_dynamic_planes() {
        assert_eq!(
            RigidBody::sphere(1.0).with_mass(0.0).mass_properties(),
            Err(PhysicsError::InvalidMass(0.0))
        );
        assert!(matches!(
            RigidBody::sphere(1.0).with_mass(-1.0).mass_properties(),
            Err(PhysicsError::InvalidMass(_))
        ));
        assert_eq!(
            RigidBody::plane(Vec3::Y).with_static(false).mass_properties(),
            Err(PhysicsError::StaticPlaneRequired)
        );
    }
}
