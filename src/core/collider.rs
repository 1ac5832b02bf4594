use glam::{Mat3, Vec3};
use serde::{Deserialize, Serialize};

use super::{
    convex::ConvexShape,
    plane::Plane,
    types::{InertiaTensorExt, Transform},
};
use crate::error::{PhysicsError, Result};

/// Shape tag stored per instance slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShapeKind {
    Sphere,
    Box,
    ConvexMesh,
    Plane,
}

/// Enumeration of supported collider geometries.
#[derive(Debug, Clone, PartialEq)]
pub enum ColliderShape {
    Sphere {
        radius: f32,
    },
    /// Box with full edge lengths `size`.
    Box {
        size: Vec3,
    },
    ConvexMesh {
        hull: ConvexShape,
    },
    /// Static half-space through the body position; `normal` is in body space.
    Plane {
        normal: Vec3,
    },
}

impl ColliderShape {
    pub fn sphere(radius: f32) -> Self {
        ColliderShape::Sphere { radius }
    }

    pub fn cuboid(size: Vec3) -> Self {
        ColliderShape::Box { size }
    }

    pub fn convex(vertices: Vec<Vec3>, faces: Vec<Vec<usize>>) -> Result<Self> {
        Ok(ColliderShape::ConvexMesh {
            hull: ConvexShape::from_faces(vertices, faces)?,
        })
    }

    pub fn plane(normal: Vec3) -> Self {
        ColliderShape::Plane { normal }
    }

    pub fn kind(&self) -> ShapeKind {
        match self {
            ColliderShape::Sphere { .. } => ShapeKind::Sphere,
            ColliderShape::Box { .. } => ShapeKind::Box,
            ColliderShape::ConvexMesh { .. } => ShapeKind::ConvexMesh,
            ColliderShape::Plane { .. } => ShapeKind::Plane,
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            ColliderShape::Sphere { radius } => {
                if !radius.is_finite() || *radius <= 0.0 {
                    return Err(PhysicsError::InvalidDimensions(Vec3::splat(*radius)));
                }
            }
            ColliderShape::Box { size } => {
                if !size.is_finite() || size.min_element() <= 0.0 {
                    return Err(PhysicsError::InvalidDimensions(*size));
                }
            }
            ColliderShape::ConvexMesh { hull } => hull.validate()?,
            ColliderShape::Plane { normal } => {
                if !normal.is_finite() || normal.length_squared() < 1e-12 {
                    return Err(PhysicsError::DegenerateNormal);
                }
            }
        }
        Ok(())
    }

    /// Scale written into the body transform when the collider is created.
    ///
    /// Spheres store their radius in every component and boxes their edge
    /// lengths, so the unit box template maps onto the real extents.
    pub fn transform_scale(&self, requested: Vec3) -> Vec3 {
        match self {
            ColliderShape::Sphere { radius } => Vec3::splat(*radius),
            ColliderShape::Box { size } => *size,
            ColliderShape::ConvexMesh { .. } => requested,
            ColliderShape::Plane { .. } => Vec3::ONE,
        }
    }

    /// Body-space inertia tensor for `mass` under the given transform scale.
    pub fn local_inertia(&self, mass: f32, scale: Vec3) -> Mat3 {
        match self {
            ColliderShape::Sphere { .. } => Mat3::for_solid_sphere(scale.max_element(), mass),
            ColliderShape::Box { .. } => Mat3::for_solid_box(scale, mass),
            ColliderShape::ConvexMesh { hull } => {
                let scaled = hull.transformed(&Transform {
                    scale,
                    ..Transform::default()
                });
                scaled.approximate_inertia(mass)
            }
            ColliderShape::Plane { .. } => Mat3::ZERO,
        }
    }

    /// Local-space polyhedron for shapes tested with the separating-axis code.
    pub fn local_convex(&self) -> Option<ConvexShape> {
        match self {
            ColliderShape::Box { .. } => Some(ConvexShape::cuboid(Vec3::ONE)),
            ColliderShape::ConvexMesh { hull } => Some(hull.clone()),
            ColliderShape::Sphere { .. } | ColliderShape::Plane { .. } => None,
        }
    }
}

/// World-space geometry handed to the narrow phase.
#[derive(Debug, Clone, Copy)]
pub enum WorldShape<'a> {
    Sphere { center: Vec3, radius: f32 },
    Plane(Plane),
    Convex(&'a ConvexShape),
}

impl WorldShape<'_> {
    pub fn kind(&self) -> ShapeKind {
        match self {
            WorldShape::Sphere { .. } => ShapeKind::Sphere,
            WorldShape::Plane(_) => ShapeKind::Plane,
            WorldShape::Convex(shape) if shape.is_box() => ShapeKind::Box,
            WorldShape::Convex(_) => ShapeKind::ConvexMesh,
        }
    }
}
