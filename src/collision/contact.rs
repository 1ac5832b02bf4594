use glam::Vec3;
use log::warn;

use crate::config::MAX_CONTACT_COUNT;
use crate::core::types::MaterialPairProperties;
use crate::utils::{math::plane_space, BodyHandle};

/// Per-point coefficients cached by the presolve pass.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ContactSolverData {
    /// Lever arm from body A's centre of mass to the contact.
    pub r_a: Vec3,
    /// Lever arm from body B's centre of mass to the contact.
    pub r_b: Vec3,
    /// Inverted effective mass along the normal.
    pub normal_mass: f32,
    /// Inverted effective masses along the two tangents.
    pub tangent_mass: [f32; 2],
    /// Baumgarte velocity bias.
    pub bias: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactPoint {
    pub position: Vec3,
    /// Signed separation; negative while overlapping.
    pub depth: f32,
    pub solver: ContactSolverData,
}

impl ContactPoint {
    pub fn new(position: Vec3, depth: f32) -> Self {
        Self {
            position,
            depth,
            solver: ContactSolverData::default(),
        }
    }
}

/// Features of the two shapes that produced a contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactFeature {
    /// Sphere contact against a sphere or plane.
    Point,
    /// Sphere against the given face of a polyhedron.
    FacePlane { face: usize },
    /// Polyhedron vertices against a half-space.
    Vertices,
    /// Clipped face contact. `reference_on_first` says which shape owns the reference face.
    Face {
        reference_face: usize,
        incident_face: usize,
        reference_on_first: bool,
    },
    EdgeEdge { edge_first: usize, edge_second: usize },
}

impl ContactFeature {
    fn swapped(self) -> Self {
        match self {
            ContactFeature::Face {
                reference_face,
                incident_face,
                reference_on_first,
            } => ContactFeature::Face {
                reference_face,
                incident_face,
                reference_on_first: !reference_on_first,
            },
            ContactFeature::EdgeEdge {
                edge_first,
                edge_second,
            } => ContactFeature::EdgeEdge {
                edge_first: edge_second,
                edge_second: edge_first,
            },
            other => other,
        }
    }
}

/// Raw output of a narrow-phase tester.
///
/// `normal` points from the second shape toward the first one.
#[derive(Debug, Clone, PartialEq)]
pub struct ContactGeometry {
    pub normal: Vec3,
    pub points: Vec<ContactPoint>,
    pub feature: ContactFeature,
}

impl ContactGeometry {
    pub fn new(normal: Vec3, points: Vec<ContactPoint>, feature: ContactFeature) -> Self {
        Self {
            normal,
            points,
            feature,
        }
    }

    pub fn single(normal: Vec3, position: Vec3, depth: f32, feature: ContactFeature) -> Self {
        Self::new(normal, vec![ContactPoint::new(position, depth)], feature)
    }

    /// Same contact seen with the two shapes swapped.
    pub fn flipped(mut self) -> Self {
        self.normal = -self.normal;
        self.feature = self.feature.swapped();
        self
    }
}

/// Contact manifold for one colliding pair this step.
#[derive(Debug, Clone, PartialEq)]
pub struct ContactManifold {
    pub body_a: BodyHandle,
    pub body_b: BodyHandle,
    /// Unit normal pointing from body B toward body A.
    pub normal: Vec3,
    pub tangents: [Vec3; 2],
    pub points: Vec<ContactPoint>,
    pub feature: ContactFeature,
    pub restitution: f32,
    pub friction: f32,
}

impl ContactManifold {
    /// Builds a manifold, keeping at most [`MAX_CONTACT_COUNT`] points (lowest index wins).
    pub fn new(
        body_a: BodyHandle,
        body_b: BodyHandle,
        geometry: ContactGeometry,
        material: MaterialPairProperties,
    ) -> Self {
        let mut points = geometry.points;
        if points.len() > MAX_CONTACT_COUNT {
            warn!(
                "manifold {:?}/{:?} truncated from {} to {} points",
                body_a,
                body_b,
                points.len(),
                MAX_CONTACT_COUNT
            );
            points.truncate(MAX_CONTACT_COUNT);
        }
        let normal = geometry.normal.normalize_or_zero();

        Self {
            body_a,
            body_b,
            normal,
            tangents: plane_space(normal),
            points,
            feature: geometry.feature,
            restitution: material.restitution,
            friction: material.friction,
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn is_valid(&self) -> bool {
        !self.points.is_empty() && (self.normal.length() - 1.0).abs() < 1e-4
    }

    pub fn deepest_depth(&self) -> f32 {
        self.points.iter().map(|p| p.depth).fold(0.0, f32::min)
    }
}
