use glam::Vec3;

use super::{
    contact::{ContactFeature, ContactGeometry, ContactPoint},
    sat::SatAlgorithm,
};
use crate::core::{collider::WorldShape, convex::ConvexShape, plane::Plane};

/// Pairwise collision testers.
///
/// Every tester reports its normal pointing from the second argument toward
/// the first one, so pushing the first shape along it separates the pair.
pub struct NarrowPhase;

impl NarrowPhase {
    /// Dispatches on the shape kinds. `None` means the shapes do not overlap.
    pub fn collide(first: &WorldShape<'_>, second: &WorldShape<'_>) -> Option<ContactGeometry> {
        match (*first, *second) {
            (
                WorldShape::Sphere {
                    center: center_a,
                    radius: radius_a,
                },
                WorldShape::Sphere {
                    center: center_b,
                    radius: radius_b,
                },
            ) => Self::sphere_sphere(center_a, radius_a, center_b, radius_b),
            (WorldShape::Sphere { center, radius }, WorldShape::Plane(plane)) => {
                Self::sphere_plane(center, radius, &plane)
            }
            (WorldShape::Plane(plane), WorldShape::Sphere { center, radius }) => {
                Self::sphere_plane(center, radius, &plane).map(ContactGeometry::flipped)
            }
            (WorldShape::Sphere { center, radius }, WorldShape::Convex(shape)) => {
                Self::sphere_convex(center, radius, shape)
            }
            (WorldShape::Convex(shape), WorldShape::Sphere { center, radius }) => {
                Self::sphere_convex(center, radius, shape).map(ContactGeometry::flipped)
            }
            (WorldShape::Convex(a), WorldShape::Convex(b)) => SatAlgorithm::intersect(a, b),
            (WorldShape::Convex(shape), WorldShape::Plane(plane)) => {
                Self::convex_plane(shape, &plane)
            }
            (WorldShape::Plane(plane), WorldShape::Convex(shape)) => {
                Self::convex_plane(shape, &plane).map(ContactGeometry::flipped)
            }
            (WorldShape::Plane(_), WorldShape::Plane(_)) => None,
        }
    }

    /// Collides iff the centre distance is below the radius sum.
    ///
    /// The contact sits on the first sphere's surface facing the second one.
    pub fn sphere_sphere(
        center_a: Vec3,
        radius_a: f32,
        center_b: Vec3,
        radius_b: f32,
    ) -> Option<ContactGeometry> {
        let offset = center_a - center_b;
        let distance = offset.length();
        let radii = radius_a + radius_b;
        if distance >= radii {
            return None;
        }

        let normal = if distance > f32::EPSILON {
            offset / distance
        } else {
            Vec3::Y
        };

        Some(ContactGeometry::single(
            normal,
            center_a - normal * radius_a,
            distance - radii,
            ContactFeature::Point,
        ))
    }

    /// Sphere against a half-space; the contact is the centre projected onto the plane.
    pub fn sphere_plane(center: Vec3, radius: f32, plane: &Plane) -> Option<ContactGeometry> {
        let depth = plane.signed_distance(center) - radius;
        if depth >= 0.0 {
            return None;
        }
        Some(ContactGeometry::single(
            plane.normal,
            plane.project_point(center),
            depth,
            ContactFeature::Point,
        ))
    }

    /// Sphere against the polyhedron face whose plane lies closest to the sphere's outside.
    pub fn sphere_convex(
        center: Vec3,
        radius: f32,
        shape: &ConvexShape,
    ) -> Option<ContactGeometry> {
        let (face, _) = shape
            .faces()
            .iter()
            .enumerate()
            .map(|(index, face)| (index, face.plane().signed_distance(center)))
            .fold((0, f32::MIN), |best, candidate| {
                if candidate.1 > best.1 {
                    candidate
                } else {
                    best
                }
            });

        let mut contact = Self::sphere_plane(center, radius, &shape.face_plane(face))?;
        contact.feature = ContactFeature::FacePlane { face };
        Some(contact)
    }

    /// Every vertex below the plane becomes a contact.
    pub fn convex_plane(shape: &ConvexShape, plane: &Plane) -> Option<ContactGeometry> {
        let points: Vec<ContactPoint> = shape
            .vertices()
            .iter()
            .filter_map(|&v| {
                let depth = plane.signed_distance(v);
                (depth < 0.0).then(|| ContactPoint::new(v, depth))
            })
            .collect();

        if points.is_empty() {
            return None;
        }
        Some(ContactGeometry::new(plane.normal, points, ContactFeature::Vertices))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Transform;
    use approx::assert_abs_diff_eq;

    fn unit_box_at(position: Vec3) -> ConvexShape {
        ConvexShape::cuboid(Vec3::ONE).transformed(&Transform::from_position(position))
    }

    #[test]
    fn sphere_normal_points_from_second_toward_first() {
        let contact = NarrowPhase::sphere_sphere(Vec3::ZERO, 1.0, Vec3::new(1.5, 0.0, 0.0), 1.0)
            .expect("spheres overlap");
        assert_eq!(contact.normal, Vec3::NEG_X);
        assert_abs_diff_eq!(contact.points[0].depth, -0.5, epsilon = 1e-6);
        assert_abs_diff_eq!(contact.points[0].position.x, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn coincident_spheres_use_up_axis() {
        let contact = NarrowPhase::sphere_sphere(Vec3::ONE, 0.5, Vec3::ONE, 0.5).expect("overlap");
        assert_eq!(contact.normal, Vec3::Y);
        assert_abs_diff_eq!(contact.points[0].depth, -1.0, epsilon = 1e-6);
    }

    #[test]
    fn touching_spheres_do_not_collide() {
        let far = Vec3::new(0.0, 2.0, 0.0);
        assert!(NarrowPhase::sphere_sphere(Vec3::ZERO, 1.0, far, 1.0).is_none());
    }

    #[test]
    fn sphere_resting_in_plane() {
        let ground = Plane::new(Vec3::ZERO, Vec3::Y);
        let contact =
            NarrowPhase::sphere_plane(Vec3::new(2.0, 0.4, 1.0), 0.5, &ground).expect("overlap");
        assert_eq!(contact.normal, Vec3::Y);
        assert_eq!(contact.points[0].position, Vec3::new(2.0, 0.0, 1.0));
        assert_abs_diff_eq!(contact.points[0].depth, -0.1, epsilon = 1e-6);

        assert!(NarrowPhase::sphere_plane(Vec3::new(0.0, 0.6, 0.0), 0.5, &ground).is_none());
    }

    #[test]
    fn sphere_against_box_uses_most_facing_face() {
        let shape = unit_box_at(Vec3::ZERO);
        let contact =
            NarrowPhase::sphere_convex(Vec3::new(0.9, 0.1, 0.0), 0.5, &shape).expect("overlap");
        assert_eq!(contact.normal, Vec3::X);
        assert_abs_diff_eq!(contact.points[0].depth, -0.1, epsilon = 1e-5);
        assert_eq!(contact.feature, ContactFeature::FacePlane { face: 0 });
    }

    #[test]
    fn dispatcher_flips_when_the_box_comes_first() {
        let shape = unit_box_at(Vec3::ZERO);
        let sphere = WorldShape::Sphere {
            center: Vec3::new(0.0, 0.8, 0.0),
            radius: 0.5,
        };
        let contact = NarrowPhase::collide(&WorldShape::Convex(&shape), &sphere).expect("overlap");
        assert_eq!(contact.normal, Vec3::NEG_Y);

        let contact = NarrowPhase::collide(&sphere, &WorldShape::Convex(&shape)).expect("overlap");
        assert_eq!(contact.normal, Vec3::Y);
    }

    #[test]
    fn box_sinking_into_plane_reports_bottom_vertices() {
        let shape = unit_box_at(Vec3::new(0.0, 0.45, 0.0));
        let ground = Plane::new(Vec3::ZERO, Vec3::Y);
        let contact = NarrowPhase::convex_plane(&shape, &ground).expect("overlap");
        assert_eq!(contact.points.len(), 4);
        for p in &contact.points {
            assert_abs_diff_eq!(p.depth, -0.05, epsilon = 1e-5);
        }

        let flipped = NarrowPhase::collide(&WorldShape::Plane(ground), &WorldShape::Convex(&shape))
            .expect("overlap");
        assert_eq!(flipped.normal, Vec3::NEG_Y);
    }

    #[test]
    fn planes_never_collide_with_each_other() {
        let plane = WorldShape::Plane(Plane::new(Vec3::ZERO, Vec3::Y));
        assert!(NarrowPhase::collide(&plane, &plane).is_none());
    }
}
