//! Separating-axis test between two convex polyhedra and manifold construction.

use glam::Vec3;

use super::{
    clipping::{clip_polygon, weld_points, CLIP_TOLERANCE},
    contact::{ContactFeature, ContactGeometry, ContactPoint},
};
use crate::core::convex::ConvexShape;
use crate::utils::math::closest_points_between_segments;

/// Cross products shorter than this come from near-parallel edges and are skipped.
const PARALLEL_EDGE_EPSILON: f32 = 1e-4;
/// Margin by which the first shape's face must beat the second one to become the reference.
const FACE_TOLERANCE: f32 = 1e-4;
/// Margin by which an edge axis must beat both face axes to be chosen.
const EDGE_TOLERANCE: f32 = 1e-3;
/// Contact points closer than this are merged.
const WELD_TOLERANCE: f32 = 1e-3;

/// Best axis found by one of the queries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisQuery {
    /// Interval overlap along the axis; always positive.
    pub overlap: f32,
    /// Axis oriented from the second shape toward the first one.
    pub normal: Vec3,
    /// Face index for face queries, edge indices for edge queries.
    pub feature: (usize, usize),
}

/// Projects both shapes onto `axis`.
///
/// Returns the overlap `len1 + len2 - combined_len` and the axis oriented from
/// the second interval toward the first one, decided by the interval minima.
pub fn axis_overlap(first: &ConvexShape, second: &ConvexShape, axis: Vec3) -> (f32, Vec3) {
    let (min1, max1) = first.project(axis);
    let (min2, max2) = second.project(axis);
    let combined = max1.max(max2) - min1.min(min2);
    let overlap = (max1 - min1) + (max2 - min2) - combined;
    let normal = if min1 < min2 { -axis } else { axis };
    (overlap, normal)
}

/// Separating-axis test for convex polyhedra.
pub struct SatAlgorithm;

impl SatAlgorithm {
    /// Tests the unique face normals of `owner`. `None` means a separating axis exists.
    pub fn query_faces(
        owner: &ConvexShape,
        first: &ConvexShape,
        second: &ConvexShape,
    ) -> Option<AxisQuery> {
        let mut best: Option<AxisQuery> = None;
        for face in owner.unique_face_axes() {
            let axis = owner.faces()[face].normal;
            let (overlap, normal) = axis_overlap(first, second, axis);
            if overlap <= 0.0 {
                return None;
            }
            if best.map_or(true, |b| overlap < b.overlap) {
                best = Some(AxisQuery {
                    overlap,
                    normal,
                    feature: (face, face),
                });
            }
        }
        best
    }

    /// Tests every cross product of an edge direction of `first` with one of `second`.
    ///
    /// `None` means a separating axis exists. When every edge pair is parallel the
    /// query reports an infinite overlap so it never wins against a face axis.
    pub fn query_edges(first: &ConvexShape, second: &ConvexShape) -> Option<AxisQuery> {
        let mut best = AxisQuery {
            overlap: f32::INFINITY,
            normal: Vec3::ZERO,
            feature: (0, 0),
        };
        let edges_second = second.unique_edge_axes();
        for edge_a in first.unique_edge_axes() {
            let dir_a = first.edge_direction(edge_a);
            for &edge_b in &edges_second {
                let cross = dir_a.cross(second.edge_direction(edge_b));
                let length = cross.length();
                if length < PARALLEL_EDGE_EPSILON {
                    continue;
                }
                let (overlap, normal) = axis_overlap(first, second, cross / length);
                if overlap <= 0.0 {
                    return None;
                }
                if overlap < best.overlap {
                    best = AxisQuery {
                        overlap,
                        normal,
                        feature: (edge_a, edge_b),
                    };
                }
            }
        }
        Some(best)
    }

    /// Full test. The returned normal points from `second` toward `first`.
    pub fn intersect(first: &ConvexShape, second: &ConvexShape) -> Option<ContactGeometry> {
        let face_first = Self::query_faces(first, first, second)?;
        let face_second = Self::query_faces(second, first, second)?;
        let edge = Self::query_edges(first, second)?;

        let reference_on_first = face_first.overlap + FACE_TOLERANCE < face_second.overlap;
        let face_best = if reference_on_first {
            face_first
        } else {
            face_second
        };

        if edge.overlap + EDGE_TOLERANCE < face_first.overlap.min(face_second.overlap) {
            return Some(Self::edge_contact(first, second, edge));
        }

        if reference_on_first {
            Self::face_contact(first, second, face_best.normal, true)
        } else {
            Self::face_contact(second, first, face_best.normal, false)
        }
    }

    /// Clips the incident face of `incident` against every face plane of `reference`.
    fn face_contact(
        reference: &ConvexShape,
        incident: &ConvexShape,
        normal: Vec3,
        reference_on_first: bool,
    ) -> Option<ContactGeometry> {
        // Direction from the reference shape toward the incident one.
        let toward_incident = if reference_on_first { -normal } else { normal };

        let reference_face = most_aligned_face(reference, toward_incident);
        let reference_plane = reference.face_plane(reference_face);
        let incident_face = most_aligned_face(incident, -reference_plane.normal);

        let mut clipped = clip_polygon(
            &incident.face_polygon(incident_face),
            reference.faces().iter().map(|f| f.plane()),
        );
        weld_points(&mut clipped, WELD_TOLERANCE);

        let mut points: Vec<ContactPoint> = clipped
            .into_iter()
            .filter_map(|p| {
                let depth = reference_plane.signed_distance(p);
                (depth <= CLIP_TOLERANCE).then(|| ContactPoint::new(p, depth.min(0.0)))
            })
            .collect();

        if points.is_empty() {
            let deepest = incident.support(-reference_plane.normal);
            let depth = reference_plane.signed_distance(deepest);
            if depth > 0.0 {
                return None;
            }
            points.push(ContactPoint::new(deepest, depth));
        }

        let manifold_normal = if reference_on_first {
            -reference_plane.normal
        } else {
            reference_plane.normal
        };

        Some(ContactGeometry::new(
            manifold_normal,
            points,
            ContactFeature::Face {
                reference_face,
                incident_face,
                reference_on_first,
            },
        ))
    }

    /// Single contact midway between the supporting edges of the winning axis.
    fn edge_contact(
        first: &ConvexShape,
        second: &ConvexShape,
        query: AxisQuery,
    ) -> ContactGeometry {
        let normal = query.normal;
        let edge_first = supporting_edge(first, query.feature.0, -normal);
        let edge_second = supporting_edge(second, query.feature.1, normal);

        let (p1, q1) = first.edge_segment(edge_first);
        let (p2, q2) = second.edge_segment(edge_second);
        let (on_first, on_second) = closest_points_between_segments(p1, q1, p2, q2);

        ContactGeometry::single(
            normal,
            (on_first + on_second) * 0.5,
            -query.overlap,
            ContactFeature::EdgeEdge {
                edge_first,
                edge_second,
            },
        )
    }
}

fn most_aligned_face(shape: &ConvexShape, direction: Vec3) -> usize {
    shape
        .faces()
        .iter()
        .enumerate()
        .fold((0, f32::MIN), |(best, best_dot), (index, face)| {
            let d = face.normal.dot(direction);
            if d > best_dot {
                (index, d)
            } else {
                (best, best_dot)
            }
        })
        .0
}

/// Among the edges parallel to `template`, the one furthest along `direction`.
fn supporting_edge(shape: &ConvexShape, template: usize, direction: Vec3) -> usize {
    let axis = shape.edge_direction(template);
    (0..shape.edges().len())
        .filter(|&e| shape.edge_direction(e).dot(axis).abs() > 1.0 - 1e-5)
        .fold((template, f32::MIN), |(best, best_dot), e| {
            let (a, b) = shape.edge_segment(e);
            let d = ((a + b) * 0.5).dot(direction);
            if d > best_dot {
                (e, d)
            } else {
                (best, best_dot)
            }
        })
        .0
}
