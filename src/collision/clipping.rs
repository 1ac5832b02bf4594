use glam::Vec3;

use crate::core::plane::Plane;

/// Points closer than this to a clipping plane count as inside.
pub const CLIP_TOLERANCE: f32 = 1e-4;

/// Clips the provided polygon against a set of planes using the Sutherland-Hodgman algorithm.
///
/// The kept half-space of every plane is the one its normal points away from.
pub fn clip_polygon(vertices: &[Vec3], planes: impl IntoIterator<Item = Plane>) -> Vec<Vec3> {
    let mut output = vertices.to_vec();
    for plane in planes {
        output = clip_against_plane(&output, &plane);
        if output.is_empty() {
            break;
        }
    }
    output
}

fn clip_against_plane(vertices: &[Vec3], plane: &Plane) -> Vec<Vec3> {
    if vertices.is_empty() {
        return Vec::new();
    }

    let mut clipped = Vec::with_capacity(vertices.len() + 1);
    for i in 0..vertices.len() {
        let current = vertices[i];
        let next = vertices[(i + 1) % vertices.len()];

        let current_dist = plane.signed_distance(current);
        let next_dist = plane.signed_distance(next);

        let current_inside = current_dist <= CLIP_TOLERANCE;
        let next_inside = next_dist <= CLIP_TOLERANCE;

        match (current_inside, next_inside) {
            (true, true) => clipped.push(next),
            (true, false) => {
                if let Some(point) =
                    segment_plane_intersection(current, next, current_dist, next_dist)
                {
                    clipped.push(point);
                }
            }
            (false, true) => {
                if let Some(point) =
                    segment_plane_intersection(current, next, current_dist, next_dist)
                {
                    clipped.push(point);
                }
                clipped.push(next);
            }
            (false, false) => {}
        }
    }

    clipped
}

fn segment_plane_intersection(
    start: Vec3,
    end: Vec3,
    start_dist: f32,
    end_dist: f32,
) -> Option<Vec3> {
    let denom = start_dist - end_dist;
    if denom.abs() <= f32::EPSILON {
        return None;
    }
    let t = start_dist / denom;
    Some(start + (end - start) * t)
}

/// Removes points lying within `tolerance` of an earlier point, keeping order.
pub fn weld_points(points: &mut Vec<Vec3>, tolerance: f32) {
    let tolerance_sq = tolerance * tolerance;
    let mut kept: Vec<Vec3> = Vec::with_capacity(points.len());
    for &p in points.iter() {
        if kept.iter().all(|q| q.distance_squared(p) > tolerance_sq) {
            kept.push(p);
        }
    }
    *points = kept;
}
