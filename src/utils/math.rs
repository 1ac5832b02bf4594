//! Additional math helpers layered on top of `glam`.

use glam::{Mat3, Quat, Vec3};

/// Advances `rotation` by `angular` (radians/sec) over `dt` using the first-order
/// quaternion derivative `q' = ½·(ω, 0)·q`, then renormalizes.
pub fn integrate_rotation(rotation: Quat, angular: Vec3, dt: f32) -> Quat {
    let spin = Quat::from_xyzw(angular.x, angular.y, angular.z, 0.0);
    let derivative = (spin * rotation) * (0.5 * dt);
    (rotation + derivative).normalize()
}

/// Rotates a body-space inverse inertia tensor into world space: `R·I⁻¹·Rᵀ`.
pub fn rotate_inverse_inertia(local_inverse_inertia: Mat3, rotation: Quat) -> Mat3 {
    let r = Mat3::from_quat(rotation);
    r * local_inverse_inertia * r.transpose()
}

/// Builds two unit tangents spanning the plane orthogonal to `normal`.
pub fn plane_space(normal: Vec3) -> [Vec3; 2] {
    let n = normal.normalize_or_zero();
    if n == Vec3::ZERO {
        return [Vec3::X, Vec3::Z];
    }
    let helper = if n.x.abs() < 0.57735 { Vec3::X } else { Vec3::Y };
    let t1 = n.cross(helper).normalize();
    let t2 = n.cross(t1);
    [t1, t2]
}

/// Closest points between segments `[p1, q1]` and `[p2, q2]`.
pub fn closest_points_between_segments(p1: Vec3, q1: Vec3, p2: Vec3, q2: Vec3) -> (Vec3, Vec3) {
    const EPSILON: f32 = 1e-8;

    let d1 = q1 - p1;
    let d2 = q2 - p2;
    let r = p1 - p2;
    let a = d1.length_squared();
    let e = d2.length_squared();
    let f = d2.dot(r);

    let (s, t) = if a <= EPSILON && e <= EPSILON {
        (0.0, 0.0)
    } else if a <= EPSILON {
        (0.0, (f / e).clamp(0.0, 1.0))
    } else {
        let c = d1.dot(r);
        if e <= EPSILON {
            ((-c / a).clamp(0.0, 1.0), 0.0)
        } else {
            let b = d1.dot(d2);
            let denom = a * e - b * b;
            let mut s = if denom > EPSILON {
                ((b * f - c * e) / denom).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let mut t = (b * s + f) / e;
            if t < 0.0 {
                t = 0.0;
                s = (-c / a).clamp(0.0, 1.0);
            } else if t > 1.0 {
                t = 1.0;
                s = ((b - c) / a).clamp(0.0, 1.0);
            }
            (s, t)
        }
    };

    (p1 + d1 * s, p2 + d2 * t)
}
