//! Matrix helpers for the layer scene.
//!
//! All matrices are column-major [`glam::Mat4`]. Products compose the way
//! they read: in `a * b` the vertex goes through `b` first, then `a`.
//! Projections target a 0..1 clip depth, which is what wgpu expects.

use glam::{Mat4, Vec3};

/// Squared length below which a direction is treated as zero.
const DEGENERATE_EPSILON: f32 = 1e-12;

/// The identity matrix.
pub fn identity() -> Mat4 {
    Mat4::IDENTITY
}

/// Translation by `offset`.
pub fn translate(offset: Vec3) -> Mat4 {
    Mat4::from_translation(offset)
}

/// Rotation of `radians` around the +Z axis.
pub fn rotate_z(radians: f32) -> Mat4 {
    Mat4::from_rotation_z(radians)
}

/// Right-handed view matrix, or `None` when the basis would be degenerate.
///
/// Degenerate inputs are `eye == target`, a zero `up` vector, or an `up`
/// vector parallel to the viewing direction.
pub fn try_look_at(eye: Vec3, target: Vec3, up: Vec3) -> Option<Mat4> {
    let forward = target - eye;
    if forward.length_squared() <= DEGENERATE_EPSILON || up.length_squared() <= DEGENERATE_EPSILON
    {
        return None;
    }
    let side = forward.normalize().cross(up.normalize());
    if side.length_squared() <= DEGENERATE_EPSILON {
        return None;
    }
    Some(Mat4::look_at_rh(eye, target, up))
}

/// Right-handed view matrix.
///
/// Falls back to the identity sentinel for the degenerate inputs listed on
/// [`try_look_at`] instead of producing NaNs.
pub fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4 {
    try_look_at(eye, target, up).unwrap_or_else(|| {
        tracing::warn!(
            ?eye,
            ?target,
            ?up,
            "degenerate look-at basis, using identity view"
        );
        Mat4::IDENTITY
    })
}

/// Right-handed perspective projection. `fov_y` is in radians.
pub fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
    Mat4::perspective_rh(fov_y, aspect, near, far)
}

/// Right-handed orthographic projection.
pub fn orthographic(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Mat4 {
    Mat4::orthographic_rh(left, right, bottom, top, near, far)
}

/// Multiplies `matrices` left to right. An empty chain is the identity.
pub fn multiply_chain(matrices: &[Mat4]) -> Mat4 {
    matrices
        .iter()
        .fold(Mat4::IDENTITY, |product, matrix| product * *matrix)
}

/// Rotation of `radians` around the Z axis passing through `pivot`.
pub fn rotate_about(pivot: Vec3, radians: f32) -> Mat4 {
    multiply_chain(&[translate(pivot), rotate_z(radians), translate(-pivot)])
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f32 = 1e-4;

    fn sample_matrix() -> Mat4 {
        multiply_chain(&[
            translate(Vec3::new(3.0, -2.0, 7.0)),
            rotate_z(0.4),
            Mat4::from_scale(Vec3::new(2.0, 1.0, 0.5)),
        ])
    }

    #[test]
    fn test_rotate_zero_is_neutral() {
        let m = sample_matrix();
        assert!((rotate_z(0.0) * m).abs_diff_eq(m, TOLERANCE));
        assert!((m * rotate_z(0.0)).abs_diff_eq(m, TOLERANCE));
    }

    #[test]
    fn test_rotate_inverse_pair() {
        for degrees in [15.0_f32, 90.0, 181.0, 359.0] {
            let theta = degrees.to_radians();
            let product = rotate_z(theta) * rotate_z(-theta);
            assert!(product.abs_diff_eq(identity(), TOLERANCE));
        }
    }

    #[test]
    fn test_chain_order_applies_rightmost_first() {
        let chain = multiply_chain(&[translate(Vec3::X), rotate_z(90_f32.to_radians())]);
        // Rotate (1,0,0) to (0,1,0), then shift by +X.
        let p = chain.transform_point3(Vec3::X);
        assert!(p.abs_diff_eq(Vec3::new(1.0, 1.0, 0.0), TOLERANCE));
    }

    #[test]
    fn test_empty_chain_is_identity() {
        assert_eq!(multiply_chain(&[]), Mat4::IDENTITY);
    }

    #[test]
    fn test_rotate_about_keeps_pivot_fixed() {
        let pivot = Vec3::new(1200.0, -450.0, 30.0);
        for degrees in [0.0_f32, 45.0, 200.0] {
            let m = rotate_about(pivot, degrees.to_radians());
            assert!(m.transform_point3(pivot).abs_diff_eq(pivot, 1e-2));
        }
    }

    #[test]
    fn test_look_at_same_point_is_identity() {
        let p = Vec3::new(1.0, 2.0, 3.0);
        assert!(try_look_at(p, p, Vec3::Z).is_none());
        assert_eq!(look_at(p, p, Vec3::Z), Mat4::IDENTITY);
    }

    #[test]
    fn test_look_at_parallel_up_is_identity() {
        let eye = Vec3::new(0.0, 0.0, 10.0);
        let view = look_at(eye, Vec3::ZERO, Vec3::Z);
        assert_eq!(view, Mat4::IDENTITY);
        assert!(!view.is_nan());
    }

    #[test]
    fn test_look_at_puts_target_on_negative_z() {
        let eye = Vec3::new(10.0, 10.0, 10.0);
        let view = look_at(eye, Vec3::ZERO, Vec3::Z);
        let target = view.transform_point3(Vec3::ZERO);
        assert!(target.x.abs() < TOLERANCE);
        assert!(target.y.abs() < TOLERANCE);
        assert!(target.z < 0.0);
    }

    #[test]
    fn test_orthographic_maps_box_to_clip() {
        let proj = orthographic(-10.0, 10.0, -5.0, 5.0, 1.0, 101.0);
        let near_corner = proj.transform_point3(Vec3::new(10.0, 5.0, -1.0));
        assert!(near_corner.abs_diff_eq(Vec3::new(1.0, 1.0, 0.0), TOLERANCE));
        let far_center = proj.transform_point3(Vec3::new(0.0, 0.0, -101.0));
        assert!(far_center.abs_diff_eq(Vec3::new(0.0, 0.0, 1.0), TOLERANCE));
    }
}
