//! Small transform helpers shared by baking and the planar constraint passes.
//!
//! Conventions
//! - The simulation plane is XY; the plane normal (and "forward" depth axis) is +Z.
//! - Euler angles follow nalgebra's `(roll, pitch, yaw)` about `(X, Y, Z)`, so the
//!   in-plane rotation component is always the yaw.

use nalgebra::{Isometry3, Matrix3, Matrix4, Rotation3, Translation3, UnitQuaternion, Vector3};

use crate::constants::SCALE_EPS_SQ;

/// Reduce a world matrix to a pure rigid transform (translation + rotation).
///
/// Scale and shear are discarded by orthonormalizing the upper 3x3 block
/// (Gram-Schmidt on the X then Y columns, Z rebuilt from their cross product).
pub fn decompose_rigid(local_to_world: &Matrix4<f32>) -> Isometry3<f32> {
    let translation = Vector3::new(
        local_to_world[(0, 3)],
        local_to_world[(1, 3)],
        local_to_world[(2, 3)],
    );
    let linear: Matrix3<f32> = local_to_world.fixed_view::<3, 3>(0, 0).into_owned();

    Isometry3::from_parts(Translation3::from(translation), orthonormal_rotation(&linear))
}

fn orthonormal_rotation(linear: &Matrix3<f32>) -> UnitQuaternion<f32> {
    const EPS: f32 = 1.0e-12;

    let Some(x) = linear.column(0).into_owned().try_normalize(EPS) else {
        return UnitQuaternion::identity();
    };
    let c1 = linear.column(1).into_owned();
    let Some(y) = (c1 - x * x.dot(&c1)).try_normalize(EPS) else {
        return UnitQuaternion::identity();
    };
    let z = x.cross(&y);

    let basis = Matrix3::from_columns(&[x, y, z]);
    UnitQuaternion::from_rotation_matrix(&Rotation3::from_matrix_unchecked(basis))
}

/// Build a translation * rotation * scale matrix.
pub fn trs_matrix(
    position: &Vector3<f32>,
    rotation: &UnitQuaternion<f32>,
    scale: &Vector3<f32>,
) -> Matrix4<f32> {
    Matrix4::new_translation(position)
        * rotation.to_homogeneous()
        * Matrix4::new_nonuniform_scaling(scale)
}

/// In-plane rotation angle (radians about +Z).
#[inline]
pub fn yaw(rotation: &UnitQuaternion<f32>) -> f32 {
    rotation.euler_angles().2
}

/// Rotation about the plane normal only, keeping the yaw of `rotation`.
#[inline]
pub fn planar_rotation(rotation: &UnitQuaternion<f32>) -> UnitQuaternion<f32> {
    UnitQuaternion::from_axis_angle(&Vector3::z_axis(), yaw(rotation))
}

/// Keep the out-of-plane (roll/pitch) part of `rotation` but replace its yaw.
///
/// Applied as a world-Z rotation by the yaw difference rather than rebuilt from Euler
/// angles, so `with_yaw(q, yaw(q))` is `q` even at ±90° pitch.
#[inline]
pub fn with_yaw(rotation: &UnitQuaternion<f32>, yaw: f32) -> UnitQuaternion<f32> {
    let delta = yaw - self::yaw(rotation);
    UnitQuaternion::from_axis_angle(&Vector3::z_axis(), delta) * rotation
}

/// Returns true if `scale` is measurably different from `(1, 1, 1)`.
#[inline]
pub fn has_non_identity_scale(scale: &Vector3<f32>) -> bool {
    (scale - Vector3::repeat(1.0)).norm_squared() > SCALE_EPS_SQ
}

/// `1 / x`, or zero when `x` is not a positive finite number.
#[inline]
pub fn safe_recip(x: f32) -> f32 {
    if x > 0.0 && x.is_finite() { 1.0 / x } else { 0.0 }
}
