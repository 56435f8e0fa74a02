//! Vector, rotation and matrix helpers layered over [`glam`].
//!
//! The scene graph stores its math in plain glam types ([`Vec3`], [`Quat`],
//! [`Mat4`]); this module adds the handful of operations whose exact
//! conventions matter to it:
//!
//! - [`Vec3Ext::normalize_in_place`] leaves a zero-length vector untouched
//! - [`quat_from_euler`] and [`quat_to_euler`] convert bank/heading/attitude
//! - [`Mat4Ext`] adds row/column element access, left-composition, TRS and
//!   perspective construction
//!
//! # Matrix layout
//!
//! Matrices are column-major. Element accessors are named row-then-column, so
//! the translation lives in `m03`, `m13` and `m23`:
//!
//! | m00 | m01 | m02 | m03 |
//! |-----|-----|-----|-----|
//! | m10 | m11 | m12 | m13 |
//! | m20 | m21 | m22 | m23 |
//! | m30 | m31 | m32 | m33 |
//!
//! ```
//! use tessera::{Mat4Ext, Quat, Vec3};
//!
//! let m = tessera::trs(Vec3::new(1.0, 2.0, 3.0), Quat::IDENTITY, Vec3::ONE);
//! assert_eq!((m.m03(), m.m13(), m.m23()), (1.0, 2.0, 3.0));
//! ```

use glam::{Mat4, Quat, Vec3};

use crate::error::{Error, Result};

/// In-place vector operations.
pub trait Vec3Ext {
    /// Scales the vector to unit length.
    ///
    /// A vector whose length is exactly zero is left unchanged.
    fn normalize_in_place(&mut self) -> &mut Self;
}

impl Vec3Ext for Vec3 {
    fn normalize_in_place(&mut self) -> &mut Self {
        let len = self.length();
        if len == 0.0 {
            return self;
        }
        *self /= len;
        self
    }
}

/// Builds a rotation from bank (about X), heading (about Y) and attitude
/// (about Z), all in radians.
///
/// The result is not renormalized; inputs near gimbal lock can drift from
/// unit length.
pub fn quat_from_euler(bank: f32, heading: f32, attitude: f32) -> Quat {
    let (s1, c1) = heading.sin_cos();
    let (s2, c2) = attitude.sin_cos();
    let (s3, c3) = bank.sin_cos();

    let w = (1.0 + c1 * c2 + c1 * c3 - s1 * s2 * s3 + c2 * c3).sqrt() / 2.0;
    let w4 = 4.0 * w;

    Quat::from_xyzw(
        (c2 * s3 + c1 * s3 + s1 * s2 * c3) / w4,
        (s1 * c2 + s1 * c3 + c1 * s2 * s3) / w4,
        (-s1 * s3 + c1 * s2 * c3 + s2) / w4,
        w,
    )
}

/// Recovers `(heading, attitude, bank)` from a unit rotation.
///
/// Near the poles (attitude ±90°) heading absorbs the whole twist and bank is
/// reported as zero.
pub fn quat_to_euler(q: Quat) -> (f32, f32, f32) {
    let test = q.x * q.y + q.z * q.w;

    if test > 0.499 {
        return (2.0 * q.x.atan2(q.w), std::f32::consts::FRAC_PI_2, 0.0);
    }
    if test < -0.499 {
        return (-2.0 * q.x.atan2(q.w), -std::f32::consts::FRAC_PI_2, 0.0);
    }

    let sqx = q.x * q.x;
    let sqy = q.y * q.y;
    let sqz = q.z * q.z;

    let heading = (2.0 * q.y * q.w - 2.0 * q.x * q.z).atan2(1.0 - 2.0 * sqy - 2.0 * sqz);
    let attitude = (2.0 * test).asin();
    let bank = (2.0 * q.x * q.w - 2.0 * q.y * q.z).atan2(1.0 - 2.0 * sqx - 2.0 * sqz);

    (heading, attitude, bank)
}

macro_rules! element_accessors {
    ($($name:ident => ($row:expr, $col:expr)),* $(,)?) => {
        $(
            #[inline]
            fn $name(&self) -> f32 {
                self.element($row, $col)
            }
        )*
    };
}

/// Element access and in-place construction for 4×4 transforms.
pub trait Mat4Ext {
    /// Reads the element at `row`, `col`.
    fn element(&self, row: usize, col: usize) -> f32;

    /// Writes the element at `row`, `col`.
    fn set_element(&mut self, row: usize, col: usize, value: f32);

    /// Replaces `self` with `other × self`.
    ///
    /// `self`'s accumulated transform is applied first, then `other`.
    fn compose(&mut self, other: &Mat4) -> &mut Self;

    /// Rebuilds `self` as `Translation × Rotation × Scale`: a point is scaled,
    /// then rotated, then translated.
    fn set_trs(&mut self, translation: Vec3, rotation: Quat, scale: Vec3) -> &mut Self;

    /// Rebuilds `self` as a perspective projection.
    ///
    /// `fov_degrees` is the vertical field of view. Depth is remapped into
    /// `[0, 1]` and `w` is taken from `-z`. Equal `near` and `far` produce
    /// non-finite elements; see [`checked_perspective`] for a guarded variant.
    fn set_perspective(&mut self, aspect: f32, fov_degrees: f32, near: f32, far: f32)
    -> &mut Self;

    element_accessors! {
        m00 => (0, 0), m01 => (0, 1), m02 => (0, 2), m03 => (0, 3),
        m10 => (1, 0), m11 => (1, 1), m12 => (1, 2), m13 => (1, 3),
        m20 => (2, 0), m21 => (2, 1), m22 => (2, 2), m23 => (2, 3),
        m30 => (3, 0), m31 => (3, 1), m32 => (3, 2), m33 => (3, 3),
    }
}

impl Mat4Ext for Mat4 {
    #[inline]
    fn element(&self, row: usize, col: usize) -> f32 {
        self.col(col)[row]
    }

    #[inline]
    fn set_element(&mut self, row: usize, col: usize, value: f32) {
        self.col_mut(col)[row] = value;
    }

    fn compose(&mut self, other: &Mat4) -> &mut Self {
        *self = *other * *self;
        self
    }

    fn set_trs(&mut self, translation: Vec3, rotation: Quat, scale: Vec3) -> &mut Self {
        *self = Mat4::from_scale(scale);
        self.compose(&Mat4::from_quat(rotation));
        self.compose(&Mat4::from_translation(translation));
        self
    }

    fn set_perspective(
        &mut self,
        aspect: f32,
        fov_degrees: f32,
        near: f32,
        far: f32,
    ) -> &mut Self {
        *self = Mat4::IDENTITY;
        let scale = 1.0 / (fov_degrees * 0.5).to_radians().tan();
        self.set_element(0, 0, scale);
        self.set_element(1, 1, scale * aspect);
        self.set_element(2, 2, -far / (far - near));
        self.set_element(2, 3, -far * near / (far - near));
        self.set_element(3, 2, -1.0);
        self.set_element(3, 3, 0.0);
        self
    }
}

/// Returns `Translation × Rotation × Scale`.
pub fn trs(translation: Vec3, rotation: Quat, scale: Vec3) -> Mat4 {
    let mut m = Mat4::IDENTITY;
    m.set_trs(translation, rotation, scale);
    m
}

/// Returns a perspective projection; see [`Mat4Ext::set_perspective`].
pub fn perspective(aspect: f32, fov_degrees: f32, near: f32, far: f32) -> Mat4 {
    let mut m = Mat4::IDENTITY;
    m.set_perspective(aspect, fov_degrees, near, far);
    m
}

/// Like [`perspective`] but rejects planes that would divide by zero.
pub fn checked_perspective(aspect: f32, fov_degrees: f32, near: f32, far: f32) -> Result<Mat4> {
    if far == near || !near.is_finite() || !far.is_finite() {
        return Err(Error::InvalidProjection { near, far });
    }
    Ok(perspective(aspect, fov_degrees, near, far))
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn normalize_produces_unit_length() {
        let mut v = Vec3::new(3.0, 4.0, 12.0);
        v.normalize_in_place();
        assert!((v.length() - 1.0).abs() < 1e-6);
        assert!(v.abs_diff_eq(Vec3::new(3.0, 4.0, 12.0) / 13.0, 1e-6));
    }

    #[test]
    fn normalize_leaves_zero_vector_alone() {
        let mut v = Vec3::ZERO;
        v.normalize_in_place();
        assert_eq!(v, Vec3::ZERO);
        assert!(!v.x.is_nan());
    }

    #[test]
    fn euler_zero_is_identity() {
        let q = quat_from_euler(0.0, 0.0, 0.0);
        assert!(q.abs_diff_eq(Quat::IDENTITY, 1e-6));
    }

    #[test]
    fn heading_rotates_about_y() {
        let q = quat_from_euler(0.0, FRAC_PI_2, 0.0);
        assert!(q.abs_diff_eq(Quat::from_rotation_y(FRAC_PI_2), 1e-6));
        assert!((q.length() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn euler_round_trip() {
        let q = quat_from_euler(0.3, 0.5, 0.2);
        let (heading, attitude, bank) = quat_to_euler(q);
        assert!((heading - 0.5).abs() < 1e-4);
        assert!((attitude - 0.2).abs() < 1e-4);
        assert!((bank - 0.3).abs() < 1e-4);
    }

    #[test]
    fn euler_pole_reports_zero_bank() {
        let q = quat_from_euler(0.0, 0.0, FRAC_PI_2);
        let (_, attitude, bank) = quat_to_euler(q);
        assert!((attitude - FRAC_PI_2).abs() < 1e-6);
        assert_eq!(bank, 0.0);
    }

    #[test]
    fn elements_are_row_then_column() {
        let m = Mat4::from_translation(Vec3::new(4.0, 5.0, 6.0));
        assert_eq!(m.m03(), 4.0);
        assert_eq!(m.m13(), 5.0);
        assert_eq!(m.m23(), 6.0);
        assert_eq!(m.m30(), 0.0);
        assert_eq!(m.to_cols_array()[12], 4.0);

        let mut m = Mat4::IDENTITY;
        m.set_element(2, 1, 7.0);
        assert_eq!(m.to_cols_array()[6], 7.0);
        assert_eq!(m.m21(), 7.0);
    }

    #[test]
    fn compose_applies_other_last() {
        let mut m = Mat4::from_translation(Vec3::X);
        m.compose(&Mat4::from_rotation_z(FRAC_PI_2));
        // translate to (1,0,0), then rotate to (0,1,0)
        let p = m.transform_point3(Vec3::ZERO);
        assert!(p.abs_diff_eq(Vec3::Y, 1e-6));
    }

    #[test]
    fn trs_of_origin_is_translation() {
        let t = Vec3::new(-2.5, 7.0, 0.25);
        let m = trs(t, Quat::IDENTITY, Vec3::ONE);
        assert_eq!(m.transform_point3(Vec3::ZERO), t);
    }

    #[test]
    fn trs_scales_then_rotates_then_translates() {
        let t = Vec3::new(1.0, 2.0, 3.0);
        let r = Quat::from_rotation_y(0.7);
        let s = Vec3::new(2.0, 0.5, 3.0);
        let m = trs(t, r, s);
        assert!(m.abs_diff_eq(Mat4::from_scale_rotation_translation(s, r, t), 1e-5));

        let p = m.transform_point3(Vec3::X);
        assert!(p.abs_diff_eq(r * (Vec3::X * s) + t, 1e-5));
    }

    #[test]
    fn perspective_layout() {
        let m = perspective(2.0, 90.0, 0.1, 1000.0);
        assert!((m.m00() - 1.0).abs() < 1e-6);
        assert!((m.m11() - 2.0).abs() < 1e-6);
        assert!((m.m22() - (-1000.0 / 999.9)).abs() < 1e-6);
        assert!((m.m23() - (-100.0 / 999.9)).abs() < 1e-5);
        assert_eq!(m.m32(), -1.0);
        assert_eq!(m.m33(), 0.0);

        // the near plane lands on depth 0 once divided by w
        let clip = m * Vec4::new(0.0, 0.0, -0.1, 1.0);
        assert!((clip.z / clip.w).abs() < 1e-4);
        // and the far plane on depth 1
        let clip = m * Vec4::new(0.0, 0.0, -1000.0, 1.0);
        assert!((clip.z / clip.w - 1.0).abs() < 1e-4);
    }

    #[test]
    fn equal_planes_are_unguarded_but_checked_variant_rejects() {
        let m = perspective(1.0, 90.0, 5.0, 5.0);
        assert!(!m.m22().is_finite());

        let err = checked_perspective(1.0, 90.0, 5.0, 5.0).unwrap_err();
        assert!(matches!(err, Error::InvalidProjection { .. }));
        assert!(checked_perspective(1.0, 90.0, 0.1, 10.0).is_ok());
    }
}
