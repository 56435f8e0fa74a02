//! Local position, rotation and scale.

use glam::{Mat4, Quat, Vec3};

use crate::math::{self, quat_from_euler};

/// A node's placement relative to its parent.
///
/// # Builder Pattern
///
/// ```
/// use tessera::{Transform, Vec3};
///
/// let transform = Transform::new()
///     .position(Vec3::new(0.0, 5.0, -10.0))
///     .euler(0.0, std::f32::consts::FRAC_PI_4, 0.0)
///     .uniform_scale(2.0);
/// assert_eq!(transform.scale, Vec3::splat(2.0));
/// ```
///
/// # Transformation Order
///
/// [`Transform::matrix()`] scales first, then rotates, then translates.
/// Swapping that order silently changes every downstream world matrix.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    /// Translation relative to the parent.
    pub position: Vec3,
    /// Rotation as a unit quaternion.
    pub rotation: Quat,
    /// Scale factors for each axis.
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    /// Creates an identity transform (origin, no rotation, unit scale).
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a transform positioned at the given location.
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    pub fn position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    pub fn rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    /// Sets the rotation from bank (X), heading (Y) and attitude (Z) radians.
    pub fn euler(mut self, bank: f32, heading: f32, attitude: f32) -> Self {
        self.rotation = quat_from_euler(bank, heading, attitude);
        self
    }

    pub fn scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    pub fn uniform_scale(mut self, scale: f32) -> Self {
        self.scale = Vec3::splat(scale);
        self
    }

    /// The local `Translation × Rotation × Scale` matrix.
    pub fn matrix(&self) -> Mat4 {
        math::trs(self.position, self.rotation, self.scale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_identity() {
        assert_eq!(Transform::new().matrix(), Mat4::IDENTITY);
    }

    #[test]
    fn builder_sets_components() {
        let t = Transform::new()
            .position(Vec3::new(1.0, 2.0, 3.0))
            .uniform_scale(0.5);
        assert_eq!(t.position, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(t.scale, Vec3::splat(0.5));
        assert_eq!(t.rotation, Quat::IDENTITY);
    }

    #[test]
    fn euler_builder_matches_glam_rotation() {
        let t = Transform::new().euler(0.0, 0.0, 0.4);
        assert!(t.rotation.abs_diff_eq(Quat::from_rotation_z(0.4), 1e-6));
    }
}
