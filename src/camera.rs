use glam::Mat4;

use crate::math::{self, Mat4Ext};

/// Perspective camera state carried by a camera node.
///
/// The camera polls the device viewport each update and regenerates its
/// projection only when the size changed. Its view matrix is derived from the
/// node's world matrix by negating the translation column, which matches a
/// true inverse only for an unscaled, unrotated camera.
#[derive(Clone, Copy, Debug)]
pub struct Camera {
    pub fov: f32, // degrees, vertical
    pub near: f32,
    pub far: f32,
    pub aspect: f32,
    viewport: (u32, u32),
    view: Mat4,
    projection: Mat4,
}

impl Default for Camera {
    fn default() -> Self {
        let mut camera = Self {
            fov: 90.0,
            near: 0.1,
            far: 1000.0,
            aspect: 1.0,
            viewport: (0, 0),
            view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
        };
        camera.update_projection();
        camera
    }
}

impl Camera {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fov(mut self, fov_degrees: f32) -> Self {
        self.fov = fov_degrees;
        self.update_projection();
        self
    }

    pub fn with_planes(mut self, near: f32, far: f32) -> Self {
        self.near = near;
        self.far = far;
        self.update_projection();
        self
    }

    pub fn with_aspect(mut self, aspect: f32) -> Self {
        self.aspect = aspect;
        self.update_projection();
        self
    }

    pub fn view(&self) -> &Mat4 {
        &self.view
    }

    pub fn projection(&self) -> &Mat4 {
        &self.projection
    }

    /// Viewport size the projection was last built for.
    pub fn viewport(&self) -> (u32, u32) {
        self.viewport
    }

    /// Rebuilds the projection from the current fov, aspect and planes.
    pub fn update_projection(&mut self) {
        self.projection = math::perspective(self.aspect, self.fov, self.near, self.far);
    }

    /// Adopts a new viewport size. Returns `true` if the size differed and
    /// the projection was regenerated.
    ///
    /// A zero height keeps the previous aspect ratio.
    pub fn sync_viewport(&mut self, size: (u32, u32)) -> bool {
        if size == self.viewport {
            return false;
        }
        self.viewport = size;
        let (width, height) = size;
        if height > 0 {
            self.aspect = width as f32 / height as f32;
        }
        self.update_projection();
        log::debug!("viewport {width}x{height}, aspect {:.3}", self.aspect);
        true
    }

    /// Derives the view matrix from the camera node's world matrix.
    pub fn update_view(&mut self, world: &Mat4) {
        self.view = view_from_world(world);
    }
}

/// `world` with its translation column negated.
pub fn view_from_world(world: &Mat4) -> Mat4 {
    let mut view = *world;
    for row in 0..3 {
        view.set_element(row, 3, -world.element(row, 3));
    }
    view
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Quat, Vec3};

    #[test]
    fn defaults() {
        let camera = Camera::new();
        assert_eq!(camera.fov, 90.0);
        assert_eq!(camera.near, 0.1);
        assert_eq!(camera.far, 1000.0);
        assert_eq!(camera.aspect, 1.0);
        assert_eq!(camera.viewport(), (0, 0));
        assert_eq!(*camera.projection(), math::perspective(1.0, 90.0, 0.1, 1000.0));
    }

    #[test]
    fn projection_changes_only_with_viewport() {
        let mut camera = Camera::new();
        let initial = *camera.projection();

        assert!(camera.sync_viewport((800, 400)));
        let resized = *camera.projection();
        assert_ne!(resized, initial);
        assert_eq!(camera.aspect, 2.0);

        assert!(!camera.sync_viewport((800, 400)));
        assert_eq!(*camera.projection(), resized);
    }

    #[test]
    fn zero_height_keeps_aspect() {
        let mut camera = Camera::new().with_aspect(1.5);
        assert!(camera.sync_viewport((640, 0)));
        assert_eq!(camera.aspect, 1.5);
        assert!(camera.projection().is_finite());
    }

    #[test]
    fn view_negates_translation() {
        let world = Mat4::from_translation(Vec3::new(1.0, -2.0, 3.0));
        let view = view_from_world(&world);
        assert_eq!(view, Mat4::from_translation(Vec3::new(-1.0, 2.0, -3.0)));
        assert!(view.abs_diff_eq(world.inverse(), 1e-6));
    }

    #[test]
    fn view_under_non_uniform_scale_is_not_an_inverse() {
        let world = math::trs(
            Vec3::new(0.0, 1.0, 5.0),
            Quat::from_rotation_y(0.3),
            Vec3::new(2.0, 1.0, 0.5),
        );
        let view = view_from_world(&world);

        // only the translation column changes
        for col in 0..3 {
            assert_eq!(view.col(col), world.col(col));
        }
        assert_eq!(view.m03(), -world.m03());
        assert_eq!(view.m13(), -world.m13());
        assert_eq!(view.m23(), -world.m23());
        assert_eq!(view.m33(), 1.0);

        assert!(!(view * world).abs_diff_eq(Mat4::IDENTITY, 1e-3));
    }
}
