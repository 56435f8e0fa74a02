//! Procedural plane and box generators.
//!
//! Both produce flat, unindexed triangle lists of `[x, y, z]` positions: every
//! grid cell is two triangles of three vertices each, and no vertex is shared
//! between cells or faces. Triangles wind counter-clockwise when viewed from
//! the side their normal points to.
//!
//! ```
//! use tessera::geometry::{self, PlaneDirection};
//!
//! let floor = geometry::plane(10.0, 10.0, 4, 4, 0.0, PlaneDirection::PosY);
//! assert_eq!(floor.len() / 3, 4 * 4 * 6);
//!
//! let crate_box = geometry::cuboid(1.0, 1.0, 1.0, 1, 1, 1);
//! assert_eq!(crate_box.len() / 3, 36);
//! ```

use glam::Vec3;

use crate::mesh::Mesh;

/// Axis a generated plane faces.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum PlaneDirection {
    PosX,
    NegX,
    PosY,
    NegY,
    #[default]
    PosZ,
    NegZ,
}

impl PlaneDirection {
    /// Face order used by [`cuboid`].
    pub const ALL: [PlaneDirection; 6] = [
        PlaneDirection::NegX,
        PlaneDirection::PosX,
        PlaneDirection::NegY,
        PlaneDirection::PosY,
        PlaneDirection::NegZ,
        PlaneDirection::PosZ,
    ];

    /// Unit normal of a plane facing this way.
    pub fn normal(self) -> Vec3 {
        match self {
            PlaneDirection::PosX => Vec3::X,
            PlaneDirection::NegX => Vec3::NEG_X,
            PlaneDirection::PosY => Vec3::Y,
            PlaneDirection::NegY => Vec3::NEG_Y,
            PlaneDirection::PosZ => Vec3::Z,
            PlaneDirection::NegZ => Vec3::NEG_Z,
        }
    }

    fn is_negative(self) -> bool {
        matches!(
            self,
            PlaneDirection::NegX | PlaneDirection::NegY | PlaneDirection::NegZ
        )
    }

    /// Places grid coordinates `(u, v)` on the plane `offset` units out.
    fn place(self, u: f32, v: f32, offset: f32) -> [f32; 3] {
        let d = if self.is_negative() { -offset } else { offset };
        match self {
            PlaneDirection::PosX | PlaneDirection::NegX => [d, v, u],
            PlaneDirection::PosY | PlaneDirection::NegY => [u, d, v],
            PlaneDirection::PosZ | PlaneDirection::NegZ => [u, v, d],
        }
    }

    /// The X and Y mappings are mirror images of Z's, so their positive faces
    /// need the opposite winding.
    fn flips_winding(self) -> bool {
        let mirrored = !matches!(self, PlaneDirection::PosZ | PlaneDirection::NegZ);
        self.is_negative() != mirrored
    }
}

/// Generates a `width` × `height` grid of `res_width` × `res_height` quads,
/// centred on the axis and pushed `offset` units along `direction`.
///
/// Zero resolution in either dimension yields no vertices.
pub fn plane(
    width: f32,
    height: f32,
    res_width: u32,
    res_height: u32,
    offset: f32,
    direction: PlaneDirection,
) -> Vec<f32> {
    if res_width == 0 || res_height == 0 {
        return Vec::new();
    }

    let sx = width / res_width as f32;
    let sy = height / res_height as f32;
    let flip = direction.flips_winding();
    let mut vertices = Vec::new();
    // Oversized grids grow as they go instead of failing up front.
    let _ = vertices.try_reserve(vertex_capacity(res_width, res_height));

    for i in 0..res_width {
        let x = i as f32 - res_width as f32 / 2.0;
        for j in 0..res_height {
            let y = j as f32 - res_height as f32 / 2.0;

            let v00 = direction.place(x * sx, y * sy, offset);
            let v01 = direction.place(x * sx, y * sy + sy, offset);
            let v10 = direction.place(x * sx + sx, y * sy, offset);
            let v11 = direction.place(x * sx + sx, y * sy + sy, offset);

            let quad = if flip {
                [v11, v00, v01, v10, v00, v11]
            } else {
                [v00, v11, v01, v00, v10, v11]
            };
            for vertex in quad {
                vertices.extend_from_slice(&vertex);
            }
        }
    }

    vertices
}

/// Floats emitted for a `res_width` × `res_height` grid: two triangles of
/// three-component vertices per cell.
fn vertex_capacity(res_width: u32, res_height: u32) -> usize {
    (res_width as usize)
        .saturating_mul(res_height as usize)
        .saturating_mul(18)
}

/// Generates a box centred on the origin out of six [`plane`]s, concatenated
/// in the order −X, +X, −Y, +Y, −Z, +Z.
///
/// The X faces are `depth` × `height`, the Y faces `width` × `depth`, and the
/// Z faces `width` × `height`.
pub fn cuboid(
    width: f32,
    height: f32,
    depth: f32,
    res_width: u32,
    res_height: u32,
    res_depth: u32,
) -> Vec<f32> {
    let mut vertices = Vec::new();
    for direction in PlaneDirection::ALL {
        let face = match direction {
            PlaneDirection::NegX | PlaneDirection::PosX => {
                plane(depth, height, res_depth, res_height, width / 2.0, direction)
            }
            PlaneDirection::NegY | PlaneDirection::PosY => {
                plane(width, depth, res_width, res_depth, height / 2.0, direction)
            }
            PlaneDirection::NegZ | PlaneDirection::PosZ => {
                plane(width, height, res_width, res_height, depth / 2.0, direction)
            }
        };
        vertices.extend(face);
    }
    vertices
}

impl Mesh {
    /// A mesh holding a single [`plane`].
    pub fn plane(
        width: f32,
        height: f32,
        res_width: u32,
        res_height: u32,
        offset: f32,
        direction: PlaneDirection,
    ) -> Self {
        Self::from_positions(plane(width, height, res_width, res_height, offset, direction))
    }

    /// A mesh holding a [`cuboid`].
    pub fn cuboid(
        width: f32,
        height: f32,
        depth: f32,
        res_width: u32,
        res_height: u32,
        res_depth: u32,
    ) -> Self {
        Self::from_positions(cuboid(width, height, depth, res_width, res_height, res_depth))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangles(positions: &[f32]) -> impl Iterator<Item = [Vec3; 3]> + '_ {
        positions.chunks_exact(9).map(|t| {
            [
                Vec3::from_slice(&t[0..3]),
                Vec3::from_slice(&t[3..6]),
                Vec3::from_slice(&t[6..9]),
            ]
        })
    }

    fn face_normal([a, b, c]: [Vec3; 3]) -> Vec3 {
        (b - a).cross(c - a).normalize()
    }

    #[test]
    fn single_cell_plane_is_two_triangles() {
        let vertices = plane(2.0, 2.0, 1, 1, 0.0, PlaneDirection::PosZ);
        assert_eq!(vertices.len(), 6 * 3);
    }

    #[test]
    fn single_cell_box_is_thirty_six_vertices() {
        assert_eq!(cuboid(1.0, 2.0, 3.0, 1, 1, 1).len(), 36 * 3);
    }

    #[test]
    fn vertex_count_scales_with_resolution() {
        assert_eq!(plane(1.0, 1.0, 3, 2, 0.0, PlaneDirection::NegY).len(), 3 * 2 * 18);
        // X faces 3x2, Y faces 4x3, Z faces 4x2
        let expected = 2 * (3 * 2 + 4 * 3 + 4 * 2) * 18;
        assert_eq!(cuboid(1.0, 1.0, 1.0, 4, 2, 3).len(), expected as usize);
    }

    #[test]
    fn zero_resolution_is_empty() {
        assert!(plane(1.0, 1.0, 0, 4, 0.0, PlaneDirection::PosX).is_empty());
    }

    #[test]
    fn huge_resolutions_do_not_overflow_the_size_estimate() {
        assert_eq!(vertex_capacity(2, 3), 2 * 3 * 18);
        assert_eq!(vertex_capacity(u32::MAX, u32::MAX), usize::MAX);
        assert_eq!(plane(1.0, 1.0, 3, 5, 0.0, PlaneDirection::NegY).len(), vertex_capacity(3, 5));
    }

    #[test]
    fn every_direction_faces_outward() {
        for direction in PlaneDirection::ALL {
            let vertices = plane(2.0, 3.0, 2, 2, 0.5, direction);
            for triangle in triangles(&vertices) {
                let n = face_normal(triangle);
                assert!(
                    n.abs_diff_eq(direction.normal(), 1e-5),
                    "{direction:?} produced normal {n}"
                );
            }
        }
    }

    #[test]
    fn plane_sits_at_offset_and_is_centred() {
        let vertices = plane(4.0, 2.0, 2, 2, 1.5, PlaneDirection::NegX);
        let points: Vec<Vec3> = vertices.chunks_exact(3).map(Vec3::from_slice).collect();
        assert!(points.iter().all(|p| p.x == -1.5));

        let min = points.iter().fold(Vec3::splat(f32::MAX), |a, p| a.min(*p));
        let max = points.iter().fold(Vec3::splat(f32::MIN), |a, p| a.max(*p));
        // width runs along z, height along y
        assert_eq!((min.z, max.z), (-2.0, 2.0));
        assert_eq!((min.y, max.y), (-1.0, 1.0));
    }

    #[test]
    fn box_faces_follow_fixed_order() {
        let (w, h, d) = (2.0, 4.0, 6.0);
        let vertices = cuboid(w, h, d, 1, 1, 1);
        let faces: Vec<&[f32]> = vertices.chunks_exact(18).collect();
        assert_eq!(faces.len(), 6);

        for (face, direction) in faces.iter().zip(PlaneDirection::ALL) {
            let normal = direction.normal();
            let half = Vec3::new(w, h, d) / 2.0;
            for p in face.chunks_exact(3).map(Vec3::from_slice) {
                assert_eq!(p.dot(normal), half.dot(normal.abs()));
                assert!(p.abs().cmple(half).all());
            }
            for triangle in triangles(face) {
                assert!(face_normal(triangle).abs_diff_eq(normal, 1e-5));
            }
        }
    }

    #[test]
    fn mesh_constructors_fill_position() {
        let mesh = Mesh::cuboid(1.0, 1.0, 1.0, 1, 1, 1);
        assert_eq!(mesh.vertex_count(), 36);
        let mesh = Mesh::plane(1.0, 1.0, 2, 2, 0.0, PlaneDirection::default());
        assert_eq!(mesh.vertex_count(), 24);
    }
}
