//! Vertex attributes and the meshes built from them.
//!
//! A [`Mesh`] is a set of named [`Attribute`]s, each a flat `f32` array read
//! `size` components per vertex. The `"position"` attribute is mandatory for
//! drawing and decides the vertex count:
//!
//! ```
//! use tessera::{Attribute, Mesh};
//!
//! let mut mesh = Mesh::new();
//! mesh.set_attribute("position", Attribute::new(vec![0.0; 18]));
//! assert_eq!(mesh.vertex_count(), 6);
//! ```
//!
//! Meshes are uploaded once with [`Mesh::upload`]; the scene then draws them
//! with whatever program the owning node references.

use std::collections::BTreeMap;

use crate::device::{BufferHandle, BufferUsage, GraphicsDevice, ScalarType, Topology, VertexLayout};
use crate::shader::{Program, POSITION};

/// One named per-vertex data stream.
#[derive(Clone, Debug)]
pub struct Attribute {
    /// Flat component data, `size` values per vertex.
    pub data: Vec<f32>,
    /// Components per vertex.
    pub size: u32,
    pub scalar: ScalarType,
    pub normalized: bool,
    pub usage: BufferUsage,
    buffer: Option<BufferHandle>,
}

impl Attribute {
    /// Three float components per vertex, not normalized, static.
    pub fn new(data: Vec<f32>) -> Self {
        Self {
            data,
            size: 3,
            scalar: ScalarType::Float,
            normalized: false,
            usage: BufferUsage::Static,
            buffer: None,
        }
    }

    pub fn size(mut self, size: u32) -> Self {
        self.size = size;
        self
    }

    pub fn scalar(mut self, scalar: ScalarType) -> Self {
        self.scalar = scalar;
        self
    }

    pub fn normalized(mut self, normalized: bool) -> Self {
        self.normalized = normalized;
        self
    }

    pub fn usage(mut self, usage: BufferUsage) -> Self {
        self.usage = usage;
        self
    }

    /// Device buffer holding this attribute, once uploaded.
    pub fn buffer(&self) -> Option<BufferHandle> {
        self.buffer
    }

    pub fn layout(&self) -> VertexLayout {
        VertexLayout {
            components: self.size,
            scalar: self.scalar,
            normalized: self.normalized,
        }
    }

    fn vertex_count(&self) -> u32 {
        if self.size == 0 {
            return 0;
        }
        (self.data.len() / self.size as usize) as u32
    }
}

/// Geometry ready to be drawn by a scene node.
#[derive(Debug, Default)]
pub struct Mesh {
    attributes: BTreeMap<String, Attribute>,
    /// Primitive topology used by [`Mesh::draw`].
    pub draw_mode: Topology,
    /// Draws the triangle edges a second time as lines.
    pub draw_wireframe: bool,
    wireframe: Option<(BufferHandle, u32)>,
    /// Vertex count captured by the last upload.
    uploaded: Option<u32>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shorthand for a mesh with only a three-component position attribute.
    pub fn from_positions(positions: Vec<f32>) -> Self {
        let mut mesh = Self::new();
        mesh.set_attribute(POSITION, Attribute::new(positions));
        mesh
    }

    /// Adds or replaces an attribute. Takes effect at the next upload; until
    /// then a replaced attribute is unbound, and a replaced position stops
    /// the mesh from drawing.
    pub fn set_attribute(&mut self, name: impl Into<String>, attribute: Attribute) {
        self.attributes.insert(name.into(), attribute);
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }

    pub fn with_wireframe(mut self, draw_wireframe: bool) -> Self {
        self.draw_wireframe = draw_wireframe;
        self
    }

    pub fn with_draw_mode(mut self, draw_mode: Topology) -> Self {
        self.draw_mode = draw_mode;
        self
    }

    /// Vertices in the position attribute, or zero without one.
    pub fn vertex_count(&self) -> u32 {
        self.attributes
            .get(POSITION)
            .map_or(0, Attribute::vertex_count)
    }

    pub fn is_uploaded(&self) -> bool {
        self.uploaded.is_some()
    }

    fn position_buffer(&self) -> Option<BufferHandle> {
        self.attributes.get(POSITION)?.buffer
    }

    /// Whether [`draw_wireframe_overlay`](Self::draw_wireframe_overlay) has
    /// anything to add.
    pub fn wants_wireframe(&self) -> bool {
        self.draw_wireframe && self.draw_mode != Topology::Lines
    }

    /// Uploads every attribute into its own device buffer.
    ///
    /// Calling this again uploads everything again and drops the cached
    /// wireframe buffer.
    pub fn upload(&mut self, device: &mut dyn GraphicsDevice) {
        if self.uploaded.is_some() {
            log::warn!("mesh uploaded again; previous buffers are abandoned");
        }
        for attribute in self.attributes.values_mut() {
            attribute.buffer = Some(device.create_buffer(&attribute.data, attribute.usage));
        }
        self.wireframe = None;
        let count = self.vertex_count();
        self.uploaded = Some(count);
        log::debug!(
            "uploaded mesh: {} attributes, {count} vertices",
            self.attributes.len()
        );
    }

    /// Binds every attribute `program` consumes and issues one draw.
    ///
    /// The vertex count is the one captured at upload. Returns `false`
    /// without drawing when there is nothing to draw: no vertices, no upload
    /// yet, a position replaced since the upload, or a program without a
    /// position input. Attributes other than position that the program lacks
    /// are skipped.
    pub fn draw(&self, device: &mut dyn GraphicsDevice, program: &Program) -> bool {
        let Some(count) = self.uploaded else {
            if self.vertex_count() > 0 {
                log::warn!("mesh drawn before upload; skipping");
            }
            return false;
        };
        if count == 0 || self.position_buffer().is_none() {
            return false;
        }
        if program.attribute_location(device, POSITION).is_none() {
            return false;
        }

        for (name, attribute) in &self.attributes {
            let (Some(location), Some(buffer)) =
                (program.attribute_location(device, name), attribute.buffer)
            else {
                continue;
            };
            device.bind_attribute(location, buffer, attribute.layout());
        }
        device.draw_arrays(self.draw_mode, 0, count);
        true
    }

    /// Draws the triangle edges with `program`, which must already be active
    /// and fed the node's matrices.
    ///
    /// Does nothing unless [`draw_wireframe`](Self::draw_wireframe) is set and
    /// the mesh is drawn as triangles. The line buffer is built on first use.
    pub fn draw_wireframe_overlay(&mut self, device: &mut dyn GraphicsDevice, program: &Program) -> bool {
        if !self.wants_wireframe() || self.uploaded.unwrap_or(0) == 0 {
            return false;
        }
        let Some(position) = self.attributes.get(POSITION).filter(|p| p.buffer.is_some()) else {
            return false;
        };
        let Some(location) = program.attribute_location(device, POSITION) else {
            return false;
        };

        let (buffer, count) = match self.wireframe {
            Some(lines) => lines,
            None => {
                let data = wireframe_lines(&position.data, position.size as usize);
                let lines = (
                    device.create_buffer(&data, BufferUsage::Static),
                    data.len() as u32 / position.size,
                );
                self.wireframe = Some(lines);
                lines
            }
        };

        device.bind_attribute(location, buffer, position.layout());
        device.draw_arrays(Topology::Lines, 0, count);
        true
    }
}

/// Expands a triangle list into its edges: each triangle `(v0, v1, v2)`
/// becomes the segments `v0-v1`, `v1-v2`, `v2-v0`.
///
/// `size` is the component count per vertex. A trailing partial triangle is
/// ignored.
pub fn wireframe_lines(positions: &[f32], size: usize) -> Vec<f32> {
    if size == 0 {
        return Vec::new();
    }
    let mut lines = Vec::with_capacity(positions.len() * 2);
    for triangle in positions.chunks_exact(size * 3) {
        let (v0, rest) = triangle.split_at(size);
        let (v1, v2) = rest.split_at(size);
        for vertex in [v0, v1, v1, v2, v2, v0] {
            lines.extend_from_slice(vertex);
        }
    }
    lines
}
