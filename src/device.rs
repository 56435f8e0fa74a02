//! The graphics device boundary.
//!
//! The scene graph never talks to a GPU API directly. Shader compilation,
//! buffer uploads, draws and viewport queries all go through
//! [`GraphicsDevice`].
//!
//! Two implementations ship with the crate:
//!
//! - [`WgpuDevice`](crate::WgpuDevice) renders to a window through wgpu
//! - [`HeadlessDevice`](crate::HeadlessDevice) records every call in memory,
//!   which is what the tests draw against
//!
//! The trait follows the classic immediate-mode model: a program is made
//! current, uniforms are written to locations of the current program,
//! attributes are bound to locations, and `draw_arrays` consumes whatever is
//! bound at that moment.

use std::fmt;

use glam::Mat4;

use crate::error::Result;

macro_rules! device_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        pub struct $name(u32);

        impl $name {
            /// Wraps a device-specific index.
            pub fn new(raw: u32) -> Self {
                Self(raw)
            }

            /// The device-specific index.
            pub fn raw(self) -> u32 {
                self.0
            }

            pub(crate) fn index(self) -> usize {
                self.0 as usize
            }
        }
    };
}

device_handle!(
    /// A compiled shader object owned by a device.
    ShaderHandle
);
device_handle!(
    /// A linked program owned by a device.
    ProgramHandle
);
device_handle!(
    /// A vertex buffer owned by a device.
    BufferHandle
);

/// Which half of a program a shader belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => write!(f, "vertex"),
            ShaderStage::Fragment => write!(f, "fragment"),
        }
    }
}

/// How consecutive vertices are assembled into primitives.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Topology {
    /// Every three vertices form a triangle.
    #[default]
    Triangles,
    /// Every two vertices form a line segment.
    Lines,
}

/// Update-frequency hint for an uploaded buffer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BufferUsage {
    /// Written once, drawn many times.
    #[default]
    Static,
    /// Rewritten occasionally.
    Dynamic,
    /// Rewritten every frame.
    Stream,
}

/// Scalar type the shader should read an attribute as.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ScalarType {
    #[default]
    Float,
    Byte,
    UnsignedByte,
    Short,
    UnsignedShort,
}

/// Depth comparison applied while a program is active.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum DepthFunc {
    Never,
    Less,
    Equal,
    #[default]
    LessEqual,
    Greater,
    NotEqual,
    GreaterEqual,
    Always,
}

/// Which targets a [`GraphicsDevice::clear`] resets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ClearFlags {
    pub color: bool,
    pub depth: bool,
}

impl ClearFlags {
    pub const COLOR: Self = Self {
        color: true,
        depth: false,
    };
    pub const DEPTH: Self = Self {
        color: false,
        depth: true,
    };
    pub const ALL: Self = Self {
        color: true,
        depth: true,
    };
}

/// How a bound buffer is read per vertex.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct VertexLayout {
    /// Components per vertex (1 to 4).
    pub components: u32,
    pub scalar: ScalarType,
    pub normalized: bool,
}

/// The operations the scene graph needs from a GPU.
///
/// Compile and link failures are the only fallible calls; everything else is
/// fire-and-forget in the manner of an immediate-mode API. Implementations
/// decide when recorded work actually reaches the screen, which at the latest
/// is [`present`](GraphicsDevice::present).
pub trait GraphicsDevice {
    /// Compiles one shader stage, returning the compiler log on failure.
    fn compile_shader(&mut self, stage: ShaderStage, source: &str) -> Result<ShaderHandle>;

    /// Links a vertex and a fragment shader, returning the linker log on failure.
    fn link_program(
        &mut self,
        vertex: ShaderHandle,
        fragment: ShaderHandle,
    ) -> Result<ProgramHandle>;

    /// Location of a named vertex attribute, or `None` if the program lacks it.
    fn attribute_location(&self, program: ProgramHandle, name: &str) -> Option<u32>;

    /// Location of a named uniform, or `None` if the program lacks it.
    fn uniform_location(&self, program: ProgramHandle, name: &str) -> Option<u32>;

    /// Makes `program` current for subsequent uniform writes and draws.
    fn use_program(&mut self, program: ProgramHandle);

    /// Enables depth testing with `func`, or disables it with `None`.
    fn set_depth_test(&mut self, func: Option<DepthFunc>);

    /// Writes a 4×4 matrix to a uniform of the current program.
    fn set_uniform_mat4(&mut self, location: u32, value: &Mat4);

    /// Uploads a flat scalar array into a new vertex buffer.
    fn create_buffer(&mut self, data: &[f32], usage: BufferUsage) -> BufferHandle;

    /// Feeds attribute `location` from `buffer`.
    fn bind_attribute(&mut self, location: u32, buffer: BufferHandle, layout: VertexLayout);

    /// Draws `count` vertices starting at `first` from the bound attributes.
    fn draw_arrays(&mut self, topology: Topology, first: u32, count: u32);

    fn set_viewport(&mut self, x: u32, y: u32, width: u32, height: u32);

    fn set_clear_color(&mut self, color: [f32; 4]);

    fn clear(&mut self, flags: ClearFlags);

    /// Current drawable size in pixels.
    fn viewport_size(&self) -> (u32, u32);

    /// Finishes the frame. Devices that draw immediately have nothing to do.
    fn present(&mut self) -> Result<()> {
        Ok(())
    }
}
