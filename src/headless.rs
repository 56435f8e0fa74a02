//! An in-memory [`GraphicsDevice`] that records what it is asked to do.
//!
//! `HeadlessDevice` runs scenes without a window or GPU: it keeps uploaded
//! buffers, resolves attribute and uniform names from the shader source, and
//! appends every state change and draw to a call log that can be inspected
//! afterwards.
//!
//! Names are discovered from GLSL-style declarations, one per line:
//!
//! ```text
//! attribute vec3 position;
//! uniform mat4 model_matrix;
//! ```
//!
//! Locations are assigned in declaration order, attributes and uniforms
//! counted separately. An empty source fails to compile, and linking two
//! shaders of the same stage fails to link.
//!
//! ```
//! use tessera::{GraphicsDevice, HeadlessDevice, ShaderStage};
//!
//! let mut device = HeadlessDevice::new(640, 480);
//! let vs = device
//!     .compile_shader(ShaderStage::Vertex, "attribute vec3 position;")
//!     .unwrap();
//! let fs = device.compile_shader(ShaderStage::Fragment, "void main() {}").unwrap();
//! let program = device.link_program(vs, fs).unwrap();
//! assert_eq!(device.attribute_location(program, "position"), Some(0));
//! ```

use glam::Mat4;

use crate::device::{
    BufferHandle, BufferUsage, ClearFlags, DepthFunc, GraphicsDevice, ProgramHandle,
    ShaderHandle, ShaderStage, Topology, VertexLayout,
};
use crate::error::{Error, Result};

/// One recorded device call.
#[derive(Clone, Debug, PartialEq)]
pub enum DeviceCall {
    UseProgram(ProgramHandle),
    DepthTest(Option<DepthFunc>),
    UniformMat4 { location: u32, value: Mat4 },
    CreateBuffer { buffer: BufferHandle, len: usize },
    BindAttribute {
        location: u32,
        buffer: BufferHandle,
        layout: VertexLayout,
    },
    Draw {
        topology: Topology,
        first: u32,
        count: u32,
    },
    Viewport {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    },
    ClearColor([f32; 4]),
    Clear(ClearFlags),
    Present,
}

struct RecordedShader {
    stage: ShaderStage,
    source: String,
}

struct RecordedProgram {
    attributes: Vec<String>,
    uniforms: Vec<String>,
}

/// A recording device with a fixed, adjustable viewport.
pub struct HeadlessDevice {
    viewport: (u32, u32),
    shaders: Vec<RecordedShader>,
    programs: Vec<RecordedProgram>,
    buffers: Vec<Vec<f32>>,
    calls: Vec<DeviceCall>,
}

impl HeadlessDevice {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            viewport: (width, height),
            shaders: Vec::new(),
            programs: Vec::new(),
            buffers: Vec::new(),
            calls: Vec::new(),
        }
    }

    /// Simulates the drawable being resized.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.viewport = (width, height);
    }

    /// Every call recorded since creation or the last [`take_calls`](Self::take_calls).
    pub fn calls(&self) -> &[DeviceCall] {
        &self.calls
    }

    /// Drains the call log.
    pub fn take_calls(&mut self) -> Vec<DeviceCall> {
        std::mem::take(&mut self.calls)
    }

    /// `(topology, count)` of every recorded draw, in order.
    pub fn draws(&self) -> Vec<(Topology, u32)> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                DeviceCall::Draw {
                    topology, count, ..
                } => Some((*topology, *count)),
                _ => None,
            })
            .collect()
    }

    /// Contents of an uploaded buffer.
    pub fn buffer_data(&self, buffer: BufferHandle) -> Option<&[f32]> {
        self.buffers.get(buffer.index()).map(Vec::as_slice)
    }

    pub fn buffer_count(&self) -> usize {
        self.buffers.len()
    }

    fn declarations<'a>(source: &'a str, keywords: &[&str]) -> impl Iterator<Item = &'a str> {
        let keywords: Vec<String> = keywords.iter().map(|k| k.to_string()).collect();
        source.lines().filter_map(move |line| {
            let mut tokens = line
                .split(|c: char| c.is_whitespace() || c == ';')
                .filter(|t| !t.is_empty());
            let first = tokens.next()?;
            if !keywords.iter().any(|k| k == first) {
                return None;
            }
            tokens.last()
        })
    }
}

impl GraphicsDevice for HeadlessDevice {
    fn compile_shader(&mut self, stage: ShaderStage, source: &str) -> Result<ShaderHandle> {
        if source.trim().is_empty() {
            return Err(Error::ShaderCompile {
                stage,
                log: "ERROR: 0:1: empty shader source".to_string(),
            });
        }
        self.shaders.push(RecordedShader {
            stage,
            source: source.to_string(),
        });
        Ok(ShaderHandle::new((self.shaders.len() - 1) as u32))
    }

    fn link_program(
        &mut self,
        vertex: ShaderHandle,
        fragment: ShaderHandle,
    ) -> Result<ProgramHandle> {
        let (Some(vs), Some(fs)) = (
            self.shaders.get(vertex.index()),
            self.shaders.get(fragment.index()),
        ) else {
            return Err(Error::ProgramLink {
                log: "unknown shader handle".to_string(),
            });
        };
        if vs.stage != ShaderStage::Vertex || fs.stage != ShaderStage::Fragment {
            return Err(Error::ProgramLink {
                log: format!(
                    "expected a vertex and a fragment shader, got {} and {}",
                    vs.stage, fs.stage
                ),
            });
        }

        let attributes = Self::declarations(&vs.source, &["attribute", "in"])
            .map(str::to_string)
            .collect();
        let mut uniforms: Vec<String> = Vec::new();
        for source in [&vs.source, &fs.source] {
            for name in Self::declarations(source, &["uniform"]) {
                if !uniforms.iter().any(|u| u == name) {
                    uniforms.push(name.to_string());
                }
            }
        }

        self.programs.push(RecordedProgram {
            attributes,
            uniforms,
        });
        Ok(ProgramHandle::new((self.programs.len() - 1) as u32))
    }

    fn attribute_location(&self, program: ProgramHandle, name: &str) -> Option<u32> {
        let program = self.programs.get(program.index())?;
        program
            .attributes
            .iter()
            .position(|a| a == name)
            .map(|i| i as u32)
    }

    fn uniform_location(&self, program: ProgramHandle, name: &str) -> Option<u32> {
        let program = self.programs.get(program.index())?;
        program
            .uniforms
            .iter()
            .position(|u| u == name)
            .map(|i| i as u32)
    }

    fn use_program(&mut self, program: ProgramHandle) {
        self.calls.push(DeviceCall::UseProgram(program));
    }

    fn set_depth_test(&mut self, func: Option<DepthFunc>) {
        self.calls.push(DeviceCall::DepthTest(func));
    }

    fn set_uniform_mat4(&mut self, location: u32, value: &Mat4) {
        self.calls.push(DeviceCall::UniformMat4 {
            location,
            value: *value,
        });
    }

    fn create_buffer(&mut self, data: &[f32], _usage: BufferUsage) -> BufferHandle {
        self.buffers.push(data.to_vec());
        let buffer = BufferHandle::new((self.buffers.len() - 1) as u32);
        self.calls.push(DeviceCall::CreateBuffer {
            buffer,
            len: data.len(),
        });
        buffer
    }

    fn bind_attribute(&mut self, location: u32, buffer: BufferHandle, layout: VertexLayout) {
        self.calls.push(DeviceCall::BindAttribute {
            location,
            buffer,
            layout,
        });
    }

    fn draw_arrays(&mut self, topology: Topology, first: u32, count: u32) {
        self.calls.push(DeviceCall::Draw {
            topology,
            first,
            count,
        });
    }

    fn set_viewport(&mut self, x: u32, y: u32, width: u32, height: u32) {
        self.calls.push(DeviceCall::Viewport {
            x,
            y,
            width,
            height,
        });
    }

    fn set_clear_color(&mut self, color: [f32; 4]) {
        self.calls.push(DeviceCall::ClearColor(color));
    }

    fn clear(&mut self, flags: ClearFlags) {
        self.calls.push(DeviceCall::Clear(flags));
    }

    fn viewport_size(&self) -> (u32, u32) {
        self.viewport
    }

    fn present(&mut self) -> Result<()> {
        self.calls.push(DeviceCall::Present);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VS: &str = "attribute vec3 position;\nattribute vec2 uv;\nuniform mat4 model_matrix;\nuniform mat4 view_matrix;\n";
    const FS: &str = "uniform mat4 view_matrix;\nuniform vec4 tint;\n";

    #[test]
    fn locations_follow_declaration_order() {
        let mut device = HeadlessDevice::new(1, 1);
        let vs = device.compile_shader(ShaderStage::Vertex, VS).unwrap();
        let fs = device.compile_shader(ShaderStage::Fragment, FS).unwrap();
        let program = device.link_program(vs, fs).unwrap();

        assert_eq!(device.attribute_location(program, "position"), Some(0));
        assert_eq!(device.attribute_location(program, "uv"), Some(1));
        assert_eq!(device.attribute_location(program, "normal"), None);
        assert_eq!(device.uniform_location(program, "model_matrix"), Some(0));
        assert_eq!(device.uniform_location(program, "view_matrix"), Some(1));
        assert_eq!(device.uniform_location(program, "tint"), Some(2));
    }

    #[test]
    fn empty_source_fails_to_compile() {
        let mut device = HeadlessDevice::new(1, 1);
        let err = device.compile_shader(ShaderStage::Fragment, "  \n").unwrap_err();
        match err {
            Error::ShaderCompile { stage, log } => {
                assert_eq!(stage, ShaderStage::Fragment);
                assert!(log.contains("empty"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn mismatched_stages_fail_to_link() {
        let mut device = HeadlessDevice::new(1, 1);
        let a = device.compile_shader(ShaderStage::Vertex, VS).unwrap();
        let b = device.compile_shader(ShaderStage::Vertex, VS).unwrap();
        assert!(matches!(
            device.link_program(a, b),
            Err(Error::ProgramLink { .. })
        ));
    }

    #[test]
    fn buffers_keep_their_data() {
        let mut device = HeadlessDevice::new(1, 1);
        let buffer = device.create_buffer(&[1.0, 2.0, 3.0], BufferUsage::Static);
        assert_eq!(device.buffer_data(buffer), Some(&[1.0, 2.0, 3.0][..]));
        assert_eq!(
            device.calls(),
            &[DeviceCall::CreateBuffer { buffer, len: 3 }]
        );
    }
}
