//! Shader objects and linked programs.
//!
//! A [`Program`] wraps a device program handle together with the render state
//! that goes with it (depth testing) and caches every attribute and uniform
//! location it has been asked for. Programs are activated explicitly before a
//! draw; nothing tracks a globally current program.

use std::cell::RefCell;
use std::collections::HashMap;

use glam::Mat4;

use crate::device::{DepthFunc, GraphicsDevice, ProgramHandle, ShaderHandle, ShaderStage};
use crate::error::Result;

/// Attribute name meshes store their vertex positions under.
pub const POSITION: &str = "position";
/// Uniform receiving the node's world matrix.
pub const MODEL_MATRIX: &str = "model_matrix";
/// Uniform receiving the camera's view matrix.
pub const VIEW_MATRIX: &str = "view_matrix";
/// Uniform receiving the camera's projection matrix.
pub const PROJ_MATRIX: &str = "proj_matrix";

/// One compiled shader stage.
#[derive(Debug)]
pub struct Shader {
    stage: ShaderStage,
    handle: ShaderHandle,
}

impl Shader {
    /// Compiles `source` for `stage`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ShaderCompile`](crate::Error::ShaderCompile) with the
    /// compiler log.
    pub fn compile(device: &mut dyn GraphicsDevice, stage: ShaderStage, source: &str) -> Result<Self> {
        let handle = device.compile_shader(stage, source)?;
        log::debug!("compiled {stage} shader ({} bytes)", source.len());
        Ok(Self { stage, handle })
    }

    pub fn stage(&self) -> ShaderStage {
        self.stage
    }

    pub fn handle(&self) -> ShaderHandle {
        self.handle
    }
}

type LocationCache = RefCell<HashMap<String, Option<u32>>>;

/// A linked vertex + fragment program.
#[derive(Debug)]
pub struct Program {
    handle: ProgramHandle,
    attributes: LocationCache,
    uniforms: LocationCache,
    /// Whether depth testing is enabled while this program draws.
    pub use_depth: bool,
    /// Comparison used when `use_depth` is set.
    pub depth_func: DepthFunc,
}

impl Program {
    /// Links two compiled shaders.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ProgramLink`](crate::Error::ProgramLink) with the
    /// linker log.
    pub fn link(device: &mut dyn GraphicsDevice, vertex: &Shader, fragment: &Shader) -> Result<Self> {
        let handle = device.link_program(vertex.handle, fragment.handle)?;
        log::debug!("linked program {}", handle.raw());
        Ok(Self {
            handle,
            attributes: RefCell::default(),
            uniforms: RefCell::default(),
            use_depth: true,
            depth_func: DepthFunc::default(),
        })
    }

    /// Compiles both stages and links them.
    pub fn from_sources(
        device: &mut dyn GraphicsDevice,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Result<Self> {
        let vertex = Shader::compile(device, ShaderStage::Vertex, vertex_source)?;
        let fragment = Shader::compile(device, ShaderStage::Fragment, fragment_source)?;
        Self::link(device, &vertex, &fragment)
    }

    pub fn handle(&self) -> ProgramHandle {
        self.handle
    }

    /// Location of a vertex attribute. Only the first lookup of a name
    /// reaches the device.
    pub fn attribute_location(&self, device: &dyn GraphicsDevice, name: &str) -> Option<u32> {
        Self::cached(&self.attributes, name, || {
            device.attribute_location(self.handle, name)
        })
    }

    /// Location of a uniform, cached like [`attribute_location`](Self::attribute_location).
    pub fn uniform_location(&self, device: &dyn GraphicsDevice, name: &str) -> Option<u32> {
        Self::cached(&self.uniforms, name, || device.uniform_location(self.handle, name))
    }

    /// Writes a matrix uniform. Does nothing if the program has no such
    /// uniform.
    pub fn set_uniform_mat4(&self, device: &mut dyn GraphicsDevice, name: &str, value: &Mat4) {
        if let Some(location) = self.uniform_location(device, name) {
            device.set_uniform_mat4(location, value);
        }
    }

    /// Makes this program current and applies its depth state.
    pub fn activate(&self, device: &mut dyn GraphicsDevice) {
        device.use_program(self.handle);
        device.set_depth_test(self.use_depth.then_some(self.depth_func));
    }

    fn cached(cache: &LocationCache, name: &str, lookup: impl FnOnce() -> Option<u32>) -> Option<u32> {
        if let Some(location) = cache.borrow().get(name) {
            return *location;
        }
        let location = lookup();
        cache.borrow_mut().insert(name.to_string(), location);
        location
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::headless::{DeviceCall, HeadlessDevice};
    use std::cell::Cell;

    const VS: &str = "attribute vec3 position;\nuniform mat4 model_matrix;\nuniform mat4 view_matrix;\nuniform mat4 proj_matrix;\n";
    const FS: &str = "void main() {}\n";

    #[test]
    fn compile_error_carries_log() {
        let mut device = HeadlessDevice::new(1, 1);
        let err = Program::from_sources(&mut device, "", FS).unwrap_err();
        assert!(matches!(
            err,
            Error::ShaderCompile {
                stage: ShaderStage::Vertex,
                ..
            }
        ));
        assert!(err.to_string().contains("vertex"));
    }

    #[test]
    fn link_rejects_swapped_stages() {
        let mut device = HeadlessDevice::new(1, 1);
        let vs = Shader::compile(&mut device, ShaderStage::Vertex, VS).unwrap();
        let fs = Shader::compile(&mut device, ShaderStage::Fragment, FS).unwrap();
        assert!(Program::link(&mut device, &fs, &vs).is_err());
        assert!(Program::link(&mut device, &vs, &fs).is_ok());
    }

    #[test]
    fn defaults_enable_less_equal_depth() {
        let mut device = HeadlessDevice::new(1, 1);
        let program = Program::from_sources(&mut device, VS, FS).unwrap();
        assert!(program.use_depth);
        assert_eq!(program.depth_func, DepthFunc::LessEqual);

        program.activate(&mut device);
        assert_eq!(
            device.calls(),
            &[
                DeviceCall::UseProgram(program.handle()),
                DeviceCall::DepthTest(Some(DepthFunc::LessEqual)),
            ]
        );
    }

    #[test]
    fn disabling_depth_turns_test_off() {
        let mut device = HeadlessDevice::new(1, 1);
        let mut program = Program::from_sources(&mut device, VS, FS).unwrap();
        program.use_depth = false;
        program.activate(&mut device);
        assert_eq!(device.calls()[1], DeviceCall::DepthTest(None));
    }

    #[test]
    fn missing_uniform_is_skipped() {
        let mut device = HeadlessDevice::new(1, 1);
        let program = Program::from_sources(&mut device, VS, FS).unwrap();
        program.set_uniform_mat4(&mut device, "normal_matrix", &Mat4::IDENTITY);
        assert!(device.calls().is_empty());

        program.set_uniform_mat4(&mut device, VIEW_MATRIX, &Mat4::IDENTITY);
        assert_eq!(
            device.calls(),
            &[DeviceCall::UniformMat4 {
                location: 1,
                value: Mat4::IDENTITY
            }]
        );
    }

    #[test]
    fn lookups_are_cached_including_misses() {
        let mut device = HeadlessDevice::new(1, 1);
        let program = Program::from_sources(&mut device, VS, FS).unwrap();

        let hits = Cell::new(0);
        let lookup = |name: &str| {
            Program::cached(&program.attributes, name, || {
                hits.set(hits.get() + 1);
                device.attribute_location(program.handle(), name)
            })
        };
        assert_eq!(lookup(POSITION), Some(0));
        assert_eq!(lookup(POSITION), Some(0));
        assert_eq!(lookup("uv"), None);
        assert_eq!(lookup("uv"), None);
        assert_eq!(hits.get(), 2);
    }
}
