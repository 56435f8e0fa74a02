//! Device, scene and frame clock in one place.
//!
//! [`Engine`] is what the windowed app drives, but it works with any
//! [`GraphicsDevice`]:
//!
//! ```
//! use tessera::{Engine, HeadlessDevice, Mesh, Node, Topology};
//!
//! let mut engine = Engine::new(HeadlessDevice::new(320, 240));
//! let program = engine.compile_program(
//!     "attribute vec3 position;\nuniform mat4 model_matrix;",
//!     "void main() {}",
//! )?;
//! let mesh = engine.add_mesh(Mesh::cuboid(1.0, 1.0, 1.0, 2, 2, 2));
//! engine.add(Node::renderable(mesh, program));
//!
//! engine.frame()?;
//! assert_eq!(engine.device().draws(), vec![(Topology::Triangles, 144)]);
//! # Ok::<(), tessera::Error>(())
//! ```

use std::time::Instant;

use crate::device::GraphicsDevice;
use crate::error::Result;
use crate::mesh::Mesh;
use crate::node::{FrameTime, Node, NodeId};
use crate::scene::{MeshId, ProgramId, Scene};
use crate::shader::Program;

pub struct Engine<D: GraphicsDevice> {
    device: D,
    scene: Scene,
    start_time: Instant,
    last_frame: Instant,
}

impl<D: GraphicsDevice> Engine<D> {
    /// Wraps `device` with a fresh [`Scene`].
    pub fn new(device: D) -> Self {
        let now = Instant::now();
        Self {
            device,
            scene: Scene::new(),
            start_time: now,
            last_frame: now,
        }
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    /// Compiles and links a program and stores it in the scene.
    pub fn compile_program(&mut self, vertex_source: &str, fragment_source: &str) -> Result<ProgramId> {
        let program = Program::from_sources(&mut self.device, vertex_source, fragment_source)?;
        Ok(self.scene.add_program(program))
    }

    /// Uploads `mesh` and stores it in the scene.
    pub fn add_mesh(&mut self, mut mesh: Mesh) -> MeshId {
        mesh.upload(&mut self.device);
        self.scene.add_mesh(mesh)
    }

    pub fn add(&mut self, node: Node) -> NodeId {
        self.scene.add(node)
    }

    /// Advances the clock and returns the new frame's timing.
    pub fn tick(&mut self) -> FrameTime {
        let now = Instant::now();
        let time = FrameTime {
            time: now.duration_since(self.start_time).as_secs_f32(),
            dt: now.duration_since(self.last_frame).as_secs_f32(),
        };
        self.last_frame = now;
        time
    }

    /// Updates the scene, renders it through the active camera and presents.
    /// Returns the number of nodes drawn.
    pub fn frame_at(&mut self, time: &FrameTime) -> Result<usize> {
        self.scene.update(&self.device, time);
        let drawn = self.scene.render_active(&mut self.device)?;
        self.device.present()?;
        Ok(drawn)
    }

    /// [`tick`](Self::tick) followed by [`frame_at`](Self::frame_at).
    pub fn frame(&mut self) -> Result<usize> {
        let time = self.tick();
        self.frame_at(&time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::headless::{DeviceCall, HeadlessDevice};
    use glam::Vec3;

    const VS: &str = "attribute vec3 position;\nuniform mat4 model_matrix;\n";
    const FS: &str = "void main() {}\n";

    #[test]
    fn frame_updates_renders_and_presents() {
        let mut engine = Engine::new(HeadlessDevice::new(64, 64));
        let program = engine.compile_program(VS, FS).unwrap();
        let mesh = engine.add_mesh(Mesh::cuboid(1.0, 1.0, 1.0, 1, 1, 1));
        let node = engine.add(Node::renderable(mesh, program).with_position(Vec3::Y));
        engine.device_mut().take_calls();

        let drawn = engine.frame_at(&FrameTime { time: 1.0, dt: 0.016 }).unwrap();
        assert_eq!(drawn, 1);
        assert_eq!(engine.device().calls().last(), Some(&DeviceCall::Present));
        let world = engine.scene().node(node).unwrap().world();
        assert_eq!(world.w_axis.y, 1.0);
    }

    #[test]
    fn bad_shader_is_reported() {
        let mut engine = Engine::new(HeadlessDevice::new(1, 1));
        assert!(matches!(
            engine.compile_program(VS, " "),
            Err(Error::ShaderCompile { .. })
        ));
        assert_eq!(engine.scene().program(ProgramId(0)).map(|_| ()), None);
    }

    #[test]
    fn clock_is_monotonic() {
        let mut engine = Engine::new(HeadlessDevice::new(1, 1));
        let first = engine.tick();
        let second = engine.tick();
        assert!(second.time >= first.time);
        assert!(second.dt >= 0.0);
    }

    #[test]
    fn callbacks_see_frame_time() {
        let mut engine = Engine::new(HeadlessDevice::new(1, 1));
        let id = engine.add(Node::group().on_update(|node, time| {
            node.set_position(Vec3::splat(time.time));
        }));
        engine.frame_at(&FrameTime { time: 3.0, dt: 0.5 }).unwrap();
        assert_eq!(engine.scene().node(id).unwrap().transform().position, Vec3::splat(3.0));
    }
}
