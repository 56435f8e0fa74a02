//! # Tessera
//!
//! **A small scene graph: transforms, cameras and procedural meshes over a
//! pluggable graphics device.**
//!
//! Nodes carry a position, rotation and scale and cache a world matrix that
//! is recomputed only when something up the hierarchy moved. A camera node
//! turns its world matrix into a view matrix and keeps its projection in step
//! with the viewport. Meshes are bags of vertex attributes, uploaded once and
//! drawn through a compiled shader program.
//!
//! ## Quick Start
//!
//! ```no_run
//! use tessera::{AppConfig, Mesh, Node, Quat, Vec3};
//! use tessera::wgpu_device::{BASIC_FRAGMENT_WGSL, BASIC_VERTEX_WGSL};
//!
//! fn main() -> tessera::Result<()> {
//!     tessera::run_with_config(AppConfig::new().title("Spinning box"), |engine| {
//!         let program = engine.compile_program(BASIC_VERTEX_WGSL, BASIC_FRAGMENT_WGSL)?;
//!         let cube = engine.add_mesh(Mesh::cuboid(0.5, 0.5, 0.5, 1, 1, 1));
//!
//!         engine.add(
//!             Node::renderable(cube, program)
//!                 .with_position(Vec3::new(0.0, 0.0, -1.0))
//!                 .on_update(|node, time| node.set_rotation(Quat::from_rotation_y(time.time))),
//!         );
//!
//!         Ok(|_scene: &mut tessera::Scene, _time: &tessera::FrameTime| {})
//!     })
//! }
//! ```
//!
//! ## Without a window
//!
//! Everything except [`app`](run) and [`WgpuDevice`] talks to a
//! [`GraphicsDevice`] trait object. [`HeadlessDevice`] implements it in
//! memory and records every call, which is what the tests use.

mod app;
mod camera;
mod device;
mod engine;
mod error;
pub mod geometry;
mod gpu;
mod headless;
mod logging;
mod math;
mod mesh;
mod node;
mod scene;
mod shader;
mod transform;
pub mod wgpu_device;

pub use app::{AppConfig, run, run_with_config};
pub use camera::{Camera, view_from_world};
pub use device::{
    BufferHandle, BufferUsage, ClearFlags, DepthFunc, GraphicsDevice, ProgramHandle, ScalarType,
    ShaderHandle, ShaderStage, Topology, VertexLayout,
};
pub use engine::Engine;
pub use error::{Error, Result};
pub use geometry::PlaneDirection;
pub use gpu::GpuContext;
pub use headless::{DeviceCall, HeadlessDevice};
pub use logging::{LoggingConfig, init_logging};
pub use math::{
    Mat4Ext, Vec3Ext, checked_perspective, perspective, quat_from_euler, quat_to_euler, trs,
};
pub use mesh::{Attribute, Mesh, wireframe_lines};
pub use node::{FrameTime, Node, NodeId, NodeKind, Renderable, UpdateFn};
pub use scene::{MeshId, ProgramId, RenderContext, Scene};
pub use shader::{Program, Shader};
pub use transform::Transform;
pub use wgpu_device::WgpuDevice;

// Re-export glam math types for convenience
pub use glam::{Mat4, Quat, Vec3, Vec4};
