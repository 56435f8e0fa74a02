//! Error types for tessera.
//!
//! Shader and program failures are fatal and carry the driver's diagnostic
//! log. Missing meshes, programs or attributes are *not* errors: drawing such
//! a node is a silent no-op.

use thiserror::Error;

use crate::device::ShaderStage;
use crate::node::NodeId;

/// Main error type for the crate.
#[derive(Error, Debug)]
pub enum Error {
    /// A shader failed to compile.
    #[error("could not compile {stage} shader:\n\n{log}")]
    ShaderCompile { stage: ShaderStage, log: String },

    /// A vertex/fragment pair failed to link into a program.
    #[error("could not link program:\n\n{log}")]
    ProgramLink { log: String },

    /// Near and far planes that would divide by zero.
    #[error("invalid projection planes: near {near}, far {far}")]
    InvalidProjection { near: f32, far: f32 },

    /// A node handle that does not belong to this scene.
    #[error("unknown node {0}")]
    UnknownNode(NodeId),

    /// A render was requested through a node that is not a camera.
    #[error("node {0} is not a camera")]
    NotACamera(NodeId),

    /// Linking `child` under `parent` would make a node its own ancestor.
    #[error("parenting {child} under {parent} would create a cycle")]
    HierarchyCycle { child: NodeId, parent: NodeId },

    /// Adapter, device or surface creation failed.
    #[error("device error: {0}")]
    Device(String),

    /// The surface could not hand out a frame.
    #[error("surface error: {0}")]
    Surface(String),

    /// The windowing event loop failed.
    #[error("event loop error: {0}")]
    EventLoop(String),
}

/// Result type alias using the crate's [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
