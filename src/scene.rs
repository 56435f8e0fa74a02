//! The scene arena.
//!
//! A [`Scene`] owns its nodes, meshes and programs in flat lists and hands
//! out index handles ([`NodeId`], [`MeshId`], [`ProgramId`]). Every scene
//! starts with one camera node at index 0, which is also the active camera.
//!
//! Per frame:
//!
//! 1. [`Scene::update`] runs each node's callback and recomputes stale world
//!    matrices, parents before children. A recomputed node marks its direct
//!    children dirty, which the same pass then picks up.
//! 2. [`Scene::render`] clears the target and draws every renderable node in
//!    list order through a camera's view and projection.
//!
//! ```
//! use tessera::{HeadlessDevice, FrameTime, Mesh, Node, Program, Scene, Vec3};
//!
//! let mut device = HeadlessDevice::new(800, 600);
//! let mut scene = Scene::new();
//!
//! let program = Program::from_sources(
//!     &mut device,
//!     "attribute vec3 position;\nuniform mat4 model_matrix;",
//!     "void main() {}",
//! )?;
//! let program = scene.add_program(program);
//!
//! let mut mesh = Mesh::cuboid(1.0, 1.0, 1.0, 1, 1, 1);
//! mesh.upload(&mut device);
//! let mesh = scene.add_mesh(mesh);
//!
//! let parent = scene.add(Node::renderable(mesh, program).with_position(Vec3::new(0.0, 0.0, -5.0)));
//! let child = scene.add_child(parent, Node::renderable(mesh, program).with_position(Vec3::X))?;
//!
//! scene.update(&device, &FrameTime::default());
//! assert_eq!(scene.node(child).unwrap().world().w_axis.z, -5.0);
//! assert_eq!(scene.render_active(&mut device)?, 2);
//! # Ok::<(), tessera::Error>(())
//! ```

use glam::{Mat4, Vec3};

use crate::camera::Camera;
use crate::device::{ClearFlags, GraphicsDevice};
use crate::error::{Error, Result};
use crate::mesh::Mesh;
use crate::node::{FrameTime, Node, NodeId, Renderable};
use crate::shader::{MODEL_MATRIX, PROJ_MATRIX, Program, VIEW_MATRIX};

/// Handle to a mesh stored in a [`Scene`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MeshId(pub(crate) usize);

/// Handle to a program stored in a [`Scene`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ProgramId(pub(crate) usize);

/// Camera matrices for one render, passed to every draw.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderContext {
    /// The camera node being rendered through.
    pub camera: NodeId,
    pub view: Mat4,
    pub projection: Mat4,
}

impl RenderContext {
    /// Feeds model, view and projection matrices to `program`. Uniforms the
    /// program does not declare are skipped.
    pub fn apply(&self, program: &Program, device: &mut dyn GraphicsDevice, model: &Mat4) {
        program.set_uniform_mat4(device, MODEL_MATRIX, model);
        program.set_uniform_mat4(device, VIEW_MATRIX, &self.view);
        program.set_uniform_mat4(device, PROJ_MATRIX, &self.projection);
    }
}

pub struct Scene {
    nodes: Vec<Node>,
    meshes: Vec<Mesh>,
    programs: Vec<Program>,
    wireframe_program: Option<ProgramId>,
    active_camera: NodeId,
    /// Colour the target is cleared to before drawing.
    pub background_color: [f32; 4],
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    /// Creates a scene holding a single default camera at `(0, 0, 1)`.
    pub fn new() -> Self {
        let camera = Node::camera(Camera::new()).with_position(Vec3::new(0.0, 0.0, 1.0));
        Self {
            nodes: vec![camera],
            meshes: Vec::new(),
            programs: Vec::new(),
            wireframe_program: None,
            active_camera: NodeId(0),
            background_color: [0.3, 0.3, 0.3, 1.0],
        }
    }

    /// Appends a node to the list and returns its handle.
    pub fn add(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        id
    }

    /// Appends a node and parents it under `parent`.
    pub fn add_child(&mut self, parent: NodeId, node: Node) -> Result<NodeId> {
        self.check(parent)?;
        let id = self.add(node);
        self.set_parent(id, parent)?;
        Ok(id)
    }

    pub fn add_mesh(&mut self, mesh: Mesh) -> MeshId {
        self.meshes.push(mesh);
        MeshId(self.meshes.len() - 1)
    }

    pub fn add_program(&mut self, program: Program) -> ProgramId {
        self.programs.push(program);
        ProgramId(self.programs.len() - 1)
    }

    /// Program used to draw the edges of meshes with `draw_wireframe` set.
    pub fn set_wireframe_program(&mut self, program: ProgramId) {
        self.wireframe_program = Some(program);
    }

    pub fn wireframe_program(&self) -> Option<ProgramId> {
        self.wireframe_program
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0)
    }

    pub fn mesh(&self, id: MeshId) -> Option<&Mesh> {
        self.meshes.get(id.0)
    }

    pub fn mesh_mut(&mut self, id: MeshId) -> Option<&mut Mesh> {
        self.meshes.get_mut(id.0)
    }

    pub fn program(&self, id: ProgramId) -> Option<&Program> {
        self.programs.get(id.0)
    }

    pub fn program_mut(&mut self, id: ProgramId) -> Option<&mut Program> {
        self.programs.get_mut(id.0)
    }

    /// Number of nodes, the default camera included.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Nodes in list order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter().enumerate().map(|(i, node)| (NodeId(i), node))
    }

    /// The camera the last render went through, initially the default camera.
    pub fn active_camera(&self) -> NodeId {
        self.active_camera
    }

    pub fn set_active_camera(&mut self, camera: NodeId) -> Result<()> {
        self.camera_context(camera)?;
        self.active_camera = camera;
        Ok(())
    }

    fn check(&self, id: NodeId) -> Result<()> {
        if id.0 < self.nodes.len() {
            Ok(())
        } else {
            Err(Error::UnknownNode(id))
        }
    }

    /// Whether `ancestor` is `node` itself or lies on its parent chain.
    fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.nodes[id.0].parent;
        }
        false
    }

    /// Makes `child` the last child of `parent`, detaching it from any
    /// previous parent.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownNode`] for a foreign handle, [`Error::HierarchyCycle`]
    /// if `child` is `parent` or one of its ancestors.
    pub fn set_parent(&mut self, child: NodeId, parent: NodeId) -> Result<()> {
        self.check(child)?;
        self.check(parent)?;
        if self.is_ancestor(child, parent) {
            return Err(Error::HierarchyCycle { child, parent });
        }

        if let Some(old) = self.nodes[child.0].parent.take() {
            self.nodes[old.0].children.retain(|c| *c != child);
        }
        self.nodes[parent.0].children.push(child);

        let node = &mut self.nodes[child.0];
        node.parent = Some(parent);
        node.mark_dirty();
        Ok(())
    }

    /// Visiting order of [`update`](Self::update): root nodes in list order,
    /// each followed depth-first by its descendants in child order.
    pub fn update_order(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = Vec::new();
        for (index, node) in self.nodes.iter().enumerate() {
            if node.parent.is_some() {
                continue;
            }
            stack.push(NodeId(index));
            while let Some(id) = stack.pop() {
                order.push(id);
                stack.extend(self.nodes[id.0].children.iter().rev().copied());
            }
        }
        order
    }

    /// Runs one update pass.
    ///
    /// Each node runs its callback, then recomputes its world matrix if
    /// dirty and marks its direct children dirty. Camera nodes then compare
    /// their cached viewport against the device and rebuild their projection
    /// on a change.
    pub fn update(&mut self, device: &dyn GraphicsDevice, time: &FrameTime) {
        let viewport = device.viewport_size();
        let order = self.update_order();

        for &id in &order {
            let parent_world = self.nodes[id.0].parent.map(|p| *self.nodes[p.0].world());
            let node = &mut self.nodes[id.0];

            node.run_update(time);
            let mut invalidated = Vec::new();
            if node.is_dirty() {
                node.recompute_world(parent_world.as_ref());
                invalidated.extend_from_slice(node.children());
            }
            if let Some(camera) = node.camera_state_mut() {
                camera.sync_viewport(viewport);
            }

            for child in invalidated {
                self.nodes[child.0].mark_dirty();
            }
        }

        log::trace!("updated {} nodes", order.len());
    }

    fn camera_context(&self, camera: NodeId) -> Result<RenderContext> {
        let node = self.node(camera).ok_or(Error::UnknownNode(camera))?;
        let state = node.camera_state().ok_or(Error::NotACamera(camera))?;
        Ok(RenderContext {
            camera,
            view: *state.view(),
            projection: *state.projection(),
        })
    }

    /// Renders the scene through `camera`, which becomes the active camera.
    ///
    /// Sets the viewport to the full device size, clears colour and depth to
    /// the background, then [`draw`](Self::draw)s. Returns the number of
    /// nodes that produced a draw.
    pub fn render(&mut self, camera: NodeId, device: &mut dyn GraphicsDevice) -> Result<usize> {
        let context = self.camera_context(camera)?;
        self.active_camera = camera;

        let (width, height) = device.viewport_size();
        device.set_viewport(0, 0, width, height);
        device.set_clear_color(self.background_color);
        device.clear(ClearFlags::ALL);

        Ok(self.draw(device, &context))
    }

    /// Renders through the active camera.
    pub fn render_active(&mut self, device: &mut dyn GraphicsDevice) -> Result<usize> {
        self.render(self.active_camera, device)
    }

    /// Draws every renderable node in list order.
    ///
    /// Nodes without a mesh or program, and meshes with nothing to draw, are
    /// skipped. Meshes asking for a wireframe get a second, line pass with the
    /// scene's wireframe program when one is registered.
    pub fn draw(&mut self, device: &mut dyn GraphicsDevice, context: &RenderContext) -> usize {
        let wireframe = self.wireframe_program.and_then(|id| self.programs.get(id.0));
        let mut drawn = 0;

        for node in &self.nodes {
            let Some(&Renderable {
                mesh: Some(mesh),
                program: Some(program),
            }) = node.renderable_state()
            else {
                continue;
            };
            let (Some(mesh), Some(program)) =
                (self.meshes.get_mut(mesh.0), self.programs.get(program.0))
            else {
                continue;
            };

            program.activate(device);
            context.apply(program, device, node.world());
            if !mesh.draw(device, program) {
                continue;
            }
            drawn += 1;

            if let Some(wireframe) = wireframe.filter(|_| mesh.wants_wireframe()) {
                wireframe.activate(device);
                context.apply(wireframe, device, node.world());
                mesh.draw_wireframe_overlay(device, wireframe);
            }
        }

        log::trace!("drew {drawn} nodes");
        drawn
    }
}
