//! Scene nodes.
//!
//! A [`Node`] is a local [`Transform`], a cached world matrix with its dirty
//! flag, hierarchy links and a [`NodeKind`] saying what else the node can do:
//!
//! | kind | updated | drawn | supplies view/projection |
//! |------|---------|-------|--------------------------|
//! | [`NodeKind::Transform`] | yes | no | no |
//! | [`NodeKind::Camera`] | yes | no | yes |
//! | [`NodeKind::Renderable`] | yes | yes | no |
//!
//! Nodes live in a [`Scene`](crate::Scene) and are addressed by [`NodeId`].
//! Hierarchy links are only changed through the scene, which keeps them
//! acyclic.

use std::fmt;

use glam::{Mat4, Quat, Vec3};

use crate::camera::Camera;
use crate::math::Mat4Ext;
use crate::scene::{MeshId, ProgramId};
use crate::transform::Transform;

/// Handle to a node in a [`Scene`](crate::Scene).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// Position of the node in its scene's list.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Mesh and program a renderable node draws with. Either may be left unset,
/// in which case the node draws nothing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Renderable {
    pub mesh: Option<MeshId>,
    pub program: Option<ProgramId>,
}

/// What a node does beyond carrying a transform.
#[derive(Clone, Debug)]
pub enum NodeKind {
    /// A pure grouping node.
    Transform,
    /// A viewpoint the scene can be rendered through.
    Camera(Camera),
    /// Geometry drawn every frame.
    Renderable(Renderable),
}

/// Time information handed to update callbacks.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameTime {
    /// Seconds since the engine started.
    pub time: f32,
    /// Seconds since the previous frame.
    pub dt: f32,
}

/// Per-frame callback attached to a node.
pub type UpdateFn = Box<dyn FnMut(&mut Node, &FrameTime)>;

pub struct Node {
    transform: Transform,
    world: Mat4,
    dirty: bool,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    kind: NodeKind,
    on_update: Option<UpdateFn>,
}

impl Node {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            transform: Transform::default(),
            world: Mat4::IDENTITY,
            dirty: true,
            parent: None,
            children: Vec::new(),
            kind,
            on_update: None,
        }
    }

    pub fn group() -> Self {
        Self::new(NodeKind::Transform)
    }

    pub fn camera(camera: Camera) -> Self {
        Self::new(NodeKind::Camera(camera))
    }

    pub fn renderable(mesh: MeshId, program: ProgramId) -> Self {
        Self::new(NodeKind::Renderable(Renderable {
            mesh: Some(mesh),
            program: Some(program),
        }))
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.set_transform(transform);
        self
    }

    pub fn with_position(mut self, position: Vec3) -> Self {
        self.set_position(position);
        self
    }

    /// Attaches a callback run at the start of every scene update.
    pub fn on_update(mut self, f: impl FnMut(&mut Node, &FrameTime) + 'static) -> Self {
        self.on_update = Some(Box::new(f));
        self
    }

    pub fn set_update(&mut self, f: impl FnMut(&mut Node, &FrameTime) + 'static) {
        self.on_update = Some(Box::new(f));
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    /// Mutable access to the local transform; marks the node dirty.
    pub fn transform_mut(&mut self) -> &mut Transform {
        self.dirty = true;
        &mut self.transform
    }

    pub fn set_transform(&mut self, transform: Transform) {
        *self.transform_mut() = transform;
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.transform_mut().position = position;
    }

    pub fn set_rotation(&mut self, rotation: Quat) {
        self.transform_mut().rotation = rotation;
    }

    pub fn set_scale(&mut self, scale: Vec3) {
        self.transform_mut().scale = scale;
    }

    /// World matrix as of the last recompute.
    pub fn world(&self) -> &Mat4 {
        &self.world
    }

    /// Whether the world matrix is stale.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn kind_mut(&mut self) -> &mut NodeKind {
        &mut self.kind
    }

    pub fn camera_state(&self) -> Option<&Camera> {
        match &self.kind {
            NodeKind::Camera(camera) => Some(camera),
            _ => None,
        }
    }

    pub fn camera_state_mut(&mut self) -> Option<&mut Camera> {
        match &mut self.kind {
            NodeKind::Camera(camera) => Some(camera),
            _ => None,
        }
    }

    pub fn renderable_state(&self) -> Option<&Renderable> {
        match &self.kind {
            NodeKind::Renderable(renderable) => Some(renderable),
            _ => None,
        }
    }

    pub fn renderable_state_mut(&mut self) -> Option<&mut Renderable> {
        match &mut self.kind {
            NodeKind::Renderable(renderable) => Some(renderable),
            _ => None,
        }
    }

    pub(crate) fn run_update(&mut self, time: &FrameTime) {
        if let Some(mut f) = self.on_update.take() {
            f(self, time);
            // the callback may have installed a replacement
            if self.on_update.is_none() {
                self.on_update = Some(f);
            }
        }
    }

    /// Recomputes the world matrix as `parent_world × local` and clears the
    /// dirty flag. Cameras also refresh their view matrix.
    pub(crate) fn recompute_world(&mut self, parent_world: Option<&Mat4>) {
        let mut world = self.transform.matrix();
        if let Some(parent_world) = parent_world {
            world.compose(parent_world);
        }
        self.world = world;
        if let NodeKind::Camera(camera) = &mut self.kind {
            camera.update_view(&world);
        }
        self.dirty = false;
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("transform", &self.transform)
            .field("dirty", &self.dirty)
            .field("parent", &self.parent)
            .field("children", &self.children)
            .field("kind", &self.kind)
            .field("on_update", &self.on_update.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn new_nodes_start_dirty() {
        let node = Node::group();
        assert!(node.is_dirty());
        assert_eq!(*node.world(), Mat4::IDENTITY);
    }

    #[test]
    fn root_world_is_local_trs() {
        let transform = Transform::new()
            .position(Vec3::new(1.0, 2.0, 3.0))
            .euler(0.2, 0.4, 0.1)
            .scale(Vec3::new(1.0, 2.0, 0.5));
        let mut node = Node::group().with_transform(transform);
        node.recompute_world(None);
        assert_eq!(*node.world(), transform.matrix());
        assert!(!node.is_dirty());
    }

    #[test]
    fn setters_mark_dirty() {
        let mut node = Node::group();
        node.recompute_world(None);
        node.set_position(Vec3::X);
        assert!(node.is_dirty());
        node.recompute_world(None);
        node.transform_mut().scale = Vec3::splat(2.0);
        assert!(node.is_dirty());
    }

    #[test]
    fn parent_world_is_applied_last() {
        let parent = Mat4::from_rotation_z(FRAC_PI_2);
        let mut child = Node::group().with_position(Vec3::X);
        child.recompute_world(Some(&parent));

        let origin = child.world().transform_point3(Vec3::ZERO);
        assert!(origin.abs_diff_eq(Vec3::Y, 1e-6));
        let reversed = Mat4::from_translation(Vec3::X) * parent;
        assert!(!child.world().abs_diff_eq(reversed, 1e-3));
    }

    #[test]
    fn camera_view_follows_world() {
        let mut node = Node::camera(Camera::new()).with_position(Vec3::new(0.0, 0.0, 4.0));
        node.recompute_world(None);
        let camera = node.camera_state().unwrap();
        assert_eq!(camera.view().m23(), -4.0);
    }

    #[test]
    fn update_callback_runs_and_is_kept() {
        let mut node = Node::group().on_update(|node, time| {
            let x = node.transform().position.x;
            node.set_position(Vec3::new(x + time.dt, 0.0, 0.0));
        });
        let time = FrameTime { time: 0.0, dt: 0.5 };
        node.run_update(&time);
        node.run_update(&time);
        assert_eq!(node.transform().position.x, 1.0);
    }

    #[test]
    fn callback_can_replace_itself() {
        let mut node = Node::group().on_update(|node, _| {
            node.set_update(|node, _| node.set_scale(Vec3::splat(3.0)));
        });
        node.run_update(&FrameTime::default());
        node.run_update(&FrameTime::default());
        assert_eq!(node.transform().scale, Vec3::splat(3.0));
    }
}
