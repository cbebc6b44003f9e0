//! Spatial nodes
//!
//! A node carries a local transform, an ordered set of owned children, and a
//! non-owning back-reference to its parent. Whether a node contributes a draw
//! call is decided at construction through [`NodeKind`].

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use slotmap::new_key_type;

use crate::foundation::math::Transform;
use crate::render::mesh::Mesh;
use crate::render::shader::ShaderBinding;
use crate::scene::camera::Lens;

static NEXT_NODE_ID: AtomicU32 = AtomicU32::new(1);

/// Process-unique node identifier, assigned monotonically at construction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    fn next() -> Self {
        Self(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// The raw id value
    pub fn value(self) -> u32 {
        self.0
    }
}

new_key_type! {
    /// Arena handle to a node
    ///
    /// Keys are non-owning: detach and reattach never invalidate them, and a
    /// key whose node was deleted simply fails lookup instead of dangling.
    pub struct NodeKey;
}

/// Per-node lifecycle hooks
///
/// `on_awake` fires when the node's renderable state is registered with the
/// flat draw list, `on_start` once when the node is attached, `on_update`
/// every frame during the post-order tree walk. Hooks receive the node with
/// its behavior slot taken, so they can mutate the node's own state but not
/// the tree shape.
pub trait NodeBehavior {
    /// Called when the node's renderable is registered for drawing
    fn on_awake(&mut self, _node: &mut Node) {}

    /// Called when the node is attached to a parent
    fn on_start(&mut self, _node: &mut Node) {}

    /// Called once per frame, descendants before their owner
    fn on_update(&mut self, _node: &mut Node, _delta: f32) {}
}

/// Debug-UI element drawn after the 3D passes
pub trait UiWidget {
    /// Emit this widget's UI
    fn draw_ui(&self);
}

/// Draw state carried by a renderable node
pub struct Renderable {
    /// Shader binding the draw is delegated to
    pub shader: Arc<dyn ShaderBinding>,
    /// Author-set translucency flag; partitions the draw order
    pub translucent: bool,
    /// Geometry handed to the shader binding
    pub mesh: Mesh,
}

/// What a node contributes to the frame, fixed at construction
pub enum NodeKind {
    /// Pure transform holder
    Group,
    /// Viewpoint with projection parameters
    Camera(Lens),
    /// Contributes one draw call per frame
    Renderable(Renderable),
}

/// Spatial node stored in the scene arena
pub struct Node {
    id: NodeId,
    /// Human-readable name, used in lifecycle logging
    pub name: String,
    /// Transform relative to the parent
    pub local: Transform,
    pub(crate) parent: Option<NodeKey>,
    pub(crate) children: Vec<NodeKey>,
    /// The node's draw contribution
    pub kind: NodeKind,
    pub(crate) behavior: Option<Box<dyn NodeBehavior>>,
    /// Optional debug-UI element drawn right after this node's 3D draw
    pub ui: Option<Arc<dyn UiWidget>>,
}

impl Node {
    /// Create a standalone node (no parent, unique id assigned)
    pub fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            id: NodeId::next(),
            name: name.into(),
            local: Transform::identity(),
            parent: None,
            children: Vec::new(),
            kind,
            behavior: None,
            ui: None,
        }
    }

    /// Create a pure transform-holder node
    pub fn group(name: impl Into<String>) -> Self {
        Self::new(name, NodeKind::Group)
    }

    /// Create a camera node
    pub fn camera(name: impl Into<String>, lens: Lens) -> Self {
        Self::new(name, NodeKind::Camera(lens))
    }

    /// Create a renderable node
    pub fn renderable(
        name: impl Into<String>,
        shader: Arc<dyn ShaderBinding>,
        mesh: Mesh,
        translucent: bool,
    ) -> Self {
        Self::new(
            name,
            NodeKind::Renderable(Renderable {
                shader,
                translucent,
                mesh,
            }),
        )
    }

    /// Attach lifecycle hooks
    #[must_use]
    pub fn with_behavior(mut self, behavior: Box<dyn NodeBehavior>) -> Self {
        self.behavior = Some(behavior);
        self
    }

    /// Attach a debug-UI element
    #[must_use]
    pub fn with_ui(mut self, ui: Arc<dyn UiWidget>) -> Self {
        self.ui = Some(ui);
        self
    }

    /// Set the local transform in place
    #[must_use]
    pub fn with_transform(mut self, local: Transform) -> Self {
        self.local = local;
        self
    }

    /// The node's process-unique id
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Non-owning handle to the parent, if attached
    pub fn parent(&self) -> Option<NodeKey> {
        self.parent
    }

    /// Ordered handles of the owned children
    pub fn children(&self) -> &[NodeKey] {
        &self.children
    }

    /// Capability query: renderable state, if this node carries any
    pub fn as_renderable(&self) -> Option<&Renderable> {
        match &self.kind {
            NodeKind::Renderable(r) => Some(r),
            _ => None,
        }
    }

    /// Mutable renderable state, if this node carries any
    pub fn as_renderable_mut(&mut self) -> Option<&mut Renderable> {
        match &mut self.kind {
            NodeKind::Renderable(r) => Some(r),
            _ => None,
        }
    }

    /// Capability query: camera lens, if this node is a camera
    pub fn as_camera(&self) -> Option<&Lens> {
        match &self.kind {
            NodeKind::Camera(lens) => Some(lens),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique_and_monotonic() {
        let a = Node::group("a");
        let b = Node::group("b");
        assert!(b.id().value() > a.id().value());
    }

    #[test]
    fn test_capability_queries() {
        let group = Node::group("g");
        assert!(group.as_renderable().is_none());
        assert!(group.as_camera().is_none());

        let camera = Node::camera("cam", Lens::default());
        assert!(camera.as_camera().is_some());
    }
}
