//! Arena-backed spatial node tree
//!
//! Owns every node in a slotmap arena plus the flat renderable list the
//! draw path iterates. Forward edges (parent owns children) are the only
//! ownership edges; the child-to-parent link is a plain key. Tree mutations
//! push renderables into and pull them out of the flat list so the per-frame
//! sort and draw never walk the tree.

use slotmap::SlotMap;

use crate::foundation::math::{Mat4, Quat, Vec3};
use crate::scene::node::{Node, NodeBehavior, NodeId, NodeKey};

/// Node arena, tree operations, and the flat renderable registry
pub struct SceneGraph {
    nodes: SlotMap<NodeKey, Node>,
    renderables: Vec<NodeKey>,
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneGraph {
    /// Create an empty scene
    pub fn new() -> Self {
        Self {
            nodes: SlotMap::with_key(),
            renderables: Vec::new(),
        }
    }

    /// Move a standalone node into the arena
    pub fn insert(&mut self, node: Node) -> NodeKey {
        self.nodes.insert(node)
    }

    /// Look up a node
    pub fn node(&self, key: NodeKey) -> Option<&Node> {
        self.nodes.get(key)
    }

    /// Look up a node mutably
    pub fn node_mut(&mut self, key: NodeKey) -> Option<&mut Node> {
        self.nodes.get_mut(key)
    }

    /// Number of nodes in the arena
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the arena holds no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    // ------------------------------------------------------------------
    // Tree mutation
    // ------------------------------------------------------------------

    /// Append `child` to `parent`'s children and wire the back-reference
    ///
    /// Registers every renderable in the attached subtree with the flat
    /// list, then fires the child's start hook. No cycle check is performed;
    /// the caller must not attach a node to its own descendant.
    pub fn add_child(&mut self, parent: NodeKey, child: NodeKey) {
        if parent == child {
            log::error!("cannot attach a node to itself");
            return;
        }
        if !self.nodes.contains_key(parent) || !self.nodes.contains_key(child) {
            log::error!("add_child on a deleted node");
            return;
        }

        self.nodes[parent].children.push(child);
        self.nodes[child].parent = Some(parent);

        for key in self.collect_subtree(child) {
            self.register_renderable(key);
        }

        self.fire_start(child);
        if let Some(node) = self.nodes.get(child) {
            log::info!("node [{}] initialised", node.name);
        }
    }

    /// Detach the first child of `parent` whose unique id is `id`
    ///
    /// Unregisters every renderable in the detached subtree, clears the
    /// parent back-reference, and returns the subtree's handle. A missing id
    /// is a silent no-op returning `None`.
    pub fn detach_child(&mut self, parent: NodeKey, id: NodeId) -> Option<NodeKey> {
        let child = {
            let nodes = &self.nodes;
            nodes.get(parent)?.children.iter().copied().find(|key| {
                nodes.get(*key).is_some_and(|node| node.id() == id)
            })
        };
        let Some(child) = child else {
            log::debug!("detach_child: no child with id {}", id.value());
            return None;
        };

        self.nodes[parent].children.retain(|key| *key != child);
        self.unregister_subtree(child);
        self.nodes[child].parent = None;
        Some(child)
    }

    /// Detach every child of `parent`, returning their handles
    ///
    /// All renderables in every detached subtree leave the flat list.
    pub fn detach_all_children(&mut self, parent: NodeKey) -> Vec<NodeKey> {
        let Some(node) = self.nodes.get_mut(parent) else {
            return Vec::new();
        };
        let children = std::mem::take(&mut node.children);
        for &child in &children {
            self.unregister_subtree(child);
            if let Some(c) = self.nodes.get_mut(child) {
                c.parent = None;
            }
        }
        children
    }

    /// Detach and destroy every child subtree of `parent`
    pub fn delete_all_children(&mut self, parent: NodeKey) {
        for child in self.detach_all_children(parent) {
            self.remove_subtree(child);
        }
    }

    /// Detach this node (and its subtree) from its parent
    pub fn detach_from_parent(&mut self, key: NodeKey) {
        self.unregister_subtree(key);
        let Some(node) = self.nodes.get_mut(key) else {
            return;
        };
        let parent = node.parent.take();
        if let Some(parent) = parent {
            if let Some(p) = self.nodes.get_mut(parent) {
                p.children.retain(|k| *k != key);
            }
        }
    }

    /// Detach this node from its parent and destroy its whole subtree
    pub fn delete_node(&mut self, key: NodeKey) {
        self.detach_from_parent(key);
        self.remove_subtree(key);
    }

    fn remove_subtree(&mut self, key: NodeKey) {
        for k in self.collect_subtree(key) {
            self.nodes.remove(k);
        }
    }

    // ------------------------------------------------------------------
    // Renderable registration
    // ------------------------------------------------------------------

    /// Flat list of renderable handles, in current draw order
    pub fn renderables(&self) -> &[NodeKey] {
        &self.renderables
    }

    pub(crate) fn set_renderables(&mut self, ordered: Vec<NodeKey>) {
        self.renderables = ordered;
    }

    /// Register a node's renderable state with the flat list
    ///
    /// Fires the node's awake hook, then appends. Nodes without renderable
    /// state and nodes already registered are skipped.
    pub fn register_renderable(&mut self, key: NodeKey) {
        let Some(node) = self.nodes.get(key) else {
            return;
        };
        if node.as_renderable().is_none() || self.renderables.contains(&key) {
            return;
        }
        self.fire_awake(key);
        self.renderables.push(key);
    }

    /// Remove every flat-list entry whose node id matches
    ///
    /// Full scan-and-filter; a silent no-op when nothing matches. Entries
    /// whose node no longer exists are dropped as well.
    pub fn unregister_renderable(&mut self, id: NodeId) {
        let nodes = &self.nodes;
        self.renderables
            .retain(|key| nodes.get(*key).is_some_and(|node| node.id() != id));
    }

    fn unregister_subtree(&mut self, key: NodeKey) {
        for k in self.collect_subtree(key) {
            if let Some(node) = self.nodes.get(k) {
                if node.as_renderable().is_some() {
                    let id = node.id();
                    self.unregister_renderable(id);
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Traversal
    // ------------------------------------------------------------------

    fn collect_subtree(&self, key: NodeKey) -> Vec<NodeKey> {
        let mut out = Vec::new();
        self.collect_into(key, &mut out);
        out
    }

    // depth-first, post-order: descendants precede the node that owns them
    fn collect_into(&self, key: NodeKey, out: &mut Vec<NodeKey>) {
        let Some(node) = self.nodes.get(key) else {
            return;
        };
        let children = node.children.clone();
        for child in children {
            self.collect_into(child, out);
        }
        out.push(key);
    }

    /// Apply `f` to each direct child, in order (non-recursive)
    pub fn for_each_child(&mut self, key: NodeKey, mut f: impl FnMut(&mut Node)) {
        let Some(node) = self.nodes.get(key) else {
            return;
        };
        for child in node.children.clone() {
            if let Some(c) = self.nodes.get_mut(child) {
                f(c);
            }
        }
    }

    /// Apply `f` to every descendant, depth-first post-order (self excluded)
    pub fn for_each_descendant(&mut self, key: NodeKey, mut f: impl FnMut(&mut Node)) {
        let mut keys = self.collect_subtree(key);
        keys.pop(); // the node itself is collected last
        for k in keys {
            if let Some(node) = self.nodes.get_mut(k) {
                f(node);
            }
        }
    }

    /// Apply `f` to each direct child, then to the node itself
    pub fn for_each_child_and_self(&mut self, key: NodeKey, mut f: impl FnMut(&mut Node)) {
        let Some(node) = self.nodes.get(key) else {
            return;
        };
        for child in node.children.clone() {
            if let Some(c) = self.nodes.get_mut(child) {
                f(&mut *c);
            }
        }
        if let Some(node) = self.nodes.get_mut(key) {
            f(node);
        }
    }

    /// Apply `f` over the full subtree, depth-first post-order, self last
    ///
    /// The frame loop's traversal: every node is visited exactly once, and a
    /// node is visited only after all of its descendants. `f` must not
    /// mutate the tree shape being iterated.
    pub fn for_each_subtree(&mut self, key: NodeKey, mut f: impl FnMut(&mut Node)) {
        for k in self.collect_subtree(key) {
            if let Some(node) = self.nodes.get_mut(k) {
                f(node);
            }
        }
    }

    // ------------------------------------------------------------------
    // Lifecycle hooks
    // ------------------------------------------------------------------

    fn invoke(&mut self, key: NodeKey, f: impl FnOnce(&mut dyn NodeBehavior, &mut Node)) {
        let Some(node) = self.nodes.get_mut(key) else {
            return;
        };
        if let Some(mut behavior) = node.behavior.take() {
            f(behavior.as_mut(), node);
            if node.behavior.is_none() {
                node.behavior = Some(behavior);
            }
        }
    }

    pub(crate) fn fire_awake(&mut self, key: NodeKey) {
        self.invoke(key, |behavior, node| behavior.on_awake(node));
    }

    pub(crate) fn fire_start(&mut self, key: NodeKey) {
        self.invoke(key, |behavior, node| behavior.on_start(node));
    }

    /// Fire the per-frame update hook over the full subtree, post-order
    pub fn update_subtree(&mut self, key: NodeKey, delta: f32) {
        for k in self.collect_subtree(key) {
            self.invoke(k, |behavior, node| behavior.on_update(node, delta));
        }
    }

    // ------------------------------------------------------------------
    // Global transform queries
    // ------------------------------------------------------------------

    /// Composed transform: parent's global matrix times the local matrix
    pub fn global_matrix(&self, key: NodeKey) -> Mat4 {
        match self.nodes.get(key) {
            None => Mat4::identity(),
            Some(node) => {
                let local = node.local.to_matrix();
                match node.parent {
                    Some(parent) => self.global_matrix(parent) * local,
                    None => local,
                }
            }
        }
    }

    /// Translation column of the global matrix
    pub fn global_position(&self, key: NodeKey) -> Vec3 {
        let m = self.global_matrix(key);
        Vec3::new(m[(0, 3)], m[(1, 3)], m[(2, 3)])
    }

    /// Composed rotation: parent's global rotation times the local rotation
    pub fn global_rotation(&self, key: NodeKey) -> Quat {
        match self.nodes.get(key) {
            None => Quat::identity(),
            Some(node) => match node.parent {
                Some(parent) => self.global_rotation(parent) * node.local.rotation,
                None => node.local.rotation,
            },
        }
    }

    /// Per-axis lengths of the global matrix's basis columns
    pub fn global_scale(&self, key: NodeKey) -> Vec3 {
        let m = self.global_matrix(key);
        Vec3::new(
            Vec3::new(m[(0, 0)], m[(1, 0)], m[(2, 0)]).norm(),
            Vec3::new(m[(0, 1)], m[(1, 1)], m[(2, 1)]).norm(),
            Vec3::new(m[(0, 2)], m[(1, 2)], m[(2, 2)]).norm(),
        )
    }

    /// Unit vector the node faces (global -Z)
    pub fn forward(&self, key: NodeKey) -> Vec3 {
        (self.global_rotation(key) * Vec3::new(0.0, 0.0, -1.0)).normalize()
    }

    /// Global up unit vector
    pub fn up(&self, key: NodeKey) -> Vec3 {
        (self.global_rotation(key) * Vec3::new(0.0, 1.0, 0.0)).normalize()
    }

    /// Global right unit vector
    pub fn right(&self, key: NodeKey) -> Vec3 {
        (self.global_rotation(key) * Vec3::new(1.0, 0.0, 0.0)).normalize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Transform;
    use crate::render::backend::RenderBackend;
    use crate::render::manager::RenderManager;
    use crate::render::mesh::Mesh;
    use crate::render::shader::{DrawObject, ShaderBinding, ShaderIdentity};
    use crate::scene::camera::CameraView;
    use crate::scene::node::NodeBehavior;
    use approx::assert_relative_eq;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};

    struct StubShader {
        identity: ShaderIdentity,
    }

    impl StubShader {
        fn new(manager: &mut RenderManager, name: &str) -> Arc<Self> {
            Arc::new(Self {
                identity: manager.register_shader("shaders/stub", name),
            })
        }
    }

    impl ShaderBinding for StubShader {
        fn identity(&self) -> &ShaderIdentity {
            &self.identity
        }

        fn draw(
            &self,
            backend: &mut dyn RenderBackend,
            _object: Option<&DrawObject>,
            _camera: &CameraView,
        ) {
            backend.draw_triangles(0);
        }
    }

    fn renderable(graph: &mut SceneGraph, name: &str) -> NodeKey {
        let mut manager = RenderManager::new();
        let shader = StubShader::new(&mut manager, name);
        graph.insert(Node::renderable(name, shader, Mesh::empty(), false))
    }

    #[test]
    fn test_add_child_links_both_directions() {
        let mut graph = SceneGraph::new();
        let root = graph.insert(Node::group("root"));
        let child = graph.insert(Node::group("child"));

        graph.add_child(root, child);
        assert_eq!(graph.node(root).unwrap().children(), &[child]);
        assert_eq!(graph.node(child).unwrap().parent(), Some(root));
    }

    #[test]
    fn test_detach_then_re_add_keeps_id_and_registers_once() {
        let mut graph = SceneGraph::new();
        let root = graph.insert(Node::group("root"));
        let child = renderable(&mut graph, "child");
        let id = graph.node(child).unwrap().id();

        graph.add_child(root, child);
        assert_eq!(graph.renderables().len(), 1);

        let detached = graph.detach_child(root, id).unwrap();
        assert_eq!(detached, child);
        assert!(graph.renderables().is_empty());
        assert!(graph.node(child).unwrap().parent().is_none());

        graph.add_child(root, detached);
        assert_eq!(graph.node(child).unwrap().id(), id);
        assert_eq!(graph.renderables(), &[child]);
    }

    #[test]
    fn test_detach_missing_id_is_silent_noop() {
        let mut graph = SceneGraph::new();
        let root = graph.insert(Node::group("root"));
        let child = graph.insert(Node::group("child"));
        graph.add_child(root, child);

        let stray = Node::group("stray");
        assert!(graph.detach_child(root, stray.id()).is_none());
        assert_eq!(graph.node(root).unwrap().children(), &[child]);
    }

    #[test]
    fn test_detaching_subtree_unregisters_all_renderables() {
        let mut graph = SceneGraph::new();
        let root = graph.insert(Node::group("root"));
        let branch = graph.insert(Node::group("branch"));
        let a = renderable(&mut graph, "a");
        let b = renderable(&mut graph, "b");
        let c = renderable(&mut graph, "c");

        graph.add_child(root, branch);
        graph.add_child(branch, a);
        graph.add_child(a, b);
        graph.add_child(branch, c);
        assert_eq!(graph.renderables().len(), 3);

        let branch_id = graph.node(branch).unwrap().id();
        graph.detach_child(root, branch_id);

        assert!(graph.renderables().is_empty());
        for key in [a, b, c] {
            let id = graph.node(key).unwrap().id();
            assert!(!graph
                .renderables()
                .iter()
                .any(|k| graph.node(*k).is_some_and(|n| n.id() == id)));
        }
    }

    #[test]
    fn test_attaching_assembled_subtree_registers_all_renderables() {
        let mut graph = SceneGraph::new();
        let root = graph.insert(Node::group("root"));
        let branch = graph.insert(Node::group("branch"));
        let a = renderable(&mut graph, "a");
        let b = renderable(&mut graph, "b");

        // assemble offline, attach once
        graph.add_child(branch, a);
        graph.add_child(branch, b);
        graph.detach_child(root, graph.node(branch).unwrap().id()); // not attached; no-op
        let before = graph.renderables().len();
        assert_eq!(before, 2);

        let branch_id = graph.node(branch).unwrap().id();
        graph.add_child(root, branch);
        // still exactly one entry per renderable
        assert_eq!(graph.renderables().len(), 2);

        graph.detach_child(root, branch_id);
        assert!(graph.renderables().is_empty());
        graph.add_child(root, branch);
        assert_eq!(graph.renderables().len(), 2);
    }

    #[test]
    fn test_delete_all_children_destroys_subtrees() {
        let mut graph = SceneGraph::new();
        let root = graph.insert(Node::group("root"));
        let a = graph.insert(Node::group("a"));
        let b = renderable(&mut graph, "b");
        graph.add_child(root, a);
        graph.add_child(a, b);

        graph.delete_all_children(root);
        assert!(graph.node(a).is_none());
        assert!(graph.node(b).is_none());
        assert!(graph.node(root).is_some());
        assert!(graph.renderables().is_empty());
    }

    #[test]
    fn test_unregister_missing_renderable_leaves_list_unchanged() {
        let mut graph = SceneGraph::new();
        let root = graph.insert(Node::group("root"));
        let a = renderable(&mut graph, "a");
        graph.add_child(root, a);
        let before: Vec<NodeKey> = graph.renderables().to_vec();

        let stray = Node::group("stray");
        graph.unregister_renderable(stray.id());
        assert_eq!(graph.renderables(), before.as_slice());
    }

    #[test]
    fn test_subtree_traversal_is_post_order_and_idempotent() {
        let mut graph = SceneGraph::new();
        let root = graph.insert(Node::group("root"));
        let left = graph.insert(Node::group("left"));
        let leaf = graph.insert(Node::group("leaf"));
        let right = graph.insert(Node::group("right"));
        graph.add_child(root, left);
        graph.add_child(left, leaf);
        graph.add_child(root, right);

        let mut first = Vec::new();
        graph.for_each_subtree(root, |node| first.push(node.name.clone()));
        assert_eq!(first, ["leaf", "left", "right", "root"]);

        let mut second = Vec::new();
        graph.for_each_subtree(root, |node| second.push(node.name.clone()));
        assert_eq!(first, second);
    }

    #[test]
    fn test_descendant_traversal_excludes_self() {
        let mut graph = SceneGraph::new();
        let root = graph.insert(Node::group("root"));
        let a = graph.insert(Node::group("a"));
        let b = graph.insert(Node::group("b"));
        graph.add_child(root, a);
        graph.add_child(a, b);

        let mut visited = Vec::new();
        graph.for_each_descendant(root, |node| visited.push(node.name.clone()));
        assert_eq!(visited, ["b", "a"]);

        let mut children_only = Vec::new();
        graph.for_each_child(root, |node| children_only.push(node.name.clone()));
        assert_eq!(children_only, ["a"]);

        let mut child_and_self = Vec::new();
        graph.for_each_child_and_self(root, |node| child_and_self.push(node.name.clone()));
        assert_eq!(child_and_self, ["a", "root"]);
    }

    #[test]
    fn test_update_runs_descendants_before_owner() {
        struct Recorder {
            order: Arc<Mutex<Vec<String>>>,
        }
        impl NodeBehavior for Recorder {
            fn on_update(&mut self, node: &mut Node, _delta: f32) {
                self.order.lock().unwrap().push(node.name.clone());
            }
        }

        let order = Arc::new(Mutex::new(Vec::new()));
        let mut graph = SceneGraph::new();
        let root = graph.insert(Node::group("root").with_behavior(Box::new(Recorder {
            order: Arc::clone(&order),
        })));
        let child = graph.insert(Node::group("child").with_behavior(Box::new(Recorder {
            order: Arc::clone(&order),
        })));
        graph.add_child(root, child);

        graph.update_subtree(root, 0.016);
        assert_eq!(*order.lock().unwrap(), ["child", "root"]);
    }

    #[test]
    fn test_awake_fires_on_registration_start_on_attach() {
        static AWAKES: AtomicU32 = AtomicU32::new(0);
        static STARTS: AtomicU32 = AtomicU32::new(0);

        struct Counting;
        impl NodeBehavior for Counting {
            fn on_awake(&mut self, _node: &mut Node) {
                AWAKES.fetch_add(1, Ordering::SeqCst);
            }
            fn on_start(&mut self, _node: &mut Node) {
                STARTS.fetch_add(1, Ordering::SeqCst);
            }
        }

        let mut graph = SceneGraph::new();
        let mut manager = RenderManager::new();
        let shader = StubShader::new(&mut manager, "counting");
        let root = graph.insert(Node::group("root"));
        let node = graph.insert(
            Node::renderable("n", shader, Mesh::empty(), false)
                .with_behavior(Box::new(Counting)),
        );

        graph.add_child(root, node);
        assert_eq!(AWAKES.load(Ordering::SeqCst), 1);
        assert_eq!(STARTS.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_global_position_composes_chain_of_locals() {
        let mut graph = SceneGraph::new();
        let mut keys = Vec::new();
        let mut expected = Mat4::identity();

        for level in 0u8..5 {
            let local = Transform {
                position: Vec3::new(1.0, f32::from(level), 0.0),
                rotation: Quat::from_axis_angle(&Vec3::y_axis(), 0.3 * f32::from(level)),
                scale: Vec3::new(1.0, 1.0 + 0.1 * f32::from(level), 1.0),
            };
            expected *= local.to_matrix();
            let key = graph.insert(Node::group(format!("n{level}")).with_transform(local));
            if let Some(&parent) = keys.last() {
                graph.add_child(parent, key);
            }
            keys.push(key);
        }

        let leaf = *keys.last().unwrap();
        let got = graph.global_matrix(leaf);
        assert_relative_eq!(got, expected, epsilon = 1e-5);

        let pos = graph.global_position(leaf);
        assert_relative_eq!(pos.x, expected[(0, 3)], epsilon = 1e-5);
        assert_relative_eq!(pos.y, expected[(1, 3)], epsilon = 1e-5);
        assert_relative_eq!(pos.z, expected[(2, 3)], epsilon = 1e-5);
    }

    #[test]
    fn test_basis_vectors_follow_global_rotation() {
        let mut graph = SceneGraph::new();
        let root = graph.insert(Node::group("root").with_transform(Transform {
            rotation: Quat::from_axis_angle(&Vec3::y_axis(), std::f32::consts::FRAC_PI_2),
            ..Default::default()
        }));
        let child = graph.insert(Node::group("child"));
        graph.add_child(root, child);

        // yaw of +90 degrees turns -Z into -X
        let forward = graph.forward(child);
        assert_relative_eq!(forward.x, -1.0, epsilon = 1e-6);
        assert_relative_eq!(forward.z, 0.0, epsilon = 1e-6);
        let up = graph.up(child);
        assert_relative_eq!(up.y, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_detach_from_parent_and_delete_node() {
        let mut graph = SceneGraph::new();
        let root = graph.insert(Node::group("root"));
        let a = renderable(&mut graph, "a");
        graph.add_child(root, a);

        graph.detach_from_parent(a);
        assert!(graph.node(root).unwrap().children().is_empty());
        assert!(graph.renderables().is_empty());
        assert!(graph.node(a).is_some());

        graph.add_child(root, a);
        graph.delete_node(a);
        assert!(graph.node(a).is_none());
        assert!(graph.renderables().is_empty());
        assert!(graph.node(root).unwrap().children().is_empty());
    }
}
