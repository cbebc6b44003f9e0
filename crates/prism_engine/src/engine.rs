//! Frame orchestrator
//!
//! Owns the scene, the active camera, the render backend, and the frame
//! clock. The application loop drives three calls per frame: sample the
//! clock, run the behavior update pass, then sort and draw.

use std::cmp::Ordering;
use std::sync::Arc;

use crate::config::{Config, ConfigError, EngineConfig};
use crate::foundation::math::{Mat4, Vec3};
use crate::foundation::time::FrameClock;
use crate::render::backend::{BlendFactor, ClearMask, DepthCompare, RenderBackend};
use crate::render::grid::GridShader;
use crate::render::manager::RenderManager;
use crate::render::shader::ShaderBinding;
use crate::render::shader::{DrawObject, ProgramHandle};
use crate::scene::camera::CameraView;
use crate::scene::graph::SceneGraph;
use crate::scene::node::{Node, NodeId, NodeKey, UiWidget};

/// Errors surfaced by the frame orchestrator
#[derive(thiserror::Error, Debug)]
pub enum EngineError {
    /// `start` was called with no scene root set
    #[error("cannot start: no scene root set")]
    NoScene,

    /// Configuration loading failed
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Draw-order key extracted per renderable before sorting
///
/// Extraction decouples the comparator from the node arena; a parallel sort
/// over these entries would be a drop-in change.
struct SortEntry {
    key: NodeKey,
    translucent: bool,
    program: ProgramHandle,
    distance: f32,
}

fn draw_order(a: &SortEntry, b: &SortEntry) -> Ordering {
    match (a.translucent, b.translucent) {
        // all opaque draws precede all translucent draws
        (false, true) => Ordering::Less,
        (true, false) => Ordering::Greater,
        // opaque: group by program to minimise pipeline switches
        (false, false) => a.program.cmp(&b.program),
        // translucent: farthest from the camera first
        (true, true) => b
            .distance
            .partial_cmp(&a.distance)
            .unwrap_or(Ordering::Equal),
    }
}

/// The engine core: scene ownership, frame timing, and the draw pipeline
pub struct Engine {
    scene: SceneGraph,
    root: Option<NodeKey>,
    camera: Option<NodeKey>,
    backend: Box<dyn RenderBackend>,
    manager: RenderManager,
    grid: GridShader,
    debug_ui: Vec<Arc<dyn UiWidget>>,
    clock: FrameClock,
    clear_color: [f32; 4],
    show_grid: bool,
    show_debug_ui: bool,
}

impl Engine {
    /// Create an engine over an injected backend
    pub fn new(config: &EngineConfig, backend: Box<dyn RenderBackend>) -> Self {
        let mut manager = RenderManager::new();
        let grid = GridShader::new(&mut manager, backend.as_ref());
        Self {
            scene: SceneGraph::new(),
            root: None,
            camera: None,
            backend,
            manager,
            grid,
            debug_ui: Vec::new(),
            clock: FrameClock::new(),
            clear_color: config.clear_color,
            show_grid: config.show_grid,
            show_debug_ui: config.show_debug_ui,
        }
    }

    /// Create an engine from a configuration file
    pub fn from_config_file(
        path: &str,
        backend: Box<dyn RenderBackend>,
    ) -> Result<Self, EngineError> {
        let config = EngineConfig::load_from_file(path)?;
        Ok(Self::new(&config, backend))
    }

    /// One-time startup: fixed pipeline state, clock reset, root start hook
    ///
    /// Refuses to start without a scene root, leaving the backend untouched.
    pub fn start(&mut self) -> Result<(), EngineError> {
        let Some(root) = self.root else {
            return Err(EngineError::NoScene);
        };

        self.backend.enable_depth_test(DepthCompare::Less);
        self.backend
            .enable_blend(BlendFactor::SrcAlpha, BlendFactor::OneMinusSrcAlpha);
        self.backend.set_clear_color(self.clear_color);
        self.clock.restart();
        self.scene.fire_start(root);
        log::info!("engine started");
        Ok(())
    }

    /// Sample the frame clock; call once at the top of each loop iteration
    pub fn set_delta_time(&mut self) {
        self.clock.tick();
    }

    /// Seconds elapsed between the last two clock samples
    pub fn delta_time(&self) -> f32 {
        self.clock.delta_seconds()
    }

    /// Frames counted in the last completed one-second window
    pub fn fps(&self) -> u32 {
        self.clock.fps()
    }

    /// Behavior update pass over the whole scene, descendants before owners
    pub fn update(&mut self) {
        let Some(root) = self.root else {
            return;
        };
        let delta = self.clock.delta_seconds();
        self.scene.update_subtree(root, delta);
    }

    /// Sort and draw the frame
    ///
    /// Skips the frame entirely (no clear) when no scene root is set or the
    /// active camera is missing.
    pub fn draw(&mut self) {
        if self.root.is_none() {
            return;
        }
        let Some(camera) = self.camera_view() else {
            log::warn!("no active camera; skipping frame");
            return;
        };

        // reserved sync point: parallel list reconciliation or culling
        // would be joined here before sorting
        self.depth_sort(camera.position);

        self.backend.clear(ClearMask::COLOR | ClearMask::DEPTH);

        let scene = &self.scene;
        let backend = self.backend.as_mut();

        // opaque pass: the sorted list fronts all opaque entries, so the
        // first translucent entry ends the pass
        let ordered: Vec<NodeKey> = scene.renderables().to_vec();
        for &key in &ordered {
            match scene.node(key).and_then(Node::as_renderable) {
                Some(renderable) if renderable.translucent => break,
                Some(_) => Self::draw_node(scene, backend, &camera, key),
                None => {}
            }
        }

        // reserved sync point: any parallel sorting work would be awaited
        // here before translucent compositing starts

        // translucent pass: back to front over the sorted tail
        for &key in &ordered {
            if let Some(renderable) = scene.node(key).and_then(Node::as_renderable) {
                if renderable.translucent {
                    Self::draw_node(scene, backend, &camera, key);
                }
            }
        }

        if !self.show_debug_ui {
            return;
        }
        if self.show_grid {
            self.grid.draw(backend, None, &camera);
        }
        for widget in &self.debug_ui {
            widget.draw_ui();
        }
    }

    fn draw_node(
        scene: &SceneGraph,
        backend: &mut dyn RenderBackend,
        camera: &CameraView,
        key: NodeKey,
    ) {
        let Some(node) = scene.node(key) else {
            return;
        };
        let Some(renderable) = node.as_renderable() else {
            return;
        };
        let object = DrawObject {
            model: scene.global_matrix(key),
            mesh: &renderable.mesh,
        };
        renderable.shader.draw(backend, Some(&object), camera);
        if let Some(ui) = &node.ui {
            ui.draw_ui();
        }
    }

    /// Reorder the flat renderable list into draw order
    ///
    /// Opaque entries first, grouped by ascending program handle; translucent
    /// entries after, by descending distance to `camera_position`. The sort
    /// is stable, so ties keep their registration order.
    pub fn depth_sort(&mut self, camera_position: Vec3) {
        let mut entries: Vec<SortEntry> = self
            .scene
            .renderables()
            .iter()
            .filter_map(|&key| {
                let node = self.scene.node(key)?;
                let renderable = node.as_renderable()?;
                Some(SortEntry {
                    key,
                    translucent: renderable.translucent,
                    program: renderable.shader.identity().program,
                    distance: (self.scene.global_position(key) - camera_position).norm(),
                })
            })
            .collect();

        entries.sort_by(draw_order);
        self.scene
            .set_renderables(entries.into_iter().map(|e| e.key).collect());
    }

    fn camera_view(&self) -> Option<CameraView> {
        let key = self.camera?;
        let lens = self.scene.node(key).and_then(Node::as_camera)?.clone();
        let global = self.scene.global_matrix(key);
        let view = global.try_inverse().unwrap_or_else(Mat4::identity);
        Some(CameraView {
            position: self.scene.global_position(key),
            view,
            projection: lens.projection_matrix(),
        })
    }

    // ------------------------------------------------------------------
    // Scene management
    // ------------------------------------------------------------------

    /// Replace the scene root, destroying the previous root's children
    ///
    /// The previous root node itself stays in the arena; its subtree and
    /// every renderable in it are destroyed.
    pub fn set_scene(&mut self, root: NodeKey) {
        if let Some(old) = self.root {
            if old != root {
                self.scene.delete_all_children(old);
            }
        }
        self.root = Some(root);
    }

    /// Current scene root
    pub fn scene_root(&self) -> Option<NodeKey> {
        self.root
    }

    /// Select the camera node used for the next frames, or `None` to blank
    pub fn set_camera(&mut self, camera: Option<NodeKey>) {
        self.camera = camera;
    }

    /// Shared access to the node arena
    pub fn scene(&self) -> &SceneGraph {
        &self.scene
    }

    /// Mutable access to the node arena
    pub fn scene_mut(&mut self) -> &mut SceneGraph {
        &mut self.scene
    }

    /// Register a node's renderable state for drawing
    pub fn add_renderable(&mut self, key: NodeKey) {
        self.scene.register_renderable(key);
    }

    /// Remove a node's renderable state from drawing by unique id
    pub fn remove_renderable(&mut self, id: NodeId) {
        self.scene.unregister_renderable(id);
    }

    // ------------------------------------------------------------------
    // Debug UI and presentation toggles
    // ------------------------------------------------------------------

    /// Append a standalone debug-UI element
    pub fn add_debug_ui(&mut self, widget: Arc<dyn UiWidget>) {
        self.debug_ui.push(widget);
    }

    /// Remove the first registered element that is the same allocation
    pub fn remove_debug_ui(&mut self, widget: &Arc<dyn UiWidget>) {
        if let Some(index) = self
            .debug_ui
            .iter()
            .position(|w| Arc::ptr_eq(w, widget))
        {
            self.debug_ui.remove(index);
        }
    }

    /// Whether debug-UI elements are drawn
    pub fn is_debug_ui_visible(&self) -> bool {
        self.show_debug_ui
    }

    /// Toggle drawing of debug-UI elements
    pub fn set_debug_ui_visibility(&mut self, visible: bool) {
        self.show_debug_ui = visible;
    }

    /// Whether the ground-plane grid overlay is drawn
    pub fn is_grid_visible(&self) -> bool {
        self.show_grid
    }

    /// Toggle the ground-plane grid overlay
    pub fn set_grid_visibility(&mut self, visible: bool) {
        self.show_grid = visible;
    }

    /// Change the clear color, applying it to the backend immediately
    pub fn set_clear_color(&mut self, color: [f32; 4]) {
        self.clear_color = color;
        self.backend.set_clear_color(color);
    }

    /// The injected render backend
    pub fn backend(&self) -> &dyn RenderBackend {
        self.backend.as_ref()
    }

    /// Mutable access to the shader registry
    pub fn render_manager_mut(&mut self) -> &mut RenderManager {
        &mut self.manager
    }
}
