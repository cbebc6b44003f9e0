//! Headless sandbox scene
//!
//! Drives the engine for a fixed number of frames against the recording
//! backend: a spinning opaque triangle, a translucent pane behind it, and a
//! frame counter widget.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use prism_engine::prelude::*;
use prism_engine::render::backend::{AttributeType, VertexLayout};
use prism_engine::render::shader::ATTRIB_POSITION;

const FRAMES: u32 = 240;

/// Flat-color shader: uploads the camera and model matrices, streams the
/// mesh, and submits one triangle draw.
struct ColorShader {
    core: ShaderCore,
}

impl ColorShader {
    fn new(engine: &mut Engine, name: &str) -> Arc<Self> {
        let mut core = ShaderCore::register(engine.render_manager_mut(), "shaders/color", name);
        core.add_uniform(engine.backend(), "viewProjection");
        core.add_uniform(engine.backend(), "model");
        Arc::new(Self { core })
    }
}

impl ShaderBinding for ColorShader {
    fn identity(&self) -> &ShaderIdentity {
        self.core.identity()
    }

    fn draw(
        &self,
        backend: &mut dyn RenderBackend,
        object: Option<&DrawObject>,
        camera: &CameraView,
    ) {
        let Some(object) = object else {
            return;
        };
        if let Some(location) = self.core.uniform("viewProjection") {
            backend.set_uniform_mat4(location, &camera.view_projection());
        }
        if let Some(location) = self.core.uniform("model") {
            backend.set_uniform_mat4(location, &object.model);
        }

        let buffer = backend.create_buffer(object.mesh.as_bytes());
        let layout = VertexLayout {
            components: 3,
            ty: AttributeType::F32,
            normalized: false,
            stride: std::mem::size_of::<Vertex>() as u32,
        };
        self.core
            .bind_vertex_data(backend, ATTRIB_POSITION, buffer, layout);
        backend.draw_triangles(object.mesh.vertex_count());
    }
}

/// Spins its node around the Y axis at a fixed angular speed
struct Spinner {
    radians_per_second: f32,
}

impl NodeBehavior for Spinner {
    fn on_update(&mut self, node: &mut Node, delta: f32) {
        let spin = Quat::from_axis_angle(&Vec3::y_axis(), self.radians_per_second * delta);
        node.local.rotation = spin * node.local.rotation;
    }
}

/// Counts how many times the debug-UI pass ran
struct FrameCounter {
    frames: AtomicU32,
}

impl UiWidget for FrameCounter {
    fn draw_ui(&self) {
        self.frames.fetch_add(1, Ordering::Relaxed);
    }
}

fn main() -> Result<(), EngineError> {
    env_logger::init();

    let config = EngineConfig {
        clear_color: [0.05, 0.05, 0.08, 1.0],
        show_grid: true,
        show_debug_ui: true,
        window_title: "prism sandbox".to_string(),
    };
    let mut engine = Engine::new(&config, Box::new(NullBackend::new()));

    let root = engine.scene_mut().insert(Node::group("root"));
    engine.set_scene(root);

    let camera = engine.scene_mut().insert(
        Node::camera("camera", Lens::perspective(60.0, 16.0 / 9.0, 0.1, 100.0)).with_transform(
            Transform::from_position(Vec3::new(0.0, 1.0, 5.0)),
        ),
    );
    engine.scene_mut().add_child(root, camera);
    engine.set_camera(Some(camera));

    let opaque_shader = ColorShader::new(&mut engine, "color_opaque");
    let translucent_shader = ColorShader::new(&mut engine, "color_translucent");

    let spinner = engine.scene_mut().insert(
        Node::renderable("spinner", opaque_shader, Mesh::triangle(), false)
            .with_behavior(Box::new(Spinner {
                radians_per_second: std::f32::consts::PI,
            })),
    );
    engine.scene_mut().add_child(root, spinner);

    let pane = engine.scene_mut().insert(
        Node::renderable("pane", translucent_shader, Mesh::triangle(), true).with_transform(
            Transform::from_position(Vec3::new(0.0, 0.0, -3.0)),
        ),
    );
    engine.scene_mut().add_child(root, pane);

    let counter = Arc::new(FrameCounter {
        frames: AtomicU32::new(0),
    });
    engine.add_debug_ui(counter.clone());

    engine.start()?;
    log::info!("running {FRAMES} frames headless");

    for _ in 0..FRAMES {
        engine.set_delta_time();
        engine.update();
        engine.draw();
    }

    log::info!(
        "done: {} ui passes, last fps reading {}",
        counter.frames.load(Ordering::Relaxed),
        engine.fps()
    );
    Ok(())
}
