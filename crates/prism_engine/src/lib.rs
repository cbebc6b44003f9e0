//! # Prism Engine
//!
//! A frame-orchestration core for real-time 3D rendering: a scene graph of
//! spatial nodes, a per-frame update and draw pipeline, and a two-phase
//! opaque/translucent draw order.
//!
//! The graphics API is injected behind [`render::RenderBackend`]; the crate
//! ships [`render::NullBackend`] for tests and headless runs.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use prism_engine::prelude::*;
//!
//! fn main() -> Result<(), EngineError> {
//!     let config = EngineConfig::default();
//!     let mut engine = Engine::new(&config, Box::new(NullBackend::new()));
//!
//!     let root = engine.scene_mut().insert(Node::group("root"));
//!     engine.set_scene(root);
//!     let camera = engine.scene_mut().insert(Node::camera("cam", Lens::default()));
//!     engine.scene_mut().add_child(root, camera);
//!     engine.set_camera(Some(camera));
//!
//!     engine.start()?;
//!     loop {
//!         engine.set_delta_time();
//!         engine.update();
//!         engine.draw();
//!         # break;
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod config;
pub mod foundation;
pub mod render;
pub mod scene;

mod engine;

pub use config::{Config, ConfigError, EngineConfig};
pub use engine::{Engine, EngineError};

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        config::{Config, ConfigError, EngineConfig},
        foundation::{
            math::{Mat4, Quat, Transform, Vec3},
            time::FrameClock,
        },
        render::{
            DrawObject, Mesh, NullBackend, ProgramHandle, RenderBackend, RenderManager,
            ShaderBinding, ShaderCore, ShaderIdentity, Vertex,
        },
        scene::{CameraView, Lens, Node, NodeBehavior, NodeId, NodeKey, SceneGraph, UiWidget},
        Engine, EngineError,
    };
}
