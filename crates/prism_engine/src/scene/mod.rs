//! Scene layer: the node arena, spatial node types, and camera state

pub mod camera;
pub mod graph;
pub mod node;

pub use camera::{CameraView, Lens};
pub use graph::SceneGraph;
pub use node::{Node, NodeBehavior, NodeId, NodeKey, NodeKind, Renderable, UiWidget};
