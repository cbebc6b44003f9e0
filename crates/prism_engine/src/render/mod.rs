//! Rendering layer: backend capability surface, shader registry, and the
//! shader binding contract renderables draw through

pub mod backend;
pub mod grid;
pub mod manager;
pub mod mesh;
pub mod shader;

pub use backend::{
    AttributeType, BlendFactor, BufferHandle, ClearMask, DepthCompare, NullBackend, RenderBackend,
    TextureHandle, UniformError, UniformLocation, VertexLayout,
};
pub use grid::GridShader;
pub use manager::RenderManager;
pub use mesh::{Mesh, Vertex};
pub use shader::{
    DrawObject, ProgramHandle, ShaderBinding, ShaderCore, ShaderIdentity, UniformBlock,
};
