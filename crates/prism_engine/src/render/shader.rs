//! Shader binding contract
//!
//! Every renderable delegates its draw to a [`ShaderBinding`]. Concrete
//! bindings differ in vertex and uniform layout but share the bookkeeping in
//! [`ShaderCore`]: a program identity acquired once from the registry, a
//! uniform-name-to-location map, and the set of bound shared-data blocks.

use std::collections::HashMap;

use crate::foundation::math::Mat4;
use crate::render::backend::{
    BufferHandle, RenderBackend, TextureHandle, UniformError, UniformLocation, VertexLayout,
};
use crate::render::manager::RenderManager;
use crate::render::mesh::Mesh;
use crate::scene::camera::CameraView;

/// Vertex attribute slot for positions
pub const ATTRIB_POSITION: u32 = 0;
/// Vertex attribute slot for colors
pub const ATTRIB_COLOR: u32 = 1;
/// Vertex attribute slot for normals
pub const ATTRIB_NORMAL: u32 = 2;

/// Stable compiled-program handle
///
/// Ordering over the handle value is the grouping key for opaque draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProgramHandle(pub u32);

/// (logical name, compiled program) identity pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderIdentity {
    /// Logical shader name
    pub name: String,
    /// Compiled program handle
    pub program: ProgramHandle,
}

/// Shared-data block identity: block name and its binding point
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniformBlock {
    /// Block name as declared in the shader source
    pub name: String,
    /// Binding point the block's buffer lives at
    pub binding_point: u32,
}

/// GPU-resident bookkeeping shared by every concrete shader binding
pub struct ShaderCore {
    identity: ShaderIdentity,
    uniforms: HashMap<String, UniformLocation>,
    bound_blocks: Vec<UniformBlock>,
}

impl ShaderCore {
    /// Acquire a program identity from the registry
    pub fn register(manager: &mut RenderManager, path: &str, name: &str) -> Self {
        Self {
            identity: manager.register_shader(path, name),
            uniforms: HashMap::new(),
            bound_blocks: Vec::new(),
        }
    }

    /// The (name, program) identity pair
    pub fn identity(&self) -> &ShaderIdentity {
        &self.identity
    }

    /// Resolve and record a uniform location
    ///
    /// An absent uniform and a failed program link are both non-fatal:
    /// logged and skipped, the binding keeps its other state. Resolving a
    /// name twice does not duplicate the entry.
    pub fn add_uniform(&mut self, backend: &dyn RenderBackend, name: &str) {
        if self.uniforms.contains_key(name) {
            return;
        }
        match backend.uniform_location(self.identity.program, name) {
            Ok(location) => {
                self.uniforms.insert(name.to_string(), location);
            }
            Err(UniformError::Missing) => {
                log::error!(
                    "uniform '{name}' not found in shader '{}'",
                    self.identity.name
                );
            }
            Err(UniformError::LinkFailed) => {
                log::error!(
                    "uniform '{name}' unavailable: shader '{}' failed to link",
                    self.identity.name
                );
            }
        }
    }

    /// Resolved location of a previously added uniform
    pub fn uniform(&self, name: &str) -> Option<UniformLocation> {
        self.uniforms.get(name).copied()
    }

    /// Forget a recorded uniform
    pub fn remove_uniform(&mut self, name: &str) {
        self.uniforms.remove(name);
    }

    /// All resolved uniforms
    pub fn uniforms(&self) -> &HashMap<String, UniformLocation> {
        &self.uniforms
    }

    /// Bind a shared-data block's binding point to this program
    ///
    /// A block is bound at most once under a given name or binding point;
    /// binding again is a no-op. An unresolved block index is logged and
    /// skipped.
    pub fn bind_block(&mut self, backend: &mut dyn RenderBackend, block: UniformBlock) {
        let already_bound = self
            .bound_blocks
            .iter()
            .any(|b| b.name == block.name || b.binding_point == block.binding_point);
        if already_bound {
            return;
        }

        match backend.uniform_block_index(self.identity.program, &block.name) {
            Some(index) => {
                backend.bind_uniform_block(self.identity.program, index, block.binding_point);
                self.bound_blocks.push(block);
            }
            None => {
                log::error!(
                    "uniform block '{}' not found in shader '{}'",
                    block.name,
                    self.identity.name
                );
            }
        }
    }

    /// Forget a bound block
    pub fn unbind_block(&mut self, name: &str) {
        self.bound_blocks.retain(|b| b.name != name);
    }

    /// Blocks currently bound to this program
    pub fn bound_blocks(&self) -> &[UniformBlock] {
        &self.bound_blocks
    }

    /// Enable an attribute slot, bind its data source, and describe the layout
    pub fn bind_vertex_data(
        &self,
        backend: &mut dyn RenderBackend,
        slot: u32,
        buffer: BufferHandle,
        layout: VertexLayout,
    ) {
        backend.enable_vertex_attribute(slot);
        backend.bind_buffer(buffer);
        backend.vertex_attribute_layout(slot, layout);
    }

    /// Bind a texture to a unit and wire its sampler uniform, then bind the
    /// accompanying vertex data
    pub fn bind_texture(
        &self,
        backend: &mut dyn RenderBackend,
        unit: u32,
        texture: TextureHandle,
        sampler: UniformLocation,
        slot: u32,
        buffer: BufferHandle,
        layout: VertexLayout,
    ) {
        backend.active_texture(unit);
        backend.bind_texture(texture);
        backend.set_uniform_i32(sampler, 0);
        self.bind_vertex_data(backend, slot, buffer, layout);
    }
}

/// Geometry and transform of the renderable being drawn
pub struct DrawObject<'a> {
    /// Composed global model matrix
    pub model: Mat4,
    /// Mesh to submit
    pub mesh: &'a Mesh,
}

/// Draw entry point every concrete shader kind implements
///
/// `object` is `None` for full-screen or world-anchored effects that carry
/// no renderable (the grid overlay draws this way).
pub trait ShaderBinding {
    /// Identity used for draw-order grouping
    fn identity(&self) -> &ShaderIdentity;

    /// Emit draw commands for `object` as seen from `camera`
    fn draw(&self, backend: &mut dyn RenderBackend, object: Option<&DrawObject>, camera: &CameraView);
}
