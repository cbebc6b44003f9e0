//! Backend abstraction for the rendering system
//!
//! The engine core treats the graphics API as an opaque capability surface
//! reached through this trait. Concrete GPU backends live outside the core;
//! [`NullBackend`] is the injectable stand-in used by tests and headless runs.

use std::any::Any;
use std::collections::{HashMap, HashSet};

use bitflags::bitflags;

use crate::foundation::math::Mat4;
use crate::render::shader::ProgramHandle;

bitflags! {
    /// Which buffers a [`RenderBackend::clear`] call wipes
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ClearMask: u32 {
        /// Color buffer
        const COLOR = 1;
        /// Depth buffer
        const DEPTH = 1 << 1;
    }
}

/// Depth comparison function
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepthCompare {
    /// Nearer fragment wins
    Less,
    /// Nearer-or-equal fragment wins
    LessEqual,
    /// Depth test always passes
    Always,
}

/// Blend factor for source or destination color
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendFactor {
    /// Multiply by source alpha
    SrcAlpha,
    /// Multiply by one minus source alpha
    OneMinusSrcAlpha,
    /// Multiply by one
    One,
    /// Multiply by zero
    Zero,
}

/// Handle to a GPU-resident data buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferHandle(pub u32);

/// Handle to a GPU-resident texture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u32);

/// Resolved uniform location within a program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UniformLocation(pub i32);

/// Why a uniform lookup produced no location
///
/// The two conditions are distinct so callers can report them distinctly;
/// both are non-fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniformError {
    /// The program linked but carries no uniform under that name
    Missing,
    /// The program failed to link, so no uniform can be resolved
    LinkFailed,
}

/// Element type of a vertex attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeType {
    /// 32-bit float components
    F32,
    /// Unsigned byte components
    U8,
}

/// Layout of one vertex attribute within a bound buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexLayout {
    /// Components per element (e.g. 3 for a position)
    pub components: u32,
    /// Element type
    pub ty: AttributeType,
    /// Whether integer data is normalized to [0, 1]
    pub normalized: bool,
    /// Byte stride between consecutive elements
    pub stride: u32,
}

/// Capability surface the engine core draws through
///
/// Lookup methods take `&self`; everything that changes GPU state takes
/// `&mut self`.
pub trait RenderBackend {
    /// Enable depth testing with the given comparison
    fn enable_depth_test(&mut self, compare: DepthCompare);

    /// Enable alpha blending with the given factors
    fn enable_blend(&mut self, src: BlendFactor, dst: BlendFactor);

    /// Set the color the color buffer clears to
    fn set_clear_color(&mut self, color: [f32; 4]);

    /// Clear the selected buffers
    fn clear(&mut self, mask: ClearMask);

    /// Resolve a uniform location within a program
    fn uniform_location(
        &self,
        program: ProgramHandle,
        name: &str,
    ) -> Result<UniformLocation, UniformError>;

    /// Resolve a shared-data block index within a program
    fn uniform_block_index(&self, program: ProgramHandle, name: &str) -> Option<u32>;

    /// Assign a block index of a program to a binding point
    fn bind_uniform_block(&mut self, program: ProgramHandle, block_index: u32, binding_point: u32);

    /// Upload raw data and return a buffer handle
    fn create_buffer(&mut self, data: &[u8]) -> BufferHandle;

    /// Enable a vertex attribute slot
    fn enable_vertex_attribute(&mut self, slot: u32);

    /// Bind a buffer as the active vertex data source
    fn bind_buffer(&mut self, buffer: BufferHandle);

    /// Describe the layout of an enabled attribute slot
    fn vertex_attribute_layout(&mut self, slot: u32, layout: VertexLayout);

    /// Activate a texture unit
    fn active_texture(&mut self, unit: u32);

    /// Bind a texture to the active unit
    fn bind_texture(&mut self, texture: TextureHandle);

    /// Set an integer uniform (sampler bindings)
    fn set_uniform_i32(&mut self, location: UniformLocation, value: i32);

    /// Set a matrix uniform
    fn set_uniform_mat4(&mut self, location: UniformLocation, value: &Mat4);

    /// Submit a triangle draw over the bound vertex state
    fn draw_triangles(&mut self, vertex_count: u32);

    /// Downcast support for tests and backend-specific tooling
    fn as_any(&self) -> &dyn Any;
}

/// Recording no-op backend
///
/// Resolves any uniform or block name unless told otherwise, counts calls,
/// and never touches a GPU. Inject it to run the engine headless.
#[derive(Default)]
pub struct NullBackend {
    /// Depth/blend/clear-color setup calls observed
    pub state_changes: u32,
    /// Buffer clears observed
    pub clear_calls: u32,
    /// Draw submissions observed
    pub draw_calls: u32,
    /// Uniform uploads observed
    pub uniform_uploads: u32,
    /// Block binding-point assignments observed
    pub block_binds: u32,
    /// Last clear color set
    pub clear_color: [f32; 4],
    missing_uniforms: HashSet<String>,
    failed_programs: HashSet<ProgramHandle>,
    missing_blocks: HashSet<String>,
    block_indices: HashMap<String, u32>,
    next_buffer: u32,
    next_location: std::cell::Cell<i32>,
    locations: std::cell::RefCell<HashMap<(ProgramHandle, String), UniformLocation>>,
}

impl NullBackend {
    /// Create a fresh recording backend
    pub fn new() -> Self {
        Self::default()
    }

    /// Make lookups of `name` report [`UniformError::Missing`]
    pub fn mark_uniform_missing(&mut self, name: &str) {
        self.missing_uniforms.insert(name.to_string());
    }

    /// Make every uniform lookup against `program` report link failure
    pub fn mark_link_failed(&mut self, program: ProgramHandle) {
        self.failed_programs.insert(program);
    }

    /// Make block-index lookups of `name` fail
    pub fn mark_block_missing(&mut self, name: &str) {
        self.missing_blocks.insert(name.to_string());
    }
}

impl RenderBackend for NullBackend {
    fn enable_depth_test(&mut self, _compare: DepthCompare) {
        self.state_changes += 1;
    }

    fn enable_blend(&mut self, _src: BlendFactor, _dst: BlendFactor) {
        self.state_changes += 1;
    }

    fn set_clear_color(&mut self, color: [f32; 4]) {
        self.clear_color = color;
        self.state_changes += 1;
    }

    fn clear(&mut self, _mask: ClearMask) {
        self.clear_calls += 1;
    }

    fn uniform_location(
        &self,
        program: ProgramHandle,
        name: &str,
    ) -> Result<UniformLocation, UniformError> {
        if self.failed_programs.contains(&program) {
            return Err(UniformError::LinkFailed);
        }
        if self.missing_uniforms.contains(name) {
            return Err(UniformError::Missing);
        }
        let key = (program, name.to_string());
        let mut locations = self.locations.borrow_mut();
        let location = *locations.entry(key).or_insert_with(|| {
            let loc = UniformLocation(self.next_location.get());
            self.next_location.set(self.next_location.get() + 1);
            loc
        });
        Ok(location)
    }

    fn uniform_block_index(&self, _program: ProgramHandle, name: &str) -> Option<u32> {
        if self.missing_blocks.contains(name) {
            return None;
        }
        Some(*self.block_indices.get(name).unwrap_or(&0))
    }

    fn bind_uniform_block(
        &mut self,
        _program: ProgramHandle,
        _block_index: u32,
        _binding_point: u32,
    ) {
        self.block_binds += 1;
    }

    fn create_buffer(&mut self, _data: &[u8]) -> BufferHandle {
        self.next_buffer += 1;
        BufferHandle(self.next_buffer)
    }

    fn enable_vertex_attribute(&mut self, _slot: u32) {}

    fn bind_buffer(&mut self, _buffer: BufferHandle) {}

    fn vertex_attribute_layout(&mut self, _slot: u32, _layout: VertexLayout) {}

    fn active_texture(&mut self, _unit: u32) {}

    fn bind_texture(&mut self, _texture: TextureHandle) {}

    fn set_uniform_i32(&mut self, _location: UniformLocation, _value: i32) {
        self.uniform_uploads += 1;
    }

    fn set_uniform_mat4(&mut self, _location: UniformLocation, _value: &Mat4) {
        self.uniform_uploads += 1;
    }

    fn draw_triangles(&mut self, _vertex_count: u32) {
        self.draw_calls += 1;
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_stable_per_name() {
        let backend = NullBackend::new();
        let program = ProgramHandle(1);
        let a = backend.uniform_location(program, "mvp").unwrap();
        let b = backend.uniform_location(program, "mvp").unwrap();
        assert_eq!(a, b);
        let c = backend.uniform_location(program, "model").unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn test_failure_modes_are_distinct() {
        let mut backend = NullBackend::new();
        backend.mark_uniform_missing("ghost");
        backend.mark_link_failed(ProgramHandle(7));

        assert_eq!(
            backend.uniform_location(ProgramHandle(1), "ghost"),
            Err(UniformError::Missing)
        );
        assert_eq!(
            backend.uniform_location(ProgramHandle(7), "anything"),
            Err(UniformError::LinkFailed)
        );
    }
}
