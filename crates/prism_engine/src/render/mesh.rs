//! Vertex and mesh data handed to shader bindings at draw time

use bytemuck::{Pod, Zeroable};

/// Single vertex with position, color, and normal
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    /// Position in model space
    pub position: [f32; 3],
    /// Vertex color
    pub color: [f32; 3],
    /// Normal in model space
    pub normal: [f32; 3],
}

impl Vertex {
    /// Create a vertex with a default color and an up-facing normal
    pub fn at(x: f32, y: f32, z: f32) -> Self {
        Self {
            position: [x, y, z],
            color: [1.0, 1.0, 1.0],
            normal: [0.0, 1.0, 0.0],
        }
    }
}

/// CPU-side triangle mesh
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    /// Vertex data, three consecutive vertices per triangle
    pub vertices: Vec<Vertex>,
}

impl Mesh {
    /// Create a mesh from vertex data
    pub fn new(vertices: Vec<Vertex>) -> Self {
        Self { vertices }
    }

    /// Mesh with no geometry
    pub fn empty() -> Self {
        Self::default()
    }

    /// Unit triangle in the XY plane, handy for tests and demos
    pub fn triangle() -> Self {
        Self::new(vec![
            Vertex::at(-0.5, -0.5, 0.0),
            Vertex::at(0.5, -0.5, 0.0),
            Vertex::at(0.0, 0.5, 0.0),
        ])
    }

    /// Number of vertices
    pub fn vertex_count(&self) -> u32 {
        self.vertices.len() as u32
    }

    /// Raw byte view for buffer upload
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }
}
