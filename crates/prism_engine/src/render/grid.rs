//! Ground-plane grid overlay shader

use crate::render::backend::RenderBackend;
use crate::render::manager::RenderManager;
use crate::render::shader::{DrawObject, ShaderBinding, ShaderCore, ShaderIdentity};
use crate::scene::camera::CameraView;

const GRID_VERTEX_COUNT: u32 = 6; // two triangles spanning the plane

/// Shader binding for the debug ground-plane grid
///
/// Drawn with no renderable: the plane is generated in the shader, only the
/// camera's view-projection is uploaded.
pub struct GridShader {
    core: ShaderCore,
}

impl GridShader {
    /// Register the grid program and resolve its uniforms
    pub fn new(manager: &mut RenderManager, backend: &dyn RenderBackend) -> Self {
        let mut core = ShaderCore::register(manager, "resources/shaders/grid", "grid");
        core.add_uniform(backend, "viewProjection");
        Self { core }
    }
}

impl ShaderBinding for GridShader {
    fn identity(&self) -> &ShaderIdentity {
        self.core.identity()
    }

    fn draw(
        &self,
        backend: &mut dyn RenderBackend,
        _object: Option<&DrawObject>,
        camera: &CameraView,
    ) {
        if let Some(location) = self.core.uniform("viewProjection") {
            backend.set_uniform_mat4(location, &camera.view_projection());
        }
        backend.draw_triangles(GRID_VERTEX_COUNT);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{Mat4, Vec3};
    use crate::render::backend::NullBackend;

    #[test]
    fn test_grid_draws_without_an_object() {
        let mut backend = NullBackend::new();
        let mut manager = RenderManager::new();
        let grid = GridShader::new(&mut manager, &backend);

        let camera = CameraView {
            position: Vec3::zeros(),
            view: Mat4::identity(),
            projection: Mat4::identity(),
        };
        grid.draw(&mut backend, None, &camera);
        assert_eq!(backend.draw_calls, 1);
        assert_eq!(backend.uniform_uploads, 1);
    }
}
