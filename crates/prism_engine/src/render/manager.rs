//! Shader program registry
//!
//! Maps shader source to a compiled program identity. The identity's handle
//! is stable across repeated registration and is what the opaque draw sort
//! groups by.

use std::collections::HashMap;

use crate::render::shader::{ProgramHandle, ShaderIdentity};

/// Registry of compiled shader programs, keyed by logical name
pub struct RenderManager {
    programs: HashMap<String, ProgramHandle>,
    next_handle: u32,
}

impl Default for RenderManager {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderManager {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            programs: HashMap::new(),
            next_handle: 1,
        }
    }

    /// Resolve or compile the shader at `path` under the logical `name`
    ///
    /// Registering the same name twice returns the same identity.
    pub fn register_shader(&mut self, path: &str, name: &str) -> ShaderIdentity {
        if let Some(&handle) = self.programs.get(name) {
            return ShaderIdentity {
                name: name.to_string(),
                program: handle,
            };
        }

        let handle = ProgramHandle(self.next_handle);
        self.next_handle += 1;
        self.programs.insert(name.to_string(), handle);
        log::info!("registered shader program '{name}' from {path}");

        ShaderIdentity {
            name: name.to_string(),
            program: handle,
        }
    }

    /// Number of distinct programs registered
    pub fn program_count(&self) -> usize {
        self.programs.len()
    }
}
