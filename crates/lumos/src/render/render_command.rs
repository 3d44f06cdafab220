//! Transient draw commands

use crate::foundation::math::Mat4;
use crate::render::{MeshHandle, ShaderHandle};

/// One draw queued during scene traversal and consumed in the same frame
#[derive(Debug, Clone, PartialEq)]
pub struct RenderCommand {
    /// Mesh to draw
    pub mesh: MeshHandle,
    /// Model (world) matrix
    pub transform: Mat4,
    /// UV transform
    pub texture_matrix: Mat4,
    /// Shader replacing the pass default
    pub shader_override: Option<ShaderHandle>,
    /// Raw uniform bytes replacing the material defaults
    pub uniform_overrides: Option<Vec<u8>>,
}

impl RenderCommand {
    /// Command with no overrides
    pub fn new(mesh: MeshHandle, transform: Mat4, texture_matrix: Mat4) -> Self {
        Self {
            mesh,
            transform,
            texture_matrix,
            shader_override: None,
            uniform_overrides: None,
        }
    }
}

/// Bounded queue of commands for one pass
///
/// Pushes beyond the capacity are dropped; the caller learns about it through
/// the return value and [`dropped`](Self::dropped).
#[derive(Debug, Clone)]
pub struct CommandQueue {
    commands: Vec<RenderCommand>,
    capacity: usize,
    dropped: usize,
}

impl CommandQueue {
    /// Queue accepting at most `capacity` commands
    pub fn new(capacity: usize) -> Self {
        Self {
            commands: Vec::with_capacity(capacity.min(1024)),
            capacity,
            dropped: 0,
        }
    }

    /// Queue a command; returns `false` when it was dropped
    pub fn push(&mut self, command: RenderCommand) -> bool {
        if self.commands.len() >= self.capacity {
            self.dropped += 1;
            return false;
        }
        self.commands.push(command);
        true
    }

    /// Remove every command and reset the drop counter
    pub fn clear(&mut self) {
        self.commands.clear();
        self.dropped = 0;
    }

    /// Queued commands in submission order
    pub fn commands(&self) -> &[RenderCommand] {
        &self.commands
    }

    /// Number of queued commands
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// True when nothing is queued
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Commands rejected since the last clear
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// Maximum number of commands
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
