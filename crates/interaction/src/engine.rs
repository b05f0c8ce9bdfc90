//! Contract for the external deformation engine.
//!
//! The engine owns the live vertex positions. Visage only pushes pointer
//! constraints in and reads the vertex buffer back out once per frame.

use glam::Vec3;
use thiserror::Error;

/// Failure reported by the engine itself, e.g. during construction
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct EngineError(pub String);

/// Real-time deformation engine driven by the frame loop.
///
/// All constraint calls are one-directional: the engine never calls back.
pub trait DeformationEngine {
    /// Build an engine from flat positions and triangle indices
    fn construct(positions: &[f32], indices: &[u32]) -> Result<Self, EngineError>
    where
        Self: Sized;

    /// Advance the simulation by `delta_seconds`
    fn tick(&mut self, delta_seconds: f32);

    /// Pin `vertex` to `target` until released
    fn on_pointer_down(&mut self, vertex: u32, target: Vec3);

    /// Move the pinned vertex to `target`
    fn on_pointer_move(&mut self, target: Vec3);

    /// Release the pinned vertex
    fn on_pointer_up(&mut self);

    /// Number of vertices the engine currently simulates
    fn vertex_count(&self) -> usize;

    /// Byte offset of the vertex buffer inside [`DeformationEngine::memory`].
    ///
    /// Only valid until the next call that takes `&mut self`.
    fn vertex_buffer_address(&self) -> usize;

    /// The engine's linear memory
    fn memory(&self) -> &[u8];
}
