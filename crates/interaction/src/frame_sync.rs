//! Per-frame copy of engine vertex output into render geometry.

use picking::Mesh;
use tracing::{error, info};

use crate::engine::DeformationEngine;
use crate::error::FrameSyncError;
use crate::foreign_buffer::ForeignBufferView;

/// Lifecycle of the frame loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrameLoopState {
    #[default]
    Running,
    /// A consistency fault was detected; no further copies happen
    Halted,
}

/// Advances the engine and mirrors its vertex buffer into the mesh.
#[derive(Debug, Default)]
pub struct FrameSyncBridge {
    state: FrameLoopState,
    frames: u64,
}

impl FrameSyncBridge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> FrameLoopState {
        self.state
    }

    pub fn is_halted(&self) -> bool {
        self.state == FrameLoopState::Halted
    }

    /// Frames synced successfully so far
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Run one frame: tick the engine, then copy its output into `mesh`.
    ///
    /// The buffer address and vertex count are queried after the tick, so the
    /// copy always reflects this frame's state. Any fault halts the loop and
    /// leaves the mesh untouched.
    pub fn sync<E: DeformationEngine + ?Sized>(
        &mut self,
        engine: &mut E,
        mesh: &mut Mesh,
        delta_seconds: f32,
    ) -> Result<(), FrameSyncError> {
        if self.is_halted() {
            return Err(FrameSyncError::Halted);
        }

        engine.tick(delta_seconds);

        if let Err(err) = Self::copy_vertices(engine, mesh) {
            error!("Frame sync aborted after {} frames: {}", self.frames, err);
            self.state = FrameLoopState::Halted;
            return Err(err);
        }

        self.frames += 1;
        if self.frames == 1 {
            info!("First frame synced ({} vertices)", mesh.vertex_count());
        }
        Ok(())
    }

    fn copy_vertices<E: DeformationEngine + ?Sized>(
        engine: &E,
        mesh: &mut Mesh,
    ) -> Result<(), FrameSyncError> {
        let engine_vertices = engine.vertex_count();
        if engine_vertices != mesh.vertex_count() {
            return Err(FrameSyncError::VertexCountMismatch {
                engine: engine_vertices,
                mesh: mesh.vertex_count(),
            });
        }

        let view = ForeignBufferView::of_engine(engine)?;
        view.copy_into(mesh.positions_mut())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{grid_mesh, EngineCall, RecordingEngine};

    #[test]
    fn test_sync_copies_engine_output() {
        let mut mesh = grid_mesh(2, 1.0);
        let mut engine = RecordingEngine::for_mesh(&mesh);
        let mut bridge = FrameSyncBridge::new();

        bridge.sync(&mut engine, &mut mesh, 0.016).unwrap();

        assert_eq!(mesh.positions(), engine.expected_positions(1).as_slice());
        assert_eq!(engine.calls(), &[EngineCall::Tick(0.016)]);
        assert_eq!(bridge.frames(), 1);
    }

    #[test]
    fn test_mismatch_halts_without_copy() {
        let mut mesh = grid_mesh(2, 1.0);
        let before = mesh.positions().to_vec();
        mesh.take_dirty();
        let mut engine = RecordingEngine::for_mesh(&mesh).with_reported_vertex_count(100);
        let mut bridge = FrameSyncBridge::new();

        let err = bridge.sync(&mut engine, &mut mesh, 0.016).unwrap_err();
        assert_eq!(
            err,
            FrameSyncError::VertexCountMismatch {
                engine: 100,
                mesh: 9
            }
        );
        assert!(bridge.is_halted());
        assert_eq!(mesh.positions(), before.as_slice());
        assert!(!mesh.is_dirty());

        assert_eq!(
            bridge.sync(&mut engine, &mut mesh, 0.016),
            Err(FrameSyncError::Halted)
        );
        // The halted loop no longer ticks the engine
        assert_eq!(engine.tick_count(), 1);
    }

    #[test]
    fn test_sync_marks_mesh_dirty() {
        let mut mesh = grid_mesh(1, 1.0);
        mesh.take_dirty();
        let mut engine = RecordingEngine::for_mesh(&mesh);

        FrameSyncBridge::new()
            .sync(&mut engine, &mut mesh, 0.016)
            .unwrap();
        assert!(mesh.take_dirty());
    }
}
