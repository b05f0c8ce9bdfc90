//! Bounds-checked view over the engine's vertex buffer.
//!
//! A view borrows the engine immutably, so it cannot outlive the next call
//! that may reallocate engine memory. It is rebuilt every frame from a freshly
//! queried address and vertex count.

use crate::engine::DeformationEngine;
use crate::error::FrameSyncError;

const FLOATS_PER_VERTEX: usize = 3;
const FLOAT_BYTES: usize = std::mem::size_of::<f32>();

/// Read-only typed view of `3 * vertex_count` native-endian floats
#[derive(Debug, Clone, Copy)]
pub struct ForeignBufferView<'a> {
    bytes: &'a [u8],
    vertex_count: usize,
}

impl<'a> ForeignBufferView<'a> {
    /// Validate `address` and `vertex_count` against `memory` and build a view.
    ///
    /// No alignment is required; values are copied out byte-wise.
    pub fn acquire(
        memory: &'a [u8],
        address: usize,
        vertex_count: usize,
    ) -> Result<Self, FrameSyncError> {
        let len = vertex_count
            .checked_mul(FLOATS_PER_VERTEX * FLOAT_BYTES)
            .ok_or(FrameSyncError::AddressOverflow)?;
        let end = address
            .checked_add(len)
            .ok_or(FrameSyncError::AddressOverflow)?;

        let bytes = memory
            .get(address..end)
            .ok_or(FrameSyncError::BufferOutOfBounds {
                address,
                len,
                memory_len: memory.len(),
            })?;

        Ok(Self {
            bytes,
            vertex_count,
        })
    }

    /// View the engine's current vertex buffer
    pub fn of_engine<E: DeformationEngine + ?Sized>(engine: &'a E) -> Result<Self, FrameSyncError> {
        Self::acquire(
            engine.memory(),
            engine.vertex_buffer_address(),
            engine.vertex_count(),
        )
    }

    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    /// Number of floats in the view
    pub fn len(&self) -> usize {
        self.vertex_count * FLOATS_PER_VERTEX
    }

    pub fn is_empty(&self) -> bool {
        self.vertex_count == 0
    }

    /// Float at `index`, `None` past the end
    pub fn get(&self, index: usize) -> Option<f32> {
        let start = index.checked_mul(FLOAT_BYTES)?;
        let end = start.checked_add(FLOAT_BYTES)?;
        let bytes = self.bytes.get(start..end)?;
        Some(bytemuck::pod_read_unaligned(bytes))
    }

    /// Copy every float into `dst`, which must hold exactly [`Self::len`] floats
    pub fn copy_into(&self, dst: &mut [f32]) -> Result<(), FrameSyncError> {
        if dst.len() != self.len() {
            return Err(FrameSyncError::VertexCountMismatch {
                engine: self.vertex_count,
                mesh: dst.len() / FLOATS_PER_VERTEX,
            });
        }
        bytemuck::cast_slice_mut::<f32, u8>(dst).copy_from_slice(self.bytes);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_with(offset: usize, values: &[f32]) -> Vec<u8> {
        let mut memory = vec![0u8; offset];
        memory.extend_from_slice(bytemuck::cast_slice(values));
        memory.extend_from_slice(&[0xAB; 5]);
        memory
    }

    #[test]
    fn test_acquire_unaligned_view() {
        let values = [1.0, 2.0, 3.0, -4.0, 5.5, 6.25];
        let memory = memory_with(3, &values);

        let view = ForeignBufferView::acquire(&memory, 3, 2).unwrap();
        assert_eq!(view.len(), 6);
        assert_eq!(view.get(3), Some(-4.0));
        assert_eq!(view.get(6), None);

        let mut dst = [0.0f32; 6];
        view.copy_into(&mut dst).unwrap();
        assert_eq!(dst, values);
    }

    #[test]
    fn test_out_of_bounds_rejected() {
        let memory = memory_with(0, &[1.0, 2.0, 3.0]);

        let err = ForeignBufferView::acquire(&memory, 8, 1).unwrap_err();
        assert_eq!(
            err,
            FrameSyncError::BufferOutOfBounds {
                address: 8,
                len: 12,
                memory_len: memory.len(),
            }
        );
    }

    #[test]
    fn test_overflowing_request_rejected() {
        let memory = [0u8; 16];
        assert_eq!(
            ForeignBufferView::acquire(&memory, 0, usize::MAX).unwrap_err(),
            FrameSyncError::AddressOverflow
        );
        assert_eq!(
            ForeignBufferView::acquire(&memory, usize::MAX, 1).unwrap_err(),
            FrameSyncError::AddressOverflow
        );
    }

    #[test]
    fn test_copy_into_wrong_length() {
        let memory = memory_with(0, &[1.0, 2.0, 3.0]);
        let view = ForeignBufferView::acquire(&memory, 0, 1).unwrap();

        let mut dst = [0.0f32; 6];
        assert!(matches!(
            view.copy_into(&mut dst),
            Err(FrameSyncError::VertexCountMismatch { engine: 1, mesh: 2 })
        ));
    }

    #[test]
    fn test_get_near_usize_max_is_none() {
        let memory = memory_with(0, &[1.0, 2.0, 3.0]);
        let view = ForeignBufferView::acquire(&memory, 0, 1).unwrap();

        // the largest index whose byte offset still fits in usize
        assert_eq!(view.get(usize::MAX / FLOAT_BYTES), None);
        assert_eq!(view.get(usize::MAX), None);
        assert_eq!(view.get(3), None);
        assert_eq!(view.get(2), Some(3.0));
    }

    #[test]
    fn test_empty_view() {
        let view = ForeignBufferView::acquire(&[], 0, 0).unwrap();
        assert!(view.is_empty());
        view.copy_into(&mut []).unwrap();
    }
}
