//! Pointer drag state machine.
//!
//! A drag starts on pointer-down over a handle marker or the face mesh, pins
//! the picked vertex in the engine, follows the pointer across a plane fixed
//! at the initial hit depth, and releases the vertex on pointer-up. At most
//! one drag is active.

use glam::Vec3;
use picking::{resolve, Mesh, Plane, Ray};
use tracing::{debug, info};
use visage_config::DragPlane;

use crate::engine::DeformationEngine;
use crate::handles::{HandleId, HandleManager};

/// Whether the host camera may orbit.
///
/// Cleared while a drag is active so the drag does not also rotate the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavigationFlag(bool);

impl Default for NavigationFlag {
    fn default() -> Self {
        Self(true)
    }
}

impl NavigationFlag {
    pub fn is_enabled(&self) -> bool {
        self.0
    }

    pub fn set(&mut self, enabled: bool) {
        self.0 = enabled;
    }
}

/// What a drag is moving
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragMode {
    FreeVertex,
    Handle(HandleId),
}

/// One pointer-down to pointer-up interval
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragSession {
    pub mode: DragMode,
    pub vertex_index: u32,
    /// Plane the pointer is projected onto while dragging
    pub plane: Plane,
}

/// Observable drag state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragState {
    Idle,
    DraggingFreeVertex(u32),
    DraggingHandle(u32, HandleId),
}

/// What the host should do with a pointer event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerResponse {
    /// The event was consumed by the drag machine
    Captured,
    /// The event is not ours; forward it unchanged (e.g. to camera orbit)
    PassThrough,
}

#[derive(Debug, Clone, Default)]
pub struct DragController {
    session: Option<DragSession>,
    plane_orientation: DragPlane,
}

impl DragController {
    pub fn new(plane_orientation: DragPlane) -> Self {
        Self {
            session: None,
            plane_orientation,
        }
    }

    pub fn state(&self) -> DragState {
        match self.session {
            None => DragState::Idle,
            Some(DragSession {
                mode: DragMode::FreeVertex,
                vertex_index,
                ..
            }) => DragState::DraggingFreeVertex(vertex_index),
            Some(DragSession {
                mode: DragMode::Handle(handle),
                vertex_index,
                ..
            }) => DragState::DraggingHandle(vertex_index, handle),
        }
    }

    pub fn session(&self) -> Option<&DragSession> {
        self.session.as_ref()
    }

    pub fn is_dragging(&self) -> bool {
        self.session.is_some()
    }

    /// Start a drag if `ray` hits a handle or the mesh.
    ///
    /// Handles take priority over the mesh surface behind them. A pointer-down
    /// while a drag is already active is swallowed.
    pub fn pointer_down<E: DeformationEngine + ?Sized>(
        &mut self,
        ray: &Ray,
        mesh: &Mesh,
        handles: &HandleManager,
        engine: &mut E,
        navigation: &mut NavigationFlag,
    ) -> PointerResponse {
        if self.session.is_some() {
            debug!("Pointer down during an active drag ignored");
            return PointerResponse::Captured;
        }

        let (mode, vertex_index, world_point) = if let Some(pick) = handles.pick(ray) {
            (DragMode::Handle(pick.handle), pick.vertex_index, pick.world_point)
        } else if let Some(pick) = resolve(ray, mesh) {
            (DragMode::FreeVertex, pick.vertex_index, pick.world_point)
        } else {
            return PointerResponse::PassThrough;
        };

        let plane = Plane::from_point_normal(world_point, self.plane_normal(ray));
        self.session = Some(DragSession {
            mode,
            vertex_index,
            plane,
        });

        navigation.set(false);
        engine.on_pointer_down(vertex_index, world_point);
        info!("Drag started on vertex {} ({:?})", vertex_index, mode);

        PointerResponse::Captured
    }

    /// Follow the pointer on the drag plane.
    ///
    /// A ray that does not reach the plane leaves everything unchanged.
    pub fn pointer_move<E: DeformationEngine + ?Sized>(
        &mut self,
        ray: &Ray,
        handles: &mut HandleManager,
        engine: &mut E,
    ) -> PointerResponse {
        let Some(session) = self.session else {
            return PointerResponse::PassThrough;
        };

        let Some(point) = session.plane.intersect_ray(ray) else {
            return PointerResponse::Captured;
        };

        if let DragMode::Handle(handle) = session.mode {
            handles.move_handle(handle, point);
        }
        engine.on_pointer_move(point);

        PointerResponse::Captured
    }

    /// End the active drag, releasing the vertex exactly once
    pub fn pointer_up<E: DeformationEngine + ?Sized>(
        &mut self,
        engine: &mut E,
        navigation: &mut NavigationFlag,
    ) -> PointerResponse {
        let Some(session) = self.session.take() else {
            return PointerResponse::PassThrough;
        };

        engine.on_pointer_up();
        navigation.set(true);
        info!("Drag ended on vertex {}", session.vertex_index);

        PointerResponse::Captured
    }

    /// Abort the active drag, e.g. when the handles it refers to are replaced
    pub fn cancel<E: DeformationEngine + ?Sized>(
        &mut self,
        engine: &mut E,
        navigation: &mut NavigationFlag,
    ) {
        if self.session.is_some() {
            debug!("Cancelling active drag");
            self.pointer_up(engine, navigation);
        }
    }

    fn plane_normal(&self, ray: &Ray) -> Vec3 {
        match self.plane_orientation {
            DragPlane::ViewFacing => -ray.direction,
            DragPlane::WorldZ => Vec3::Z,
        }
    }
}
