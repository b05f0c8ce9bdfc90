//! Annotation handles derived from face detections.
//!
//! Each detection box yields up to five handles (corners and center). A
//! handle is bound to the mesh vertex its landmark ray resolves to and is
//! drawn as a small pickable marker.

use glam::{Vec2, Vec3};
use picking::{resolve, MarkerSet, Mesh, Ray};
use tracing::debug;

use crate::camera::{RayCaster, Viewport};
use crate::detection::DetectionBox;

/// Stable identifier of a handle within one detection generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandleId(pub u32);

/// A user-manipulable marker bound to one mesh vertex
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Handle {
    pub id: HandleId,
    pub vertex_index: u32,
    pub position: Vec3,
}

/// A handle hit by a pointer ray
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HandlePick {
    pub handle: HandleId,
    /// Mesh vertex the handle is bound to
    pub vertex_index: u32,
    /// Point on the marker surface the ray hit
    pub world_point: Vec3,
}

/// Owns every handle and its marker geometry
#[derive(Debug, Clone)]
pub struct HandleManager {
    handles: Vec<Handle>,
    markers: MarkerSet,
    next_id: u32,
    generation: u64,
}

impl HandleManager {
    pub fn new(marker_radius: f32) -> Self {
        Self {
            handles: Vec::new(),
            markers: MarkerSet::new(marker_radius),
            next_id: 0,
            generation: 0,
        }
    }

    /// Remove every handle and bump the generation
    pub fn clear(&mut self) {
        self.handles.clear();
        self.markers.clear();
        self.generation += 1;
    }

    /// Replace all handles with those derived from `boxes`.
    ///
    /// Landmarks are normalized against the image dimensions, cast through
    /// `camera`, and resolved against `mesh`. Landmarks that miss the mesh are
    /// skipped. Returns the number of handles created.
    pub fn rebuild<C: RayCaster + ?Sized>(
        &mut self,
        boxes: &[DetectionBox],
        image_size: (u32, u32),
        camera: &C,
        mesh: &Mesh,
    ) -> usize {
        self.clear();

        let image = Viewport::new(image_size.0 as f32, image_size.1 as f32);
        for (box_index, detection) in boxes.iter().enumerate() {
            for landmark in detection.landmarks() {
                match Self::landmark_vertex(landmark, &image, camera, mesh) {
                    Some(vertex_index) => {
                        self.spawn(vertex_index, mesh);
                    }
                    None => debug!(
                        "Landmark {:?} of face {} missed the mesh, skipping",
                        landmark, box_index
                    ),
                }
            }
        }

        debug!(
            "Created {} handles from {} detections",
            self.handles.len(),
            boxes.len()
        );
        self.handles.len()
    }

    fn landmark_vertex<C: RayCaster + ?Sized>(
        landmark: Vec2,
        image: &Viewport,
        camera: &C,
        mesh: &Mesh,
    ) -> Option<u32> {
        let ndc = image.to_ndc(landmark)?;
        let ray = camera.ray_from_ndc(ndc)?;
        resolve(&ray, mesh).map(|pick| pick.vertex_index)
    }

    fn spawn(&mut self, vertex_index: u32, mesh: &Mesh) -> Option<HandleId> {
        let position = mesh.position(vertex_index)?;
        let id = HandleId(self.next_id);
        self.next_id += 1;

        self.handles.push(Handle {
            id,
            vertex_index,
            position,
        });
        self.markers.insert(id.0, position);
        Some(id)
    }

    /// Resolve a ray against the handle markers only
    pub fn pick(&self, ray: &Ray) -> Option<HandlePick> {
        let pick = resolve(ray, &self.markers)?;
        let handle = self.get(HandleId(self.markers.owner_of_vertex(pick.vertex_index)?))?;

        Some(HandlePick {
            handle: handle.id,
            vertex_index: handle.vertex_index,
            world_point: pick.world_point,
        })
    }

    /// Move a handle and its marker. Returns false for an unknown id.
    pub fn move_handle(&mut self, id: HandleId, position: Vec3) -> bool {
        match self.handles.iter_mut().find(|h| h.id == id) {
            Some(handle) => {
                handle.position = position;
                self.markers.set_center(id.0, position)
            }
            None => false,
        }
    }

    pub fn get(&self, id: HandleId) -> Option<&Handle> {
        self.handles.iter().find(|h| h.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Handle> {
        self.handles.iter()
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Incremented on every clear; lets renderers detect a full rebuild
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn markers(&self) -> &MarkerSet {
        &self.markers
    }

    pub fn marker_radius(&self) -> f32 {
        self.markers.radius()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::PerspectiveCamera;
    use crate::testing::{full_view_plane, plane_mesh};
    use visage_config::CameraConfig;

    fn camera() -> PerspectiveCamera {
        PerspectiveCamera::new(&CameraConfig::default(), 1.0)
    }

    #[test]
    fn test_rebuild_binds_five_landmarks() {
        let mesh = full_view_plane();
        let mut manager = HandleManager::new(0.01);

        let created = manager.rebuild(
            &[DetectionBox::new(10.0, 10.0, 50.0, 50.0)],
            (100, 100),
            &camera(),
            &mesh,
        );

        assert_eq!(created, 5);
        for handle in manager.iter() {
            assert!((handle.vertex_index as usize) < mesh.vertex_count());
            assert_eq!(mesh.position(handle.vertex_index), Some(handle.position));
        }
    }

    #[test]
    fn test_missed_landmarks_are_skipped() {
        // Small plane only covers the middle of the view
        let mesh = plane_mesh(Vec2::new(-0.55, -0.47), Vec2::new(0.45, 0.53), 3);
        let mut manager = HandleManager::new(0.01);

        let created = manager.rebuild(
            &[DetectionBox::new(0.0, 0.0, 100.0, 100.0)],
            (100, 100),
            &camera(),
            &mesh,
        );

        // Only the center landmark lands on the plane
        assert_eq!(created, 1);
    }

    #[test]
    fn test_rebuild_replaces_previous_handles() {
        let mesh = full_view_plane();
        let mut manager = HandleManager::new(0.01);
        let boxes = [DetectionBox::new(10.0, 10.0, 50.0, 50.0)];

        manager.rebuild(&boxes, (100, 100), &camera(), &mesh);
        let first_generation = manager.generation();
        manager.rebuild(&boxes, (100, 100), &camera(), &mesh);

        assert_eq!(manager.len(), 5);
        assert!(manager.generation() > first_generation);
        assert!(manager.iter().all(|h| h.id.0 >= 5));
    }

    #[test]
    fn test_pick_and_move_handle() {
        let mesh = full_view_plane();
        let mut manager = HandleManager::new(0.05);
        manager.rebuild(
            &[DetectionBox::new(10.0, 10.0, 50.0, 50.0)],
            (100, 100),
            &camera(),
            &mesh,
        );
        let target = *manager.iter().last().unwrap();

        let ray = Ray::new(target.position + Vec3::new(0.01, 0.013, 1.0), Vec3::NEG_Z);
        let pick = manager.pick(&ray).unwrap();
        assert_eq!(pick.handle, target.id);
        assert_eq!(pick.vertex_index, target.vertex_index);

        let moved = target.position + Vec3::new(0.0, 0.0, 0.3);
        assert!(manager.move_handle(target.id, moved));
        assert_eq!(manager.get(target.id).unwrap().position, moved);
        assert!(manager.pick(&ray).is_some());
        assert!(!manager.move_handle(HandleId(999), moved));
    }
}
