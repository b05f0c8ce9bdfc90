//! Visible spheres for annotation handles.

use bevy::prelude::*;
use interaction::{DeformationEngine, HandleId};

use crate::face::FaceSession;

/// Marker entity mirroring one annotation handle
#[derive(Component)]
pub struct HandleMarker {
    pub id: HandleId,
}

/// Respawn markers when the handle set is rebuilt, otherwise follow handle moves
pub(crate) fn sync_handle_markers<E: DeformationEngine + Send + Sync + 'static>(
    mut commands: Commands,
    face: Res<FaceSession<E>>,
    mut marker_query: Query<(Entity, &HandleMarker, &mut Transform)>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut spawned_generation: Local<Option<u64>>,
) {
    let Some(session) = face.session.as_ref() else {
        return;
    };
    let handles = session.handles();

    if *spawned_generation != Some(handles.generation()) {
        for (entity, _, _) in marker_query.iter() {
            commands.entity(entity).despawn();
        }

        if !handles.is_empty() {
            let mesh = meshes.add(Sphere::new(handles.marker_radius()).mesh().uv(16, 8));
            let material = materials.add(StandardMaterial {
                base_color: Color::srgb(1.0, 0.0, 0.0),
                unlit: true,
                ..default()
            });

            for handle in handles.iter() {
                commands.spawn((
                    Mesh3d(mesh.clone()),
                    MeshMaterial3d(material.clone()),
                    Transform::from_translation(handle.position),
                    HandleMarker { id: handle.id },
                    Name::new(format!("Handle {}", handle.id.0)),
                ));
            }
        }

        debug!(
            "Spawned {} handle markers (generation {})",
            handles.len(),
            handles.generation()
        );
        *spawned_generation = Some(handles.generation());
        return;
    }

    for (_, marker, mut transform) in marker_query.iter_mut() {
        let Some(handle) = handles.get(marker.id) else {
            continue;
        };
        if transform.translation != handle.position {
            transform.translation = handle.position;
        }
    }
}
