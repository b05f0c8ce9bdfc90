//! Face session lifecycle, frame sync and texture assignment.

use bevy::asset::RenderAssetUsages;
use bevy::mesh::{Indices, PrimitiveTopology};
use bevy::prelude::*;
use bevy::render::render_resource::{Extent3d, TextureDimension, TextureFormat};
use interaction::{DeformationEngine, FrameLoopState, Session, StartupTask};
use visage_ipc::{CoreToUi, Notice};

use crate::OutboundUiMessages;

/// The running session, `None` until startup resolves
#[derive(Resource)]
pub struct FaceSession<E> {
    pub session: Option<Session<E>>,
}

impl<E> Default for FaceSession<E> {
    fn default() -> Self {
        Self { session: None }
    }
}

/// Startup task inserted by the host; removed once it resolves
#[derive(Resource)]
pub struct PendingStartup<E>(pub StartupTask<E>);

/// Marker for the entity rendering the face mesh
#[derive(Component)]
pub struct FaceModel;

/// Take the startup result and spawn the face once it is ready.
///
/// A failed startup is reported once and never retried.
pub(crate) fn poll_startup<E: DeformationEngine + Send + Sync + 'static>(
    mut commands: Commands,
    pending: Option<ResMut<PendingStartup<E>>>,
    mut face: ResMut<FaceSession<E>>,
    mut outbound: ResMut<OutboundUiMessages>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let Some(mut pending) = pending else {
        return;
    };
    let Some(result) = pending.0.try_take() else {
        return;
    };
    commands.remove_resource::<PendingStartup<E>>();

    match result {
        Ok(session) => {
            let mesh = session.mesh();
            outbound.send(CoreToUi::SessionReady {
                vertex_count: mesh.vertex_count(),
                triangle_count: mesh.triangle_count(),
            });

            commands.spawn((
                Mesh3d(meshes.add(build_face_mesh(mesh))),
                MeshMaterial3d(materials.add(StandardMaterial {
                    base_color: Color::srgb(0.9, 0.8, 0.75),
                    perceptual_roughness: 0.7,
                    ..default()
                })),
                Transform::default(),
                FaceModel,
                Name::new("Face"),
            ));

            info!("Face session started");
            face.session = Some(session);
        }
        Err(err) => {
            error!("Failed to start face session: {}", err);
            outbound.send(CoreToUi::SessionFailed {
                message: err.to_string(),
            });
            outbound.send(CoreToUi::Notice(Notice::error(format!(
                "Failed to load the face model: {err}"
            ))));
        }
    }
}

/// Advance the engine and upload changed positions to the face mesh
pub(crate) fn run_frame_sync<E: DeformationEngine + Send + Sync + 'static>(
    time: Res<Time>,
    mut face: ResMut<FaceSession<E>>,
    model_query: Query<&Mesh3d, With<FaceModel>>,
    mut meshes: ResMut<Assets<Mesh>>,
) {
    let Some(session) = face.session.as_mut() else {
        return;
    };
    if session.frame_loop_state() == FrameLoopState::Halted {
        return;
    }

    if let Err(err) = session.frame(time.delta_secs()) {
        error!("Frame loop aborted: {}", err);
        return;
    }

    if !session.take_mesh_dirty() {
        return;
    }

    let Ok(mesh3d) = model_query.single() else {
        return;
    };
    if let Some(mesh) = meshes.get_mut(&mesh3d.0) {
        mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, session.mesh().position_triples());
        mesh.compute_normals();
    }
}

/// Put the session's current texture on the face material when it changes
pub(crate) fn apply_face_texture<E: DeformationEngine + Send + Sync + 'static>(
    face: Res<FaceSession<E>>,
    model_query: Query<&MeshMaterial3d<StandardMaterial>, With<FaceModel>>,
    mut images: ResMut<Assets<Image>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut applied_revision: Local<u64>,
) {
    let Some(session) = face.session.as_ref() else {
        return;
    };
    if session.texture_revision() == *applied_revision {
        return;
    }
    let Some(texture) = session.texture() else {
        return;
    };
    let Ok(material_ref) = model_query.single() else {
        return;
    };

    let image = Image::new(
        Extent3d {
            width: texture.width(),
            height: texture.height(),
            depth_or_array_layers: 1,
        },
        TextureDimension::D2,
        texture.pixels().to_vec(),
        TextureFormat::Rgba8UnormSrgb,
        RenderAssetUsages::MAIN_WORLD | RenderAssetUsages::RENDER_WORLD,
    );
    let handle = images.add(image);

    if let Some(material) = materials.get_mut(&material_ref.0) {
        material.base_color_texture = Some(handle);
        material.base_color = Color::WHITE;
    }

    *applied_revision = session.texture_revision();
}

/// Move messages queued by the session into the shared UI queue
pub(crate) fn forward_outbound<E: DeformationEngine + Send + Sync + 'static>(
    mut face: ResMut<FaceSession<E>>,
    mut outbound: ResMut<OutboundUiMessages>,
) {
    if let Some(session) = face.session.as_mut() {
        for message in session.drain_outbound() {
            outbound.send(message);
        }
    }
}

/// Build the render mesh for a session mesh.
///
/// The uploaded photo is projected onto the face from the front, so UVs are
/// the XY bounding box of the rest pose.
pub(crate) fn build_face_mesh(source: &picking::Mesh) -> Mesh {
    let positions = source.position_triples();
    let uvs = planar_uvs(&positions);

    let mut mesh = Mesh::new(
        PrimitiveTopology::TriangleList,
        RenderAssetUsages::MAIN_WORLD | RenderAssetUsages::RENDER_WORLD,
    );
    mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, positions);
    mesh.insert_attribute(Mesh::ATTRIBUTE_UV_0, uvs);
    mesh.insert_indices(Indices::U32(source.indices().to_vec()));
    mesh.compute_normals();
    mesh
}

/// Front-projected UVs, v = 0 at the top edge
pub(crate) fn planar_uvs(positions: &[[f32; 3]]) -> Vec<[f32; 2]> {
    let (min, max) = positions.iter().fold(
        (Vec2::splat(f32::INFINITY), Vec2::splat(f32::NEG_INFINITY)),
        |(min, max), p| {
            let xy = Vec2::new(p[0], p[1]);
            (min.min(xy), max.max(xy))
        },
    );
    let size = (max - min).max(Vec2::splat(f32::EPSILON));

    positions
        .iter()
        .map(|p| {
            let uv = (Vec2::new(p[0], p[1]) - min) / size;
            [uv.x, 1.0 - uv.y]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_planar_uvs_cover_unit_square() {
        let uvs = planar_uvs(&[[-1.0, -2.0, 0.3], [1.0, 2.0, 0.0], [0.0, 0.0, -0.5]]);
        assert_eq!(uvs, vec![[0.0, 1.0], [1.0, 0.0], [0.5, 0.5]]);
    }

    #[test]
    fn test_planar_uvs_degenerate_extent() {
        let uvs = planar_uvs(&[[0.5, 0.5, 0.0], [0.5, 0.5, 1.0]]);
        assert!(uvs.iter().all(|uv| uv[0].is_finite() && uv[1].is_finite()));
    }

    #[test]
    fn test_face_mesh_attributes() {
        let source = picking::Mesh::new(
            vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
            vec![0, 1, 2],
        )
        .unwrap();
        let mesh = build_face_mesh(&source);

        assert_eq!(mesh.count_vertices(), 3);
        assert!(mesh.attribute(Mesh::ATTRIBUTE_UV_0).is_some());
        assert!(mesh.attribute(Mesh::ATTRIBUTE_NORMAL).is_some());
    }
}
