//! End-to-end scenarios driving a session through its public API.

use glam::Vec3;
use interaction::testing::{
    full_view_plane, png_bytes, EngineCall, MappingFilter, RecordingEngine, ScriptedDetector,
};
use interaction::{
    DeformationEngine, DetectionBox, DragState, FrameSyncBridge, FrameSyncError, ImageUpload,
    PerspectiveCamera, Session,
};
use picking::{resolve, Mesh, Ray};
use visage_config::{CameraConfig, InteractionConfig};

fn session() -> Session<RecordingEngine> {
    let mesh = full_view_plane();
    let engine = RecordingEngine::for_mesh(&mesh);
    Session::new(mesh, engine, &InteractionConfig::default())
}

#[test]
fn test_centroid_ray_resolves_to_lowest_equidistant_vertex() {
    let mesh = Mesh::new(
        vec![
            5.0, 5.0, 5.0, // unused
            2.0, 0.0, 0.0, //
            0.0, 0.0, 0.0, //
            1.0, 3.0, 0.0, //
        ],
        vec![1, 2, 3],
    )
    .unwrap();
    let centroid = Vec3::new(1.0, 1.0, 0.0);
    let ray = Ray::new(centroid + Vec3::Z * 4.0, Vec3::NEG_Z);

    let first = resolve(&ray, &mesh).unwrap();
    let second = resolve(&ray, &mesh).unwrap();

    // Vertices 1 and 2 are both sqrt(2) from the centroid
    assert_eq!(first.vertex_index, 1);
    assert_eq!(first, second);
}

#[test]
fn test_detection_box_creates_five_bound_handles() {
    let mut session = session();
    let camera = PerspectiveCamera::new(&CameraConfig::default(), 1.0);
    let detector = ScriptedDetector::faces(vec![DetectionBox::new(10.0, 10.0, 50.0, 50.0)]);
    let upload = ImageUpload::new(png_bytes(100, 100), Some("image/png".to_string()));

    session.upload_image(upload, &detector, &camera).unwrap();

    let handles = session.handles();
    assert_eq!(handles.len(), 5);
    for handle in handles.iter() {
        assert!((handle.vertex_index as usize) < session.mesh().vertex_count());
    }
}

#[test]
fn test_drag_sends_down_moves_and_single_release_in_order() {
    let mut session = session();
    let vertex = session.mesh().position(7).unwrap();
    let start = Ray::new(vertex + Vec3::new(-0.03, 0.04, 1.0), Vec3::NEG_Z);

    session.pointer_down(&start);
    assert_eq!(session.drag_state(), DragState::DraggingFreeVertex(7));

    for step in 1..=3 {
        let offset = Vec3::new(0.0, 0.1 * step as f32, 0.0);
        session.pointer_move(&Ray::new(start.origin + offset, Vec3::NEG_Z));
    }
    session.pointer_up();
    session.pointer_up();

    let calls = session.engine().calls();
    assert_eq!(calls.len(), 5);
    assert!(matches!(calls[0], EngineCall::PointerDown(7, _)));
    for call in &calls[1..4] {
        assert!(matches!(call, EngineCall::PointerMove(_)));
    }
    assert_eq!(calls[4], EngineCall::PointerUp);
    assert_eq!(
        calls.iter().filter(|c| **c == EngineCall::PointerUp).count(),
        1
    );
    assert!(session.navigation_enabled());
}

#[test]
fn test_vertex_count_mismatch_aborts_frame_loop() {
    let mut mesh = Mesh::new(vec![0.0; 480 * 3], vec![0, 1, 2]).unwrap();
    mesh.take_dirty();
    let mut engine = RecordingEngine::construct(&vec![1.0; 500 * 3], &[0, 1, 2]).unwrap();
    let mut bridge = FrameSyncBridge::new();

    let err = bridge.sync(&mut engine, &mut mesh, 0.016).unwrap_err();

    assert_eq!(
        err,
        FrameSyncError::VertexCountMismatch {
            engine: 500,
            mesh: 480
        }
    );
    assert!(mesh.positions().iter().all(|p| *p == 0.0));
    assert!(!mesh.is_dirty());
    assert_eq!(bridge.sync(&mut engine, &mut mesh, 0.016), Err(FrameSyncError::Halted));
}

#[test]
fn test_mesh_matches_engine_output_after_n_frames() {
    let mut session = session();
    let engine_snapshot = session.engine().clone();

    for _ in 0..12 {
        session.frame(1.0 / 60.0).unwrap();
        assert!(session.take_mesh_dirty());
    }

    assert_eq!(session.engine().tick_count(), 12);
    assert_eq!(
        session.mesh().positions(),
        engine_snapshot.expected_positions(12).as_slice()
    );
    assert_eq!(
        session.mesh().positions().len(),
        3 * session.mesh().vertex_count()
    );
}

#[test]
fn test_filter_twice_equals_once() {
    let mut session = session();
    let camera = PerspectiveCamera::new(&CameraConfig::default(), 1.0);
    let bytes = png_bytes(16, 8);
    session
        .upload_image(
            ImageUpload::new(bytes.clone(), None),
            &ScriptedDetector::faces(Vec::new()),
            &camera,
        )
        .unwrap();

    let filter = MappingFilter::new("sepia", |byte| byte / 2 + 40);
    session.apply_filter(&filter).unwrap();
    let once = session.texture().unwrap().clone();
    session.apply_filter(&filter).unwrap();

    assert_eq!(session.texture().unwrap(), &once);
    assert_eq!(filter.inputs(), vec![bytes.clone(), bytes]);
}
