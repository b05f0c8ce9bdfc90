//! Deterministic collaborator doubles for tests.
//!
//! Enabled for this crate's unit tests and, through the `testing` feature, for
//! integration tests and downstream crates.

use std::cell::{Cell, RefCell};
use std::io::Cursor;

use glam::{Vec2, Vec3};
use image::{ImageFormat, Rgba, RgbaImage};
use picking::Mesh;

use crate::detection::{DetectionBox, FaceDetector};
use crate::engine::{DeformationEngine, EngineError};
use crate::error::{DetectionError, FilterError};
use crate::filter::ImageFilter;

/// Offset added to every coordinate on each tick
pub const TICK_OFFSET: f32 = 0.25;

/// Call received by a [`RecordingEngine`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EngineCall {
    Tick(f32),
    PointerDown(u32, Vec3),
    PointerMove(Vec3),
    PointerUp,
}

/// Engine double that records every call.
///
/// After `n` ticks each coordinate equals its initial value plus
/// `n * TICK_OFFSET`. The vertex buffer is reallocated at a different,
/// unaligned address on every tick.
#[derive(Debug, Clone)]
pub struct RecordingEngine {
    initial: Vec<f32>,
    frame: u64,
    memory: Vec<u8>,
    address: usize,
    calls: Vec<EngineCall>,
    reported_vertex_count: Option<usize>,
}

impl RecordingEngine {
    pub fn for_mesh(mesh: &Mesh) -> Self {
        Self::with_positions(mesh.positions().to_vec())
    }

    fn with_positions(initial: Vec<f32>) -> Self {
        let mut engine = Self {
            initial,
            frame: 0,
            memory: Vec::new(),
            address: 0,
            calls: Vec::new(),
            reported_vertex_count: None,
        };
        engine.publish();
        engine
    }

    /// Lie about the vertex count from now on
    pub fn with_reported_vertex_count(mut self, count: usize) -> Self {
        self.reported_vertex_count = Some(count);
        self
    }

    pub fn calls(&self) -> &[EngineCall] {
        &self.calls
    }

    pub fn tick_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|call| matches!(call, EngineCall::Tick(_)))
            .count()
    }

    /// Positions the engine publishes after `frame` ticks
    pub fn expected_positions(&self, frame: u64) -> Vec<f32> {
        let offset = frame as f32 * TICK_OFFSET;
        self.initial.iter().map(|value| value + offset).collect()
    }

    pub fn vertex_buffer_len(&self) -> usize {
        self.initial.len()
    }

    fn publish(&mut self) {
        let positions = self.expected_positions(self.frame);
        self.address = 1 + (self.frame as usize % 4) * 7;

        let mut memory = vec![0xEE; self.address];
        memory.extend_from_slice(bytemuck::cast_slice(positions.as_slice()));
        memory.extend_from_slice(&[0xEE; 9]);
        self.memory = memory;
    }
}

impl DeformationEngine for RecordingEngine {
    fn construct(positions: &[f32], indices: &[u32]) -> Result<Self, EngineError> {
        if positions.is_empty() || positions.len() % 3 != 0 {
            return Err(EngineError(format!(
                "cannot simulate {} position floats",
                positions.len()
            )));
        }
        if indices.len() % 3 != 0 {
            return Err(EngineError("index count is not a multiple of 3".to_string()));
        }
        Ok(Self::with_positions(positions.to_vec()))
    }

    fn tick(&mut self, delta_seconds: f32) {
        self.calls.push(EngineCall::Tick(delta_seconds));
        self.frame += 1;
        self.publish();
    }

    fn on_pointer_down(&mut self, vertex: u32, target: Vec3) {
        self.calls.push(EngineCall::PointerDown(vertex, target));
    }

    fn on_pointer_move(&mut self, target: Vec3) {
        self.calls.push(EngineCall::PointerMove(target));
    }

    fn on_pointer_up(&mut self) {
        self.calls.push(EngineCall::PointerUp);
    }

    fn vertex_count(&self) -> usize {
        self.reported_vertex_count
            .unwrap_or(self.initial.len() / 3)
    }

    fn vertex_buffer_address(&self) -> usize {
        self.address
    }

    fn memory(&self) -> &[u8] {
        &self.memory
    }
}

/// Detector double returning a fixed result
#[derive(Debug)]
pub struct ScriptedDetector {
    result: Result<Vec<DetectionBox>, DetectionError>,
    calls: Cell<usize>,
}

impl ScriptedDetector {
    pub fn faces(boxes: Vec<DetectionBox>) -> Self {
        Self {
            result: Ok(boxes),
            calls: Cell::new(0),
        }
    }

    pub fn failing(error: DetectionError) -> Self {
        Self {
            result: Err(error),
            calls: Cell::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl FaceDetector for ScriptedDetector {
    fn detect(&self, _image_bytes: &[u8]) -> Result<Vec<DetectionBox>, DetectionError> {
        self.calls.set(self.calls.get() + 1);
        self.result.clone()
    }
}

/// Filter double: decodes the image and maps every RGBA byte
pub struct MappingFilter {
    name: &'static str,
    map: fn(u8) -> u8,
    drop_last_pixel: bool,
    inputs: RefCell<Vec<Vec<u8>>>,
}

impl MappingFilter {
    pub fn new(name: &'static str, map: fn(u8) -> u8) -> Self {
        Self {
            name,
            map,
            drop_last_pixel: false,
            inputs: RefCell::new(Vec::new()),
        }
    }

    pub fn invert() -> Self {
        Self::new("invert", |byte| 255 - byte)
    }

    /// Returns one pixel too few
    pub fn truncating() -> Self {
        Self {
            drop_last_pixel: true,
            ..Self::new("truncating", |byte| byte)
        }
    }

    /// Every byte buffer this filter was called with
    pub fn inputs(&self) -> Vec<Vec<u8>> {
        self.inputs.borrow().clone()
    }
}

impl ImageFilter for MappingFilter {
    fn name(&self) -> &str {
        self.name
    }

    fn apply(&self, image_bytes: &[u8]) -> Result<Vec<u8>, FilterError> {
        self.inputs.borrow_mut().push(image_bytes.to_vec());

        let mut pixels = image::load_from_memory(image_bytes)
            .map_err(|err| FilterError::malformed(err.to_string()))?
            .to_rgba8()
            .into_raw();
        pixels.iter_mut().for_each(|byte| *byte = (self.map)(*byte));
        if self.drop_last_pixel {
            pixels.truncate(pixels.len().saturating_sub(4));
        }
        Ok(pixels)
    }
}

/// Filter double that always fails
pub struct FailingFilter {
    malformed: bool,
}

impl FailingFilter {
    pub fn malformed() -> Self {
        Self { malformed: true }
    }

    pub fn internal() -> Self {
        Self { malformed: false }
    }
}

impl ImageFilter for FailingFilter {
    fn name(&self) -> &str {
        "failing"
    }

    fn apply(&self, _image_bytes: &[u8]) -> Result<Vec<u8>, FilterError> {
        if self.malformed {
            Err(FilterError::malformed("unreadable image"))
        } else {
            Err(FilterError::internal("filter crashed"))
        }
    }
}

/// Encode a `width` x `height` gradient as PNG
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let image = RgbaImage::from_fn(width, height, |x, y| {
        Rgba([(x * 7 % 256) as u8, (y * 13 % 256) as u8, 128, 255])
    });
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .expect("PNG encoding into memory");
    bytes
}

/// Flat grid in the z = 0 plane spanning `min..max`.
///
/// Vertices are row-major from `min`; each cell is split along the diagonal
/// from its lower-left to its upper-right corner.
pub fn plane_mesh(min: Vec2, max: Vec2, subdivisions: u32) -> Mesh {
    let n = subdivisions.max(1);
    let step = (max - min) / n as f32;

    let mut positions = Vec::with_capacity(((n + 1) * (n + 1) * 3) as usize);
    for row in 0..=n {
        for column in 0..=n {
            positions.extend_from_slice(&[
                min.x + column as f32 * step.x,
                min.y + row as f32 * step.y,
                0.0,
            ]);
        }
    }

    let mut indices = Vec::with_capacity((n * n * 6) as usize);
    for row in 0..n {
        for column in 0..n {
            let a = row * (n + 1) + column;
            let b = a + 1;
            let c = a + n + 1;
            let d = c + 1;
            indices.extend_from_slice(&[a, b, d, a, d, c]);
        }
    }

    Mesh::new(positions, indices).expect("grid topology is valid")
}

/// Square grid centered on the origin with half-size `extent`
pub fn grid_mesh(subdivisions: u32, extent: f32) -> Mesh {
    plane_mesh(Vec2::splat(-extent), Vec2::splat(extent), subdivisions)
}

/// 9 x 9 vertex plane covering the whole view of the default camera.
///
/// The grid is slightly off-center so that rays through the view center and
/// common landmark positions land inside triangles, not on shared edges.
pub fn full_view_plane() -> Mesh {
    plane_mesh(Vec2::new(-2.05, -2.13), Vec2::new(1.95, 1.87), 8)
}
