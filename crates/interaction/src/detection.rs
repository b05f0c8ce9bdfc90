//! Face detector contract and detection boxes.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::DetectionError;

/// Axis-aligned face rectangle in image pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectionBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl DetectionBox {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new((self.x1 + self.x2) / 2.0, (self.y1 + self.y2) / 2.0)
    }

    /// Top-left, top-right, bottom-left, bottom-right, center
    pub fn landmarks(&self) -> [Vec2; 5] {
        [
            Vec2::new(self.x1, self.y1),
            Vec2::new(self.x2, self.y1),
            Vec2::new(self.x1, self.y2),
            Vec2::new(self.x2, self.y2),
            self.center(),
        ]
    }
}

/// Opaque face detector
pub trait FaceDetector {
    /// Detect faces in encoded image bytes, in detector order
    fn detect(&self, image_bytes: &[u8]) -> Result<Vec<DetectionBox>, DetectionError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_landmark_order() {
        let landmarks = DetectionBox::new(10.0, 20.0, 50.0, 60.0).landmarks();
        assert_eq!(
            landmarks,
            [
                Vec2::new(10.0, 20.0),
                Vec2::new(50.0, 20.0),
                Vec2::new(10.0, 60.0),
                Vec2::new(50.0, 60.0),
                Vec2::new(30.0, 40.0),
            ]
        );
    }

    #[test]
    fn test_box_from_json() {
        let detected: Vec<DetectionBox> =
            serde_json::from_str(r#"[{"x1":1,"y1":2,"x2":3,"y2":4}]"#).unwrap();
        assert_eq!(detected, vec![DetectionBox::new(1.0, 2.0, 3.0, 4.0)]);
    }
}
