//! Detector collaborator interface.

use tracing::warn;

use crate::tracker::BBox;

/// Coordinates that truncate to an `i32` without saturating.
const PIXEL_RANGE: std::ops::RangeInclusive<f32> = (i32::MIN as f32)..=(i32::MAX as f32);

/// Detection as produced by an inference backend.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    /// Bounding box in TLBR format (x1, y1, x2, y2), pixels.
    pub bbox: [f32; 4],
    /// Detection confidence score
    pub score: f32,
    /// Backend class label. Ignored by tracking.
    pub class_id: u32,
}

impl Detection {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32, score: f32) -> Self {
        Self {
            bbox: [x1, y1, x2, y2],
            score,
            class_id: 0,
        }
    }

    pub fn with_class(mut self, class_id: u32) -> Self {
        self.class_id = class_id;
        self
    }

    /// Integer pixel box, truncating coordinates toward zero. Returns `None`
    /// when a coordinate is not finite or does not fit an `i32` pixel index.
    pub fn to_bbox(&self) -> Option<BBox> {
        if self.bbox.iter().any(|v| !v.is_finite()) {
            warn!(bbox = ?self.bbox, "dropping detection with non-finite coordinates");
            return None;
        }
        if self.bbox.iter().any(|&v| !PIXEL_RANGE.contains(&v)) {
            warn!(bbox = ?self.bbox, "dropping detection with out-of-range coordinates");
            return None;
        }
        let [x1, y1, x2, y2] = self.bbox;
        Some(BBox::new(x1 as i32, y1 as i32, x2 as i32, y2 as i32))
    }
}

/// Trait for object detection inference backends.
///
/// Implement this trait to feed any detection model into a
/// [`TrackerPipeline`](super::TrackerPipeline).
///
/// # Example
///
/// ```ignore
/// use depthtrack::{Detection, DetectionSource};
///
/// struct MyDetector {
///     // Your model here
/// }
///
/// impl DetectionSource for MyDetector {
///     type Error = std::io::Error;
///
///     fn detect(&mut self, input: &[u8], width: u32, height: u32) -> Result<Vec<Detection>, Self::Error> {
///         Ok(vec![])
///     }
/// }
/// ```
pub trait DetectionSource {
    /// Error type for detection failures.
    type Error: std::error::Error + 'static;

    /// Run inference on raw colour image data and return every detection,
    /// unfiltered. Confidence filtering happens in the pipeline.
    fn detect(
        &mut self,
        input: &[u8],
        width: u32,
        height: u32,
    ) -> Result<Vec<Detection>, Self::Error>;
}

/// Helper trait for converting model-specific outputs to `Detection`.
pub trait IntoDetections {
    fn into_detections(self) -> Vec<Detection>;
}

impl IntoDetections for Vec<Detection> {
    fn into_detections(self) -> Vec<Detection> {
        self
    }
}

impl IntoDetections for &[Detection] {
    fn into_detections(self) -> Vec<Detection> {
        self.to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::Centroid;

    #[test]
    fn test_to_bbox_truncates() {
        let det = Detection::new(10.9, 20.2, 50.5, 80.99, 0.9);
        assert_eq!(det.to_bbox(), Some(BBox::new(10, 20, 50, 80)));
    }

    #[test]
    fn test_to_bbox_rejects_out_of_range() {
        assert_eq!(Detection::new(2.0e9, 10.0, 3.0e9, 20.0, 0.9).to_bbox(), None);
        assert_eq!(Detection::new(-3.0e9, 10.0, 0.0, 20.0, 0.9).to_bbox(), None);

        let det = Detection::new(2.0e9, 10.0, 2.1e9, 20.0, 0.9);
        let bbox = det.to_bbox().unwrap();
        assert_eq!(bbox.centroid(), Centroid::new(2_050_000_000, 15));
    }

    #[test]
    fn test_to_bbox_rejects_nan() {
        let det = Detection::new(f32::NAN, 0.0, 10.0, 10.0, 0.9);
        assert_eq!(det.to_bbox(), None);
    }
}
