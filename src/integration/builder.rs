//! Builder assembling a [`Detection`] from whichever box layout a backend
//! emits.

use super::Detection;

/// Collects a box, a score and a class label into a [`Detection`].
///
/// Every box setter stores the TLBR corners, so the last one called wins.
/// The class label is carried through for rendering only; tracking and
/// fusion never look at it.
#[derive(Debug, Clone, Default)]
pub struct DetectionBuilder {
    corners: [f32; 4],
    score: f32,
    class_id: u32,
}

impl DetectionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Corners as (x1, y1, x2, y2).
    pub fn tlbr(self, x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self {
            corners: [x1, y1, x2, y2],
            ..self
        }
    }

    /// Center point and size, as emitted by YOLO-style heads.
    pub fn xywh(self, cx: f32, cy: f32, w: f32, h: f32) -> Self {
        let (half_w, half_h) = (w / 2.0, h / 2.0);
        self.tlbr(cx - half_w, cy - half_h, cx + half_w, cy + half_h)
    }

    /// Left, top, width and height.
    pub fn tlwh(self, x: f32, y: f32, w: f32, h: f32) -> Self {
        self.tlbr(x, y, x + w, y + h)
    }

    pub fn score(self, score: f32) -> Self {
        Self { score, ..self }
    }

    pub fn class_id(self, class_id: u32) -> Self {
        Self { class_id, ..self }
    }

    pub fn build(self) -> Detection {
        let [x1, y1, x2, y2] = self.corners;
        Detection::new(x1, y1, x2, y2, self.score).with_class(self.class_id)
    }
}
