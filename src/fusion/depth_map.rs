//! Dense per-pixel depth map aligned with the colour frame.

use ndarray::{Array2, ArrayView2, s};

use crate::error::DepthMapError;
use crate::tracker::BBox;

/// Depth (or disparity) values indexed as `[row, column]`, i.e. `[y, x]`.
#[derive(Debug, Clone, PartialEq)]
pub struct DepthMap {
    data: Array2<f32>,
}

impl DepthMap {
    pub fn new(data: Array2<f32>) -> Self {
        Self { data }
    }

    /// Build a depth map from a row-major buffer of `width * height` values.
    pub fn from_shape_vec(
        width: usize,
        height: usize,
        values: Vec<f32>,
    ) -> Result<Self, DepthMapError> {
        let len = values.len();
        Array2::from_shape_vec((height, width), values)
            .map(Self::new)
            .map_err(|_| DepthMapError { width, height, len })
    }

    pub fn width(&self) -> usize {
        self.data.ncols()
    }

    pub fn height(&self) -> usize {
        self.data.nrows()
    }

    pub fn get(&self, x: usize, y: usize) -> Option<f32> {
        self.data.get((y, x)).copied()
    }

    /// The part of the map covered by `bbox`, clipped to the map bounds.
    /// Boxes that fall outside the map, or have no area, give an empty view.
    pub fn region(&self, bbox: &BBox) -> ArrayView2<'_, f32> {
        let (x0, x1) = clip_span(bbox.x1, bbox.x2, self.width());
        let (y0, y1) = clip_span(bbox.y1, bbox.y2, self.height());
        self.data.slice(s![y0..y1, x0..x1])
    }

    /// Median depth inside `bbox`, or `None` when the region holds no valid
    /// sample.
    pub fn region_median(&self, bbox: &BBox) -> Option<f32> {
        if bbox.is_degenerate() {
            return None;
        }
        median(self.region(bbox).iter().copied())
    }
}

fn clip_span(lo: i32, hi: i32, len: usize) -> (usize, usize) {
    let clip = |v: i32| (v.max(0) as usize).min(len);
    let lo = clip(lo);
    (lo, clip(hi).max(lo))
}

/// Median of the finite values, averaging the two middle samples when the
/// count is even. Non-finite samples (invalid disparity) are ignored.
pub fn median(values: impl IntoIterator<Item = f32>) -> Option<f32> {
    let mut samples: Vec<f32> = values.into_iter().filter(|v| v.is_finite()).collect();
    if samples.is_empty() {
        return None;
    }

    let odd = samples.len() % 2 == 1;
    let mid = samples.len() / 2;
    let (lower, upper, _) = samples.select_nth_unstable_by(mid, f32::total_cmp);
    let upper = *upper;
    if odd {
        return Some(upper);
    }
    let below = lower.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    Some(((below as f64 + upper as f64) / 2.0) as f32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_median_odd_and_even() {
        assert_eq!(median([3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median([4.0, 1.0, 3.0, 2.0]), Some(2.5));
        assert_eq!(median([7.5]), Some(7.5));
    }

    #[test]
    fn test_median_skips_invalid_samples() {
        assert_eq!(median([f32::NAN, 1.0, f32::INFINITY, 3.0, 2.0]), Some(2.0));
        assert_eq!(median([f32::NAN, f32::NAN]), None);
        assert_eq!(median(std::iter::empty()), None);
    }

    #[test]
    fn test_zero_is_a_valid_median() {
        assert_eq!(median([0.0, 0.0, 5.0]), Some(0.0));
    }

    #[test]
    fn test_from_shape_vec() {
        let map = DepthMap::from_shape_vec(3, 2, vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        assert_eq!(map.width(), 3);
        assert_eq!(map.height(), 2);
        assert_eq!(map.get(2, 1), Some(5.0));
        assert_eq!(map.get(3, 0), None);

        let err = DepthMap::from_shape_vec(3, 3, vec![0.0; 4]).unwrap_err();
        assert_eq!(err.len, 4);
    }

    #[test]
    fn test_region_is_clipped() {
        let map = DepthMap::new(array![
            [1.0, 2.0, 3.0, 4.0],
            [5.0, 6.0, 7.0, 8.0],
            [9.0, 10.0, 11.0, 12.0],
        ]);
        let region = map.region(&BBox::new(1, 1, 3, 3));
        assert_eq!(region, array![[6.0f32, 7.0], [10.0, 11.0]]);

        let region = map.region(&BBox::new(-5, -5, 2, 1));
        assert_eq!(region, array![[1.0f32, 2.0]]);

        assert_eq!(map.region(&BBox::new(10, 10, 20, 20)).len(), 0);
        assert_eq!(map.region(&BBox::new(1, 1, 1, 3)).len(), 0);
    }

    #[test]
    fn test_region_median() {
        let map = DepthMap::new(Array2::from_elem((10, 10), 2.5));
        assert_relative_eq!(map.region_median(&BBox::new(0, 0, 4, 4)).unwrap(), 2.5);
        assert_eq!(map.region_median(&BBox::new(20, 20, 30, 30)), None);
    }
}
