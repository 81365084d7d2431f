/// Axis-aligned bounding box in integer pixel coordinates.
///
/// Stored in TLBR form: (x1, y1) is the top-left corner and (x2, y2) the
/// bottom-right corner, with `x1 <= x2` and `y1 <= y2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BBox {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl BBox {
    /// Create a box from TLBR corners. Swapped corners are reordered.
    #[inline]
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self {
            x1: x1.min(x2),
            y1: y1.min(y2),
            x2: x1.max(x2),
            y2: y1.max(y2),
        }
    }

    /// Create a box from top-left coordinates and dimensions (TLWH format).
    #[inline]
    pub fn from_tlwh(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self::new(x, y, x.saturating_add(width), y.saturating_add(height))
    }

    /// Convert to TLBR format: (x1, y1, x2, y2).
    #[inline]
    pub fn to_tlbr(&self) -> [i32; 4] {
        [self.x1, self.y1, self.x2, self.y2]
    }

    /// Width in pixels. Widened so that boxes spanning the whole `i32`
    /// range do not overflow.
    #[inline]
    pub fn width(&self) -> i64 {
        i64::from(self.x2) - i64::from(self.x1)
    }

    #[inline]
    pub fn height(&self) -> i64 {
        i64::from(self.y2) - i64::from(self.y1)
    }

    /// A box with no interior pixels.
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.x2 <= self.x1 || self.y2 <= self.y1
    }

    /// Geometric center with truncating division. This is the position a
    /// track adopts when matched to this box.
    #[inline]
    pub fn centroid(&self) -> Centroid {
        Centroid::new(
            (coord_sum(self.x1, self.x2) / 2) as i32,
            (coord_sum(self.y1, self.y2) / 2) as i32,
        )
    }

    /// Geometric center with floor division, used when re-associating a
    /// track centroid with a box of the same frame.
    #[inline]
    pub fn center_floor(&self) -> Centroid {
        Centroid::new(
            coord_sum(self.x1, self.x2).div_euclid(2) as i32,
            coord_sum(self.y1, self.y2).div_euclid(2) as i32,
        )
    }
}

/// Sum of two coordinates in `i64`. Half of it lies between the two, so
/// narrowing the midpoint back to `i32` is lossless.
#[inline]
fn coord_sum(a: i32, b: i32) -> i64 {
    i64::from(a) + i64::from(b)
}

/// Integer pixel position of a tracked object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Centroid {
    pub x: i32,
    pub y: i32,
}

impl Centroid {
    #[inline]
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance in pixels.
    pub fn distance(&self, other: &Centroid) -> f64 {
        nalgebra::distance(&self.to_point(), &other.to_point())
    }

    #[inline]
    fn to_point(self) -> nalgebra::Point2<f64> {
        nalgebra::Point2::new(self.x as f64, self.y as f64)
    }
}

impl From<(i32, i32)> for Centroid {
    fn from((x, y): (i32, i32)) -> Self {
        Self::new(x, y)
    }
}
