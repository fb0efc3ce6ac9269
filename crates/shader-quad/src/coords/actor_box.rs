/// Layout box of a drawable, in logical pixels (top-left origin).
///
/// Stored as two corners, `(x1, y1)` top-left and `(x2, y2)` bottom-right,
/// the way the host scene graph hands out allocations.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct ActorBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl ActorBox {
    #[inline]
    pub const fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    #[inline]
    pub const fn from_origin_size(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self::new(x, y, x + width, y + height)
    }

    #[inline]
    pub fn width(self) -> f32 {
        self.x2 - self.x1
    }

    #[inline]
    pub fn height(self) -> f32 {
        self.y2 - self.y1
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.width() <= 0.0 || self.height() <= 0.0
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.x1.is_finite() && self.y1.is_finite() && self.x2.is_finite() && self.y2.is_finite()
    }

    /// Orders the corners so that `x1 <= x2` and `y1 <= y2`.
    #[inline]
    pub fn normalized(self) -> Self {
        Self {
            x1: self.x1.min(self.x2),
            y1: self.y1.min(self.y2),
            x2: self.x1.max(self.x2),
            y2: self.y1.max(self.y2),
        }
    }

    #[inline]
    pub(crate) fn to_array(self) -> [f32; 4] {
        [self.x1, self.y1, self.x2, self.y2]
    }
}
