//! Axis-aligned rectangles in canonical XYXY format.

use rstar::AABB;

use super::coord::Coord;

/// An axis-aligned rectangle in XYXY format (xmin, ymin, xmax, ymax).
///
/// Used both for tile footprints ([`Geographic`](super::Geographic)) and for
/// annotation boxes ([`Pixel`](super::Pixel)).
///
/// The constructor does not enforce `min <= max`; a tile with a north-up
/// transform yields an ordered extent, anything else is reported by the
/// registry builder.
#[derive(Clone, Copy, PartialEq)]
pub struct Extent<TSpace> {
    pub min: Coord<TSpace>,
    pub max: Coord<TSpace>,
}

impl<TSpace> Extent<TSpace> {
    /// Creates a new extent from min and max coordinates.
    #[inline]
    pub fn new(min: Coord<TSpace>, max: Coord<TSpace>) -> Self {
        Self { min, max }
    }

    /// Creates a new extent from explicit coordinates.
    #[inline]
    pub fn from_xyxy(xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> Self {
        Self {
            min: Coord::new(xmin, ymin),
            max: Coord::new(xmax, ymax),
        }
    }

    /// Smallest extent containing every point, or `None` for an empty input.
    pub fn enclosing<'a, I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Coord<TSpace>>,
        TSpace: 'a,
    {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut extent = Self::from_xyxy(first.x, first.y, first.x, first.y);
        for p in iter {
            extent.min.x = extent.min.x.min(p.x);
            extent.min.y = extent.min.y.min(p.y);
            extent.max.x = extent.max.x.max(p.x);
            extent.max.y = extent.max.y.max(p.y);
        }
        Some(extent)
    }

    #[inline]
    pub fn xmin(&self) -> f64 {
        self.min.x
    }

    #[inline]
    pub fn ymin(&self) -> f64 {
        self.min.y
    }

    #[inline]
    pub fn xmax(&self) -> f64 {
        self.max.x
    }

    #[inline]
    pub fn ymax(&self) -> f64 {
        self.max.y
    }

    /// Returns the width of the extent.
    ///
    /// May be negative if the extent is malformed (xmax < xmin).
    #[inline]
    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    /// Returns the height of the extent.
    ///
    /// May be negative if the extent is malformed (ymax < ymin).
    #[inline]
    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    #[inline]
    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    /// Returns true if all coordinates are finite (not NaN or infinite).
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.min.is_finite() && self.max.is_finite()
    }

    /// Returns true if the extent is properly ordered (min <= max for both axes).
    #[inline]
    pub fn is_ordered(&self) -> bool {
        self.min.x <= self.max.x && self.min.y <= self.max.y
    }

    /// Returns true if the extent encloses no area.
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.width() <= 0.0 || self.height() <= 0.0
    }

    /// Closed intersection test: touching edges count as intersecting.
    pub fn intersects(&self, other: &Self) -> bool {
        self.min.x <= other.max.x
            && other.min.x <= self.max.x
            && self.min.y <= other.max.y
            && other.min.y <= self.max.y
    }

    /// Area shared by both extents, zero when they only touch or are disjoint.
    pub fn overlap_area(&self, other: &Self) -> f64 {
        let w = self.max.x.min(other.max.x) - self.min.x.max(other.min.x);
        let h = self.max.y.min(other.max.y) - self.min.y.max(other.min.y);
        if w <= 0.0 || h <= 0.0 {
            0.0
        } else {
            w * h
        }
    }

    /// Returns true if `other` lies inside this extent (boundary included).
    pub fn contains(&self, other: &Self) -> bool {
        self.min.x <= other.min.x
            && self.min.y <= other.min.y
            && other.max.x <= self.max.x
            && other.max.y <= self.max.y
    }

    /// The extent as an R-tree envelope.
    pub fn to_aabb(&self) -> AABB<[f64; 2]> {
        AABB::from_corners(self.min.to_array(), self.max.to_array())
    }

    /// Returns the extent as `(x, y, width, height)`, the COCO bbox layout.
    #[inline]
    pub fn to_xywh(&self) -> (f64, f64, f64, f64) {
        (self.xmin(), self.ymin(), self.width(), self.height())
    }
}

impl<TSpace> std::fmt::Debug for Extent<TSpace> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Extent")
            .field("xmin", &self.min.x)
            .field("ymin", &self.min.y)
            .field("xmax", &self.max.x)
            .field("ymax", &self.max.y)
            .finish()
    }
}

impl<TSpace> Default for Extent<TSpace> {
    fn default() -> Self {
        Self::from_xyxy(0.0, 0.0, 0.0, 0.0)
    }
}
