//! Typed coordinate values using PhantomData for compile-time safety.

use std::marker::PhantomData;

/// A 2D coordinate with a type-level marker for the coordinate space.
///
/// The `TSpace` parameter is either [`Geographic`](super::Geographic) or
/// [`Pixel`](super::Pixel), so a map vertex can never be written into an
/// annotation without going through the tile transform.
#[derive(Clone, Copy, PartialEq)]
pub struct Coord<TSpace> {
    pub x: f64,
    pub y: f64,
    _space: PhantomData<TSpace>,
}

impl<TSpace> Coord<TSpace> {
    /// Creates a new coordinate with the given x and y values.
    #[inline]
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            _space: PhantomData,
        }
    }

    /// Returns true if both coordinates are finite (not NaN or infinite).
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    #[inline]
    pub fn to_array(&self) -> [f64; 2] {
        [self.x, self.y]
    }
}

impl<TSpace> std::fmt::Debug for Coord<TSpace> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coord")
            .field("x", &self.x)
            .field("y", &self.y)
            .finish()
    }
}

impl<TSpace> Default for Coord<TSpace> {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

/// Signed shoelace area of a ring.
///
/// Positive for counter-clockwise rings in a y-up space. A closing vertex
/// equal to the first one contributes nothing, so open and closed rings
/// give the same result.
pub fn ring_signed_area<TSpace>(ring: &[Coord<TSpace>]) -> f64 {
    if ring.len() < 3 {
        return 0.0;
    }

    let mut twice_area = 0.0;
    for (i, a) in ring.iter().enumerate() {
        let b = &ring[(i + 1) % ring.len()];
        twice_area += a.x * b.y - b.x * a.y;
    }
    twice_area / 2.0
}
