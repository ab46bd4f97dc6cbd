//! Geometric primitives shared by the whole pipeline.
//!
//! Coordinates carry a zero-sized marker for the space they live in
//! ([`Geographic`] map units or [`Pixel`] image units), so a label vertex
//! can only reach an annotation through [`PixelMapper`].

mod affine;
mod coord;
mod extent;
pub mod pixel;
mod space;
pub mod wkt;

pub use affine::GeoTransform;
pub use coord::{ring_signed_area, Coord};
pub use extent::Extent;
pub use pixel::{fragment_to_pixels, OutsideTile, PixelMapper, PixelRing};
pub use space::{Geographic, Pixel};
pub use wkt::{root_epsg, Epsg};
