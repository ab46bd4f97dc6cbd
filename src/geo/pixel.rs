//! Conversion of label geometry from map coordinates to tile pixels.

use log::warn;

use super::coord::{ring_signed_area, Coord};
use super::extent::Extent;
use super::space::{Geographic, Pixel};
use crate::error::PrepError;
use crate::label::{LabelFragment, LabelGeometry};
use crate::tile::Tile;

/// How far outside the image (in pixels) a vertex may land and still be
/// snapped onto the border. Covers floating-point residue of vertices that
/// lie exactly on the tile edge.
pub const BOUNDS_TOLERANCE: f64 = 1e-6;

/// Maps map coordinates onto one tile's pixel grid.
#[derive(Clone, Copy, Debug)]
pub struct PixelMapper {
    extent: Extent<Geographic>,
    width: f64,
    height: f64,
    x_span: f64,
    y_span: f64,
}

/// A vertex that fell outside the tile after conversion.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OutsideTile {
    pub vertex: usize,
    pub pixel: Coord<Pixel>,
}

impl PixelMapper {
    pub fn new(extent: Extent<Geographic>, width: u32, height: u32) -> Self {
        let width = f64::from(width);
        let height = f64::from(height);
        Self {
            extent,
            width,
            height,
            x_span: width / extent.width(),
            y_span: height / extent.height(),
        }
    }

    pub fn for_tile(tile: &Tile) -> Self {
        Self::new(*tile.extent(), tile.width(), tile.height())
    }

    /// Unchecked conversion. Image rows grow downwards while map y grows
    /// northwards, hence the flip.
    #[inline]
    pub fn to_pixel(&self, point: &Coord<Geographic>) -> Coord<Pixel> {
        Coord::new(
            (point.x - self.extent.xmin()) * self.x_span,
            self.height - (point.y - self.extent.ymin()) * self.y_span,
        )
    }

    /// Converts a vertex and checks it against `[0, width] x [0, height]`.
    ///
    /// Values within [`BOUNDS_TOLERANCE`] of the border are snapped onto it.
    pub fn to_pixel_checked(&self, point: &Coord<Geographic>) -> Option<Coord<Pixel>> {
        let p = self.to_pixel(point);
        let x = snap(p.x, self.width)?;
        let y = snap(p.y, self.height)?;
        Some(Coord::new(x, y))
    }

    /// Converts every vertex of a ring, stopping at the first one outside.
    pub fn map_ring(&self, ring: &[Coord<Geographic>]) -> Result<PixelRing, OutsideTile> {
        ring.iter()
            .enumerate()
            .map(|(vertex, point)| {
                self.to_pixel_checked(point).ok_or(OutsideTile {
                    vertex,
                    pixel: self.to_pixel(point),
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(PixelRing)
    }
}

fn snap(value: f64, limit: f64) -> Option<f64> {
    if !value.is_finite() {
        return None;
    }
    if (0.0..=limit).contains(&value) {
        Some(value)
    } else if value < 0.0 && value >= -BOUNDS_TOLERANCE {
        Some(0.0)
    } else if value > limit && value <= limit + BOUNDS_TOLERANCE {
        Some(limit)
    } else {
        None
    }
}

/// A single polygon ring in pixel space.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PixelRing(pub Vec<Coord<Pixel>>);

impl PixelRing {
    pub fn vertices(&self) -> &[Coord<Pixel>] {
        &self.0
    }

    /// `[x1, y1, x2, y2, ...]`, the layout of a COCO polygon.
    pub fn flatten(&self) -> Vec<f64> {
        self.0.iter().flat_map(|c| [c.x, c.y]).collect()
    }

    pub fn extent(&self) -> Extent<Pixel> {
        Extent::enclosing(&self.0).unwrap_or_default()
    }

    pub fn area(&self) -> f64 {
        ring_signed_area(&self.0).abs()
    }
}

/// Converts a label fragment's exterior ring into the pixel space of `tile`.
///
/// Only single polygons are accepted. Interior rings are not representable
/// in a single COCO polygon and are dropped with a warning.
pub fn fragment_to_pixels(tile: &Tile, fragment: &LabelFragment) -> Result<PixelRing, PrepError> {
    let polygon = match &fragment.geometry {
        LabelGeometry::Polygon(polygon) => polygon,
        other => {
            return Err(PrepError::UnsupportedGeometryType {
                file: tile.file_name().to_string(),
                label: fragment.label.to_string(),
                kind: other.kind(),
            })
        }
    };

    if !polygon.interiors.is_empty() {
        warn!(
            "Label {} on tile {}: dropping {} interior ring(s)",
            fragment.label,
            tile.file_name(),
            polygon.interiors.len()
        );
    }

    PixelMapper::for_tile(tile)
        .map_ring(&polygon.exterior)
        .map_err(|outside| PrepError::LabelOutOfTileBounds {
            file: tile.file_name().to_string(),
            label: fragment.label.to_string(),
            vertex: outside.vertex,
            x: outside.pixel.x,
            y: outside.pixel.y,
            width: tile.width(),
            height: tile.height(),
        })
}
