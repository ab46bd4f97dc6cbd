//! Distribution of labels onto tiles.
//!
//! Every label is cut along the edges of each tile it overlaps, giving one
//! fragment per (label, tile) pair. Polygons are intersected with the tile
//! rectangle through `geo`'s boolean operations, so a concave label that
//! leaves and re-enters a tile comes back as several parts.

use ::geo::{BooleanOps, LineString, MultiPolygon, Rect};
use log::{debug, info};

use crate::geo::{ring_signed_area, Coord, Extent, Geographic};
use crate::label::{FragmentId, Label, LabelFragment, LabelGeometry, Polygon, Ring};
use crate::tile::TileRegistry;

type GeoPolygon = ::geo::Polygon<f64>;

/// Cuts every label into per-tile fragments.
///
/// Labels are visited in input order and, for each label, tiles in registry
/// order, so fragment numbering is deterministic. Labels whose clipped area
/// on a tile is zero (touching the tile edge only) produce no fragment there.
pub fn clip_labels(registry: &TileRegistry, labels: &[Label]) -> Vec<LabelFragment> {
    let tree = registry.spatial_index();
    let mut fragments = Vec::new();

    for label in labels {
        let Some(envelope) = label.geometry.envelope() else {
            debug!("Label {} has no vertices, skipped", label.id);
            continue;
        };

        let mut candidates: Vec<usize> = tree
            .locate_in_envelope_intersecting(&envelope.to_aabb())
            .map(|b| b.index)
            .collect();
        candidates.sort_unstable();

        for index in candidates {
            let Some(tile) = registry.get(index) else {
                continue;
            };
            if let Some(geometry) = clip_geometry(&label.geometry, tile.extent()) {
                fragments.push(LabelFragment {
                    id: FragmentId(fragments.len()),
                    label: label.id.clone(),
                    tile: Some(tile.file_name().to_string()),
                    geometry,
                });
            }
        }
    }

    info!(
        "Distributed {} label(s) into {} fragment(s) over {} tile(s)",
        labels.len(),
        fragments.len(),
        registry.len()
    );
    fragments
}

/// Clips a geometry to a rectangle. `None` when nothing areal remains.
///
/// One surviving part gives a `Polygon`, several a `MultiPolygon`.
/// Non-areal geometries are not clipped: they are kept whole for every
/// rectangle their envelope touches so the transformer can reject them with
/// the tile they belong to.
pub fn clip_geometry(geometry: &LabelGeometry, window: &Extent<Geographic>) -> Option<LabelGeometry> {
    let subject = match geometry {
        LabelGeometry::Polygon(polygon) => MultiPolygon::new(vec![to_geo(polygon)]),
        LabelGeometry::MultiPolygon(polygons) => {
            MultiPolygon::new(polygons.iter().map(to_geo).collect())
        }
        other => {
            return other
                .envelope()
                .filter(|e| e.intersects(window))
                .map(|_| other.clone())
        }
    };

    let mut parts = clip_parts(&subject, window);
    match parts.len() {
        0 => None,
        1 => parts.pop().map(LabelGeometry::Polygon),
        _ => Some(LabelGeometry::MultiPolygon(parts)),
    }
}

/// Intersects polygons with the window and returns the parts that enclose
/// area. Vertices are clamped onto the window to absorb rounding residue.
fn clip_parts(subject: &MultiPolygon<f64>, window: &Extent<Geographic>) -> Vec<Polygon> {
    let rect = Rect::new(
        ::geo::coord! { x: window.xmin(), y: window.ymin() },
        ::geo::coord! { x: window.xmax(), y: window.ymax() },
    )
    .to_polygon();

    subject
        .intersection(&rect)
        .into_iter()
        .filter_map(|part| {
            let exterior = from_geo(part.exterior(), window)?;
            let interiors = part
                .interiors()
                .iter()
                .filter_map(|ring| from_geo(ring, window))
                .collect();
            Some(Polygon::with_interiors(exterior, interiors))
        })
        .collect()
}

fn to_geo(polygon: &Polygon) -> GeoPolygon {
    let ring = |points: &Ring| -> LineString<f64> {
        points
            .iter()
            .map(|p| ::geo::coord! { x: p.x, y: p.y })
            .collect()
    };
    GeoPolygon::new(
        ring(&polygon.exterior),
        polygon.interiors.iter().map(ring).collect(),
    )
}

/// Closed ring clamped to the window, or `None` when it encloses no area.
fn from_geo(ring: &LineString<f64>, window: &Extent<Geographic>) -> Option<Ring> {
    let mut points: Ring = ring
        .coords()
        .map(|c| {
            Coord::new(
                c.x.clamp(window.xmin(), window.xmax()),
                c.y.clamp(window.ymin(), window.ymax()),
            )
        })
        .collect();
    points.dedup();
    if points.len() > 1 && points.first() == points.last() {
        points.pop();
    }
    if points.len() < 3 || ring_signed_area(&points) == 0.0 {
        return None;
    }

    points.push(points[0]);
    Some(points)
}
