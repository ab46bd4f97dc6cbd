//! Vector labels and the per-tile fragments derived from them.

pub mod io_geojson;

use std::fmt;

use crate::geo::{Coord, Extent, Geographic};

/// Identifier of an original label, carried by every fragment cut from it.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LabelId(pub String);

impl LabelId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for LabelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LabelId({})", self.0)
    }
}

impl fmt::Display for LabelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Position of a fragment in the fragment collection.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FragmentId(pub usize);

impl FragmentId {
    #[inline]
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Debug for FragmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FragmentId({})", self.0)
    }
}

impl fmt::Display for FragmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub type Ring = Vec<Coord<Geographic>>;

/// A polygon with one exterior ring and optional holes.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Polygon {
    pub exterior: Ring,
    pub interiors: Vec<Ring>,
}

impl Polygon {
    pub fn new(exterior: Ring) -> Self {
        Self {
            exterior,
            interiors: Vec::new(),
        }
    }

    pub fn with_interiors(exterior: Ring, interiors: Vec<Ring>) -> Self {
        Self {
            exterior,
            interiors,
        }
    }
}

/// Geometry of a label or fragment.
///
/// Every GeoJSON geometry type is representable so that non-polygon input
/// survives reading and is rejected, with context, where it is converted.
#[derive(Clone, Debug, PartialEq)]
pub enum LabelGeometry {
    Point(Coord<Geographic>),
    MultiPoint(Vec<Coord<Geographic>>),
    LineString(Vec<Coord<Geographic>>),
    MultiLineString(Vec<Vec<Coord<Geographic>>>),
    Polygon(Polygon),
    MultiPolygon(Vec<Polygon>),
    GeometryCollection(Vec<LabelGeometry>),
}

impl LabelGeometry {
    /// The GeoJSON type name.
    pub fn kind(&self) -> &'static str {
        match self {
            LabelGeometry::Point(_) => "Point",
            LabelGeometry::MultiPoint(_) => "MultiPoint",
            LabelGeometry::LineString(_) => "LineString",
            LabelGeometry::MultiLineString(_) => "MultiLineString",
            LabelGeometry::Polygon(_) => "Polygon",
            LabelGeometry::MultiPolygon(_) => "MultiPolygon",
            LabelGeometry::GeometryCollection(_) => "GeometryCollection",
        }
    }

    /// Bounding rectangle of all vertices, `None` when there are none.
    pub fn envelope(&self) -> Option<Extent<Geographic>> {
        let mut points = Vec::new();
        self.collect_points(&mut points);
        Extent::enclosing(points)
    }

    fn collect_points<'a>(&'a self, out: &mut Vec<&'a Coord<Geographic>>) {
        match self {
            LabelGeometry::Point(p) => out.push(p),
            LabelGeometry::MultiPoint(points) | LabelGeometry::LineString(points) => {
                out.extend(points)
            }
            LabelGeometry::MultiLineString(lines) => out.extend(lines.iter().flatten()),
            LabelGeometry::Polygon(polygon) => out.extend(&polygon.exterior),
            LabelGeometry::MultiPolygon(polygons) => {
                out.extend(polygons.iter().flat_map(|p| &p.exterior))
            }
            LabelGeometry::GeometryCollection(children) => {
                for child in children {
                    child.collect_points(out);
                }
            }
        }
    }
}

/// A label as read from the vector source.
#[derive(Clone, Debug, PartialEq)]
pub struct Label {
    pub id: LabelId,
    /// File name of the tile the label was already assigned to, if any.
    pub tile: Option<String>,
    pub geometry: LabelGeometry,
}

/// The part of a label that falls inside one tile.
#[derive(Clone, Debug, PartialEq)]
pub struct LabelFragment {
    pub id: FragmentId,
    /// Originating label.
    pub label: LabelId,
    /// Tile the fragment was cut for. `None` lets the linker decide by
    /// geometry.
    pub tile: Option<String>,
    pub geometry: LabelGeometry,
}

impl LabelFragment {
    /// Takes pre-clipped labels as fragments, numbering them in order.
    pub fn from_labels(labels: Vec<Label>) -> Vec<LabelFragment> {
        labels
            .into_iter()
            .enumerate()
            .map(|(i, label)| LabelFragment {
                id: FragmentId(i),
                label: label.id,
                tile: label.tile,
                geometry: label.geometry,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(x: f64, y: f64, size: f64) -> Ring {
        vec![
            Coord::new(x, y),
            Coord::new(x + size, y),
            Coord::new(x + size, y + size),
            Coord::new(x, y + size),
            Coord::new(x, y),
        ]
    }

    #[test]
    fn envelope_covers_all_parts() {
        let geometry = LabelGeometry::MultiPolygon(vec![
            Polygon::new(square(0.0, 0.0, 1.0)),
            Polygon::new(square(5.0, 3.0, 2.0)),
        ]);
        assert_eq!(
            geometry.envelope(),
            Some(Extent::from_xyxy(0.0, 0.0, 7.0, 5.0))
        );
        assert_eq!(geometry.kind(), "MultiPolygon");
    }

    #[test]
    fn empty_collection_has_no_envelope() {
        assert_eq!(LabelGeometry::GeometryCollection(vec![]).envelope(), None);
    }

    #[test]
    fn fragments_from_labels_keep_order() {
        let labels = vec![
            Label {
                id: LabelId::new("7"),
                tile: Some("a.tif".into()),
                geometry: LabelGeometry::Polygon(Polygon::new(square(0.0, 0.0, 1.0))),
            },
            Label {
                id: LabelId::new("9"),
                tile: None,
                geometry: LabelGeometry::Point(Coord::new(1.0, 1.0)),
            },
        ];
        let fragments = LabelFragment::from_labels(labels);
        assert_eq!(fragments[1].id, FragmentId(1));
        assert_eq!(fragments[1].label.as_str(), "9");
        assert_eq!(fragments[0].tile.as_deref(), Some("a.tif"));
    }
}
