//! GeoJSON reader and writer for labels, fragments and tile footprints.
//!
//! Labels are read from a FeatureCollection. Per feature:
//! - `properties.label_id` (string or number), else the feature `id`, else
//!   the feature's position, identifies the label
//! - `properties.tile` optionally names the tile the label was already cut for
//!
//! The legacy `crs` member (`{"type": "name", "properties": {"name": ...}}`)
//! is honoured when present; GeoJSON without it is assumed to be in the
//! dataset's reference system.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use log::{info, warn};
use serde::de::Error as _;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use super::{Label, LabelFragment, LabelGeometry, LabelId, Polygon, Ring};
use crate::error::PrepError;
use crate::geo::{Coord, Epsg, Geographic};
use crate::tile::TileRegistry;

// ============================================================================
// GeoJSON Schema Types (internal to this module)
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
struct FeatureCollection {
    #[serde(rename = "type")]
    kind: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    crs: Option<NamedCrs>,

    features: Vec<Feature>,
}

#[derive(Debug, Serialize, Deserialize)]
struct NamedCrs {
    #[serde(rename = "type")]
    kind: String,
    properties: NamedCrsProperties,
}

#[derive(Debug, Serialize, Deserialize)]
struct NamedCrsProperties {
    name: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct Feature {
    #[serde(rename = "type")]
    kind: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<Value>,

    #[serde(default)]
    properties: Option<Map<String, Value>>,

    geometry: Option<GeometryObject>,
}

type Position = Vec<f64>;

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type")]
enum GeometryObject {
    Point { coordinates: Position },
    MultiPoint { coordinates: Vec<Position> },
    LineString { coordinates: Vec<Position> },
    MultiLineString { coordinates: Vec<Vec<Position>> },
    Polygon { coordinates: Vec<Vec<Position>> },
    MultiPolygon { coordinates: Vec<Vec<Vec<Position>>> },
    GeometryCollection { geometries: Vec<GeometryObject> },
}

// ============================================================================
// Public API
// ============================================================================

/// Labels read from one GeoJSON document.
#[derive(Clone, Debug, Default)]
pub struct LabelCollection {
    /// Reference system named by the document's `crs` member, if any.
    pub crs: Option<Epsg>,
    pub labels: Vec<Label>,
}

/// Reads labels from a GeoJSON file and checks its reference system.
///
/// # Errors
/// - [`PrepError::GeoJsonParse`] for unreadable or malformed GeoJSON
/// - [`PrepError::CoordinateReferenceMismatch`] when the document declares a
///   reference system other than `expected`
pub fn read_labels(path: &Path, expected: Epsg) -> Result<Vec<Label>, PrepError> {
    let file = File::open(path).map_err(PrepError::Io)?;
    let reader = BufReader::new(file);

    let collection: FeatureCollection =
        serde_json::from_reader(reader).map_err(|source| PrepError::GeoJsonParse {
            path: path.to_path_buf(),
            source,
        })?;
    let parsed = collection_to_labels(collection).map_err(|source| PrepError::GeoJsonParse {
        path: path.to_path_buf(),
        source,
    })?;

    if let Some(crs) = parsed.crs {
        if crs != expected {
            return Err(PrepError::CoordinateReferenceMismatch {
                file: path.display().to_string(),
                expected: expected.to_string(),
                actual: crs.to_string(),
            });
        }
    }

    info!("Read {} label(s) from {}", parsed.labels.len(), path.display());
    Ok(parsed.labels)
}

/// Reads labels from a GeoJSON string.
///
/// Useful for testing without file I/O.
pub fn from_geojson_str(json: &str) -> Result<LabelCollection, serde_json::Error> {
    let collection: FeatureCollection = serde_json::from_str(json)?;
    collection_to_labels(collection)
}

/// Reads labels from a GeoJSON byte slice.
pub fn from_geojson_slice(bytes: &[u8]) -> Result<LabelCollection, serde_json::Error> {
    let collection: FeatureCollection = serde_json::from_slice(bytes)?;
    collection_to_labels(collection)
}

/// Writes tile footprints as a polygon layer, one feature per tile.
pub fn write_tiles_geojson(path: &Path, registry: &TileRegistry) -> Result<(), PrepError> {
    write_collection(path, tiles_to_collection(registry))
}

/// Writes label fragments, tagged with their label and tile.
pub fn write_fragments_geojson(
    path: &Path,
    crs: Epsg,
    fragments: &[LabelFragment],
) -> Result<(), PrepError> {
    write_collection(path, fragments_to_collection(crs, fragments))
}

/// Writes label fragments to a GeoJSON string.
pub fn fragments_to_geojson_string(
    crs: Epsg,
    fragments: &[LabelFragment],
) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&fragments_to_collection(crs, fragments))
}

// ============================================================================
// Conversion: GeoJSON -> labels
// ============================================================================

fn collection_to_labels(collection: FeatureCollection) -> Result<LabelCollection, serde_json::Error> {
    if collection.kind != "FeatureCollection" {
        return Err(serde_json::Error::custom(format!(
            "expected a FeatureCollection, found '{}'",
            collection.kind
        )));
    }

    let crs = match collection.crs {
        Some(named) => Some(named.properties.name.parse::<Epsg>().map_err(|_| {
            serde_json::Error::custom(format!(
                "unsupported crs name '{}'",
                named.properties.name
            ))
        })?),
        None => None,
    };

    let mut labels = Vec::with_capacity(collection.features.len());
    for (position, feature) in collection.features.into_iter().enumerate() {
        let properties = feature.properties.unwrap_or_default();
        let id = properties
            .get("label_id")
            .and_then(value_to_id)
            .or_else(|| feature.id.as_ref().and_then(value_to_id))
            .unwrap_or_else(|| position.to_string());

        let Some(geometry) = feature.geometry else {
            warn!("Skipping label {id}: feature has no geometry");
            continue;
        };

        let tile = properties
            .get("tile")
            .and_then(Value::as_str)
            .map(str::to_string);

        labels.push(Label {
            id: LabelId(id),
            tile,
            geometry: convert_geometry(geometry)?,
        });
    }

    Ok(LabelCollection { crs, labels })
}

fn value_to_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn convert_position(position: Position) -> Result<Coord<Geographic>, serde_json::Error> {
    match position.as_slice() {
        [x, y, ..] => Ok(Coord::new(*x, *y)),
        _ => Err(serde_json::Error::custom(format!(
            "position needs at least two values, found {}",
            position.len()
        ))),
    }
}

fn convert_line(line: Vec<Position>) -> Result<Ring, serde_json::Error> {
    line.into_iter().map(convert_position).collect()
}

fn convert_polygon(rings: Vec<Vec<Position>>) -> Result<Polygon, serde_json::Error> {
    let mut rings = rings.into_iter();
    let exterior = convert_line(
        rings
            .next()
            .ok_or_else(|| serde_json::Error::custom("polygon without exterior ring"))?,
    )?;
    let interiors = rings.map(convert_line).collect::<Result<_, _>>()?;
    Ok(Polygon::with_interiors(exterior, interiors))
}

fn convert_geometry(geometry: GeometryObject) -> Result<LabelGeometry, serde_json::Error> {
    Ok(match geometry {
        GeometryObject::Point { coordinates } => LabelGeometry::Point(convert_position(coordinates)?),
        GeometryObject::MultiPoint { coordinates } => {
            LabelGeometry::MultiPoint(convert_line(coordinates)?)
        }
        GeometryObject::LineString { coordinates } => {
            LabelGeometry::LineString(convert_line(coordinates)?)
        }
        GeometryObject::MultiLineString { coordinates } => LabelGeometry::MultiLineString(
            coordinates
                .into_iter()
                .map(convert_line)
                .collect::<Result<_, _>>()?,
        ),
        GeometryObject::Polygon { coordinates } => {
            LabelGeometry::Polygon(convert_polygon(coordinates)?)
        }
        GeometryObject::MultiPolygon { coordinates } => LabelGeometry::MultiPolygon(
            coordinates
                .into_iter()
                .map(convert_polygon)
                .collect::<Result<_, _>>()?,
        ),
        GeometryObject::GeometryCollection { geometries } => LabelGeometry::GeometryCollection(
            geometries
                .into_iter()
                .map(convert_geometry)
                .collect::<Result<_, _>>()?,
        ),
    })
}

// ============================================================================
// Conversion: labels / tiles -> GeoJSON
// ============================================================================

fn named_crs(crs: Epsg) -> NamedCrs {
    NamedCrs {
        kind: "name".to_string(),
        properties: NamedCrsProperties {
            name: format!("urn:ogc:def:crs:EPSG::{}", crs.code()),
        },
    }
}

fn position(c: &Coord<Geographic>) -> Position {
    vec![c.x, c.y]
}

fn line(ring: &[Coord<Geographic>]) -> Vec<Position> {
    ring.iter().map(position).collect()
}

fn polygon_rings(polygon: &Polygon) -> Vec<Vec<Position>> {
    std::iter::once(&polygon.exterior)
        .chain(&polygon.interiors)
        .map(|ring| line(ring))
        .collect()
}

impl From<&LabelGeometry> for GeometryObject {
    fn from(geometry: &LabelGeometry) -> Self {
        match geometry {
            LabelGeometry::Point(p) => GeometryObject::Point {
                coordinates: position(p),
            },
            LabelGeometry::MultiPoint(points) => GeometryObject::MultiPoint {
                coordinates: line(points),
            },
            LabelGeometry::LineString(points) => GeometryObject::LineString {
                coordinates: line(points),
            },
            LabelGeometry::MultiLineString(lines) => GeometryObject::MultiLineString {
                coordinates: lines.iter().map(|l| line(l)).collect(),
            },
            LabelGeometry::Polygon(polygon) => GeometryObject::Polygon {
                coordinates: polygon_rings(polygon),
            },
            LabelGeometry::MultiPolygon(polygons) => GeometryObject::MultiPolygon {
                coordinates: polygons.iter().map(polygon_rings).collect(),
            },
            LabelGeometry::GeometryCollection(children) => GeometryObject::GeometryCollection {
                geometries: children.iter().map(GeometryObject::from).collect(),
            },
        }
    }
}

fn tiles_to_collection(registry: &TileRegistry) -> FeatureCollection {
    let features = registry
        .iter()
        .map(|tile| {
            let e = tile.extent();
            let properties = json!({
                "file": tile.file_name(),
                "xsize": tile.width(),
                "ysize": tile.height(),
                "xmin": e.xmin(),
                "ymin": e.ymin(),
                "xmax": e.xmax(),
                "ymax": e.ymax(),
            });
            Feature {
                kind: "Feature".to_string(),
                id: None,
                properties: properties.as_object().cloned(),
                geometry: Some(GeometryObject::Polygon {
                    coordinates: vec![vec![
                        vec![e.xmin(), e.ymin()],
                        vec![e.xmax(), e.ymin()],
                        vec![e.xmax(), e.ymax()],
                        vec![e.xmin(), e.ymax()],
                        vec![e.xmin(), e.ymin()],
                    ]],
                }),
            }
        })
        .collect();

    FeatureCollection {
        kind: "FeatureCollection".to_string(),
        crs: Some(named_crs(registry.crs())),
        features,
    }
}

fn fragments_to_collection(crs: Epsg, fragments: &[LabelFragment]) -> FeatureCollection {
    let features = fragments
        .iter()
        .map(|fragment| {
            let properties = json!({
                "fragment": fragment.id.index(),
                "label_id": fragment.label.as_str(),
                "tile": fragment.tile,
            });
            Feature {
                kind: "Feature".to_string(),
                id: None,
                properties: properties.as_object().cloned(),
                geometry: Some(GeometryObject::from(&fragment.geometry)),
            }
        })
        .collect();

    FeatureCollection {
        kind: "FeatureCollection".to_string(),
        crs: Some(named_crs(crs)),
        features,
    }
}

fn write_collection(path: &Path, collection: FeatureCollection) -> Result<(), PrepError> {
    let file = File::create(path).map_err(PrepError::Io)?;
    let writer = BufWriter::new(file);

    serde_json::to_writer(writer, &collection).map_err(|source| PrepError::GeoJsonWrite {
        path: path.to_path_buf(),
        source,
    })
}

// ============================================================================
// Tests
// ============================================================================
