use std::path::PathBuf;
use thiserror::Error;

use crate::validation::ValidationReport;

/// The main error type for geoprep operations.
///
/// Every variant is fatal for the run.
#[derive(Debug, Error)]
pub enum PrepError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Tile {file} is in {actual}, expected {expected}")]
    CoordinateReferenceMismatch {
        file: String,
        expected: String,
        actual: String,
    },

    #[error("{}", orphan_message(.file, .split))]
    OrphanTile { file: String, split: Option<String> },

    #[error("Label {label} on tile {file} is a {kind}, expected a Polygon")]
    UnsupportedGeometryType {
        file: String,
        label: String,
        kind: &'static str,
    },

    #[error(
        "Label {label} on tile {file}: vertex {vertex} maps to pixel ({x}, {y}), outside {width}x{height}"
    )]
    LabelOutOfTileBounds {
        file: String,
        label: String,
        vertex: usize,
        x: f64,
        y: f64,
        width: u32,
        height: u32,
    },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Failed to parse configuration {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Cannot read raster metadata of {path}: {message}")]
    RasterMetadata { path: PathBuf, message: String },

    #[error("Failed to parse GeoJSON from {path}: {source}")]
    GeoJsonParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write GeoJSON to {path}: {source}")]
    GeoJsonWrite {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to parse COCO JSON from {path}: {source}")]
    CocoJsonParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write COCO JSON to {path}: {source}")]
    CocoJsonWrite {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write CSV to {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Reference to {kind} {id} was never issued by this document")]
    UnknownReference { kind: &'static str, id: u64 },

    #[error("Validation failed with {error_count} error(s) and {warning_count} warning(s)")]
    ValidationFailed {
        error_count: usize,
        warning_count: usize,
        report: ValidationReport,
    },
}

fn orphan_message(file: &str, split: &Option<String>) -> String {
    match split {
        Some(split) => format!("Tile {file} has no label or label part in the {split} split"),
        None => format!("Tile {file} has no label or label part"),
    }
}
