//! Raster metadata reader.
//!
//! Georeferencing embedded in the GeoTIFF tags is used first (see
//! [`io_geotiff`](super::io_geotiff)). Whatever the tags lack is taken from
//! sidecars next to `name.tif`:
//! - `name.tfw` (or `name.tifw` / `name.tiffw`): the six world-file lines
//! - `name.prj`: the coordinate reference system as WKT
//!
//! Pixel dimensions are read from the image header itself.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};
use walkdir::WalkDir;

use super::io_geotiff::read_embedded_georeference;
use super::TileDescriptor;
use crate::error::PrepError;
use crate::geo::{root_epsg, Epsg, GeoTransform};

const TILE_EXTENSIONS: &[&str] = &["tif", "tiff"];
const WORLD_FILE_EXTENSIONS: &[&str] = &["tfw", "tifw", "tiffw"];

/// Reads the descriptors of every tile directly inside `dir`.
///
/// Sub-directories are not traversed. The result is sorted by file name.
pub fn read_tile_descriptors(dir: &Path) -> Result<Vec<TileDescriptor>, PrepError> {
    if !dir.is_dir() {
        return Err(PrepError::Configuration(format!(
            "tile images directory not found: {}",
            dir.display()
        )));
    }

    let mut paths: Vec<PathBuf> = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| PrepError::Io(e.into()))?;
        if entry.file_type().is_file() && has_tile_extension(entry.path()) {
            paths.push(entry.into_path());
        }
    }
    paths.sort();

    let descriptors = paths
        .iter()
        .map(|path| read_tile_descriptor(path))
        .collect::<Result<Vec<_>, _>>()?;

    info!(
        "Read {} tile descriptor(s) from {}",
        descriptors.len(),
        dir.display()
    );
    Ok(descriptors)
}

/// Reads the descriptor of one tile from its header, tags and sidecars.
pub fn read_tile_descriptor(path: &Path) -> Result<TileDescriptor, PrepError> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| raster_error(path, "path has no file name"))?;

    let size = imagesize::size(path).map_err(|e| raster_error(path, e.to_string()))?;
    let width = u32::try_from(size.width)
        .map_err(|_| raster_error(path, format!("width {} out of range", size.width)))?;
    let height = u32::try_from(size.height)
        .map_err(|_| raster_error(path, format!("height {} out of range", size.height)))?;

    let embedded = read_embedded_georeference(path).map_err(|message| raster_error(path, message))?;
    let transform = match embedded.transform {
        Some(transform) => transform,
        None => read_world_file(path)?,
    };
    let crs = match embedded.crs {
        Some(crs) => crs,
        None => read_projection(path)?,
    };

    debug!(
        "Tile {file_name}: {width}x{height}, {crs}, transform {:?}",
        transform.0
    );

    Ok(TileDescriptor::new(file_name, width, height, transform, crs))
}

fn read_world_file(path: &Path) -> Result<GeoTransform, PrepError> {
    let world_path = find_world_file(path).ok_or_else(|| {
        raster_error(path, "no embedded georeferencing and no world file (.tfw) next to the tile")
    })?;
    parse_world_file(&fs::read_to_string(&world_path)?)
        .map_err(|message| raster_error(&world_path, message))
}

fn read_projection(path: &Path) -> Result<Epsg, PrepError> {
    let prj_path = path.with_extension("prj");
    let wkt = fs::read_to_string(&prj_path).map_err(|e| {
        raster_error(&prj_path, format!("no embedded EPSG code and cannot read projection: {e}"))
    })?;
    root_epsg(&wkt).ok_or_else(|| raster_error(&prj_path, "projection has no EPSG authority"))
}

/// Parses the six numeric lines of an ESRI world file.
pub fn parse_world_file(content: &str) -> Result<GeoTransform, String> {
    let values: Vec<f64> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            line.parse::<f64>()
                .map_err(|_| format!("invalid world file value '{line}'"))
        })
        .collect::<Result<_, _>>()?;

    let values: [f64; 6] = values
        .try_into()
        .map_err(|v: Vec<f64>| format!("expected 6 world file values, found {}", v.len()))?;

    Ok(GeoTransform::from_world_file(values))
}

fn has_tile_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| TILE_EXTENSIONS.iter().any(|t| e.eq_ignore_ascii_case(t)))
        .unwrap_or(false)
}

fn find_world_file(path: &Path) -> Option<PathBuf> {
    WORLD_FILE_EXTENSIONS
        .iter()
        .map(|ext| path.with_extension(ext))
        .find(|candidate| candidate.is_file())
}

fn raster_error(path: &Path, message: impl Into<String>) -> PrepError {
    PrepError::RasterMetadata {
        path: path.to_path_buf(),
        message: message.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn world_file_with_trailing_newline() {
        let transform = parse_world_file("0.1\n0.0\n0.0\n-0.1\n2600000.05\n1200099.95\n")
            .expect("parse world file");
        let [x0, a, b, y0, d, e] = transform.0;
        assert!((x0 - 2_600_000.0).abs() < 1e-6);
        assert!((y0 - 1_200_100.0).abs() < 1e-6);
        assert_eq!((a, b, d, e), (0.1, 0.0, 0.0, -0.1));
    }

    #[test]
    fn world_file_with_missing_lines() {
        let err = parse_world_file("0.1\n0.0\n0.0\n").unwrap_err();
        assert!(err.contains("found 3"));
    }

    #[test]
    fn world_file_with_garbage() {
        let err = parse_world_file("0.1\n0.0\nabc\n-0.1\n0\n0\n").unwrap_err();
        assert!(err.contains("abc"));
    }

    #[test]
    fn tile_extension_filter() {
        assert!(has_tile_extension(Path::new("a/b/tile.tif")));
        assert!(has_tile_extension(Path::new("tile.TIFF")));
        assert!(!has_tile_extension(Path::new("tile.tfw")));
        assert!(!has_tile_extension(Path::new("tile")));
    }
}
