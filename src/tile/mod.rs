//! Tile registry: the georeferenced footprint of every raster tile.
//!
//! Raster files are read by [`io_worldfile`], with embedded GeoTIFF tags
//! decoded by [`io_geotiff`]; this module turns the raw
//! descriptors into an ordered, validated registry that every later stage
//! indexes into.

pub mod io_geotiff;
pub mod io_worldfile;

use std::collections::HashMap;

use log::debug;
use rstar::{RTree, RTreeObject, AABB};

use crate::error::PrepError;
use crate::geo::{Epsg, Extent, GeoTransform, Geographic};

/// Raw metadata of one raster tile, as supplied by a raster reader.
#[derive(Clone, Debug, PartialEq)]
pub struct TileDescriptor {
    pub file_name: String,
    pub width: u32,
    pub height: u32,
    pub transform: GeoTransform,
    pub crs: Epsg,
}

impl TileDescriptor {
    pub fn new(
        file_name: impl Into<String>,
        width: u32,
        height: u32,
        transform: GeoTransform,
        crs: Epsg,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            width,
            height,
            transform,
            crs,
        }
    }
}

/// A registered tile. Immutable once the registry is built.
#[derive(Clone, Debug)]
pub struct Tile {
    file_name: String,
    width: u32,
    height: u32,
    transform: GeoTransform,
    extent: Extent<Geographic>,
    crs: Epsg,
}

impl Tile {
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn transform(&self) -> &GeoTransform {
        &self.transform
    }

    /// Geographic bounding rectangle derived from the transform.
    pub fn extent(&self) -> &Extent<Geographic> {
        &self.extent
    }

    pub fn crs(&self) -> Epsg {
        self.crs
    }
}

/// Ordered collection of tiles sharing one coordinate reference system.
///
/// Tiles are sorted by file name; that order defines the tile indices fed to
/// the split generator, so it must not depend on directory listing order.
#[derive(Clone, Debug)]
pub struct TileRegistry {
    crs: Epsg,
    tiles: Vec<Tile>,
    by_name: HashMap<String, usize>,
}

impl TileRegistry {
    /// Builds the registry, validating every descriptor.
    ///
    /// # Errors
    /// - [`PrepError::CoordinateReferenceMismatch`] if any tile is not in `expected`
    /// - [`PrepError::RasterMetadata`] for empty rasters, non-finite or
    ///   non north-up transforms, and duplicate file names
    pub fn build(
        mut descriptors: Vec<TileDescriptor>,
        expected: Epsg,
    ) -> Result<Self, PrepError> {
        descriptors.sort_by(|a, b| a.file_name.cmp(&b.file_name));

        let mut tiles = Vec::with_capacity(descriptors.len());
        let mut by_name = HashMap::with_capacity(descriptors.len());

        for descriptor in descriptors {
            if descriptor.crs != expected {
                return Err(PrepError::CoordinateReferenceMismatch {
                    file: descriptor.file_name,
                    expected: expected.to_string(),
                    actual: descriptor.crs.to_string(),
                });
            }

            let tile = register(descriptor)?;
            debug!("Pushing tile {} {:?}", tile.file_name, tile.extent);

            if by_name.insert(tile.file_name.clone(), tiles.len()).is_some() {
                return Err(metadata_error(&tile.file_name, "duplicate tile file name"));
            }
            tiles.push(tile);
        }

        Ok(Self {
            crs: expected,
            tiles,
            by_name,
        })
    }

    pub fn crs(&self) -> Epsg {
        self.crs
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Tile> {
        self.tiles.get(index)
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.iter()
    }

    /// Index of the tile with the given file name.
    pub fn position(&self, file_name: &str) -> Option<usize> {
        self.by_name.get(file_name).copied()
    }

    /// R-tree over the tile extents, payload is the tile index.
    pub fn spatial_index(&self) -> RTree<TileBox> {
        let boxes = self
            .tiles
            .iter()
            .enumerate()
            .map(|(index, tile)| TileBox {
                index,
                env: tile.extent.to_aabb(),
            })
            .collect();
        RTree::bulk_load(boxes)
    }
}

/// Tile footprint entry of [`TileRegistry::spatial_index`].
#[derive(Clone, Debug)]
pub struct TileBox {
    pub index: usize,
    env: AABB<[f64; 2]>,
}

impl RTreeObject for TileBox {
    type Envelope = AABB<[f64; 2]>;

    #[inline]
    fn envelope(&self) -> Self::Envelope {
        self.env
    }
}

fn register(descriptor: TileDescriptor) -> Result<Tile, PrepError> {
    let TileDescriptor {
        file_name,
        width,
        height,
        transform,
        crs,
    } = descriptor;

    if width == 0 || height == 0 {
        return Err(metadata_error(
            &file_name,
            format!("invalid dimensions {width}x{height}"),
        ));
    }
    if !transform.is_finite() {
        return Err(metadata_error(&file_name, "non-finite geotransform"));
    }

    let extent = transform.footprint(width, height);
    if extent.is_degenerate() {
        return Err(metadata_error(
            &file_name,
            format!("geotransform {:?} does not describe a north-up raster", transform.0),
        ));
    }

    Ok(Tile {
        file_name,
        width,
        height,
        transform,
        extent,
        crs,
    })
}

fn metadata_error(file_name: &str, message: impl Into<String>) -> PrepError {
    PrepError::RasterMetadata {
        path: file_name.into(),
        message: message.into(),
    }
}
