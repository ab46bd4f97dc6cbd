//! Georeferencing embedded in GeoTIFF tags.
//!
//! The affine transform comes from `ModelTransformationTag` when present,
//! otherwise from `ModelPixelScaleTag` plus `ModelTiepointTag`. The EPSG code
//! is the `ProjectedCSTypeGeoKey` (or `GeographicTypeGeoKey` for geographic
//! rasters) of the `GeoKeyDirectoryTag`. Either half may be missing; the
//! caller falls back to sidecar files for it.

use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use tiff::decoder::Decoder;
use tiff::tags::Tag;
use tiff::TiffResult;

use crate::geo::{Epsg, GeoTransform};

const GT_RASTER_TYPE_GEO_KEY: u32 = 1025;
const GEOGRAPHIC_TYPE_GEO_KEY: u32 = 2048;
const PROJECTED_CS_TYPE_GEO_KEY: u32 = 3072;

const RASTER_PIXEL_IS_POINT: u32 = 2;
const USER_DEFINED: u32 = 32767;

/// Whatever georeferencing a raster carries in its own tags.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct EmbeddedGeoreference {
    pub transform: Option<GeoTransform>,
    pub crs: Option<Epsg>,
}

/// Reads the GeoTIFF tags of the first image in `path`.
pub fn read_embedded_georeference(path: &Path) -> Result<EmbeddedGeoreference, String> {
    let file = File::open(path).map_err(|e| format!("cannot open raster: {e}"))?;
    from_geotiff_reader(BufReader::new(file))
}

/// Reads the GeoTIFF tags of the first image of any TIFF stream.
pub fn from_geotiff_reader<R: Read + Seek>(reader: R) -> Result<EmbeddedGeoreference, String> {
    let mut decoder = Decoder::new(reader).map_err(|e| format!("invalid TIFF: {e}"))?;
    read_tags(&mut decoder).map_err(|e| format!("invalid GeoTIFF tag: {e}"))
}

fn read_tags<R: Read + Seek>(decoder: &mut Decoder<R>) -> TiffResult<EmbeddedGeoreference> {
    let matrix = f64_tag(decoder, Tag::ModelTransformationTag)?;
    let scale = f64_tag(decoder, Tag::ModelPixelScaleTag)?;
    let tiepoint = f64_tag(decoder, Tag::ModelTiepointTag)?;
    let keys = match decoder.find_tag(Tag::GeoKeyDirectoryTag)? {
        Some(value) => value.into_u32_vec()?,
        None => Vec::new(),
    };

    let pixel_is_point = geo_key(&keys, GT_RASTER_TYPE_GEO_KEY) == Some(RASTER_PIXEL_IS_POINT);
    let transform = match matrix {
        Some(matrix) => transform_from_matrix(&matrix),
        None => match (scale, tiepoint) {
            (Some(scale), Some(tiepoint)) => transform_from_tiepoint(&scale, &tiepoint),
            _ => None,
        },
    }
    .map(|t| if pixel_is_point { shift_to_corner(t) } else { t });

    Ok(EmbeddedGeoreference {
        transform,
        crs: crs_from_geo_keys(&keys),
    })
}

fn f64_tag<R: Read + Seek>(decoder: &mut Decoder<R>, tag: Tag) -> TiffResult<Option<Vec<f64>>> {
    decoder
        .find_tag(tag)?
        .map(|value| value.into_f64_vec())
        .transpose()
}

/// `(I, J, K, X, Y, Z)` raster point tied to a model point, with the
/// `(ScaleX, ScaleY, ScaleZ)` pixel size. Model y grows northwards.
pub fn transform_from_tiepoint(scale: &[f64], tiepoint: &[f64]) -> Option<GeoTransform> {
    let [sx, sy, ..] = *scale else {
        return None;
    };
    let [i, j, _, x, y, ..] = *tiepoint else {
        return None;
    };
    Some(GeoTransform::new([x - i * sx, sx, 0.0, y + j * sy, 0.0, -sy]))
}

/// Row-major 4x4 model transformation.
pub fn transform_from_matrix(matrix: &[f64]) -> Option<GeoTransform> {
    if matrix.len() < 16 {
        return None;
    }
    Some(GeoTransform::new([
        matrix[3], matrix[0], matrix[1], matrix[7], matrix[4], matrix[5],
    ]))
}

/// Moves a pixel-centre origin onto the pixel's outer corner.
fn shift_to_corner(transform: GeoTransform) -> GeoTransform {
    let [x0, a, b, y0, d, e] = transform.0;
    GeoTransform::new([x0 - a / 2.0 - b / 2.0, a, b, y0 - d / 2.0 - e / 2.0, d, e])
}

/// EPSG code of the raster, projected system first. User-defined systems
/// have no code.
pub fn crs_from_geo_keys(keys: &[u32]) -> Option<Epsg> {
    [PROJECTED_CS_TYPE_GEO_KEY, GEOGRAPHIC_TYPE_GEO_KEY]
        .into_iter()
        .filter_map(|key| geo_key(keys, key))
        .find(|&code| code != 0 && code != USER_DEFINED)
        .map(Epsg)
}

/// Value of a key stored inline in the directory (`TIFFTagLocation` 0).
///
/// The directory is a 4-value header whose last entry is the key count,
/// followed by `(KeyID, TIFFTagLocation, Count, Value_Offset)` entries.
fn geo_key(keys: &[u32], id: u32) -> Option<u32> {
    let count = usize::try_from(*keys.get(3)?).ok()?;
    keys.get(4..)?
        .chunks_exact(4)
        .take(count)
        .find(|entry| entry[0] == id && entry[1] == 0)
        .map(|entry| entry[3])
}
