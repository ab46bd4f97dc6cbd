//! Six-parameter affine geotransform.

use serde::{Deserialize, Serialize};

use super::extent::Extent;
use super::space::Geographic;

/// Affine mapping from pixel indices to map coordinates, in GDAL order:
/// `[origin_x, pixel_size_x, row_rotation_x, origin_y, column_rotation_y, pixel_size_y]`.
///
/// For north-up rasters the rotation terms are zero and `pixel_size_y` is
/// negative.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GeoTransform(pub [f64; 6]);

impl GeoTransform {
    pub fn new(coefficients: [f64; 6]) -> Self {
        Self(coefficients)
    }

    /// Builds the transform from the six lines of an ESRI world file.
    ///
    /// World files store `A D B E C F` where `(C, F)` is the centre of the
    /// upper-left pixel; the geotransform origin is that pixel's outer corner.
    pub fn from_world_file(values: [f64; 6]) -> Self {
        let [a, d, b, e, c, f] = values;
        Self([
            c - a / 2.0 - b / 2.0,
            a,
            b,
            f - d / 2.0 - e / 2.0,
            d,
            e,
        ])
    }

    #[inline]
    pub fn origin_x(&self) -> f64 {
        self.0[0]
    }

    #[inline]
    pub fn origin_y(&self) -> f64 {
        self.0[3]
    }

    /// Geographic footprint of a `width` x `height` raster.
    ///
    /// The origin gives `xmin`/`ymax`; the opposite corner is reached by
    /// walking the full width and height through the transform.
    pub fn footprint(&self, width: u32, height: u32) -> Extent<Geographic> {
        let [t0, t1, t2, t3, t4, t5] = self.0;
        let w = f64::from(width);
        let h = f64::from(height);

        let x_min = t0;
        let y_min = t3 + w * t4 + h * t5;
        let x_max = t0 + w * t1 + h * t2;
        let y_max = t3;

        Extent::from_xyxy(x_min, y_min, x_max, y_max)
    }

    pub fn is_finite(&self) -> bool {
        self.0.iter().all(|v| v.is_finite())
    }
}
