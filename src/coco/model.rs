//! Annotation dataset document for one split.
//!
//! Records are complete values: the builder creates each one whole and
//! appends it, so a document never holds a half-filled image or annotation.

use super::ids::{AnnotationId, CategoryId, ImageId, LicenseId};

/// One object-detection document: every tile of a split as an image, every
/// linked label fragment as a polygon annotation.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CocoDocument {
    pub info: DatasetInfo,
    pub licenses: Vec<License>,
    pub categories: Vec<Category>,
    pub images: Vec<Image>,
    pub annotations: Vec<Annotation>,
}

impl CocoDocument {
    /// Annotations of the given image, in document order.
    pub fn annotations_of(&self, image: ImageId) -> impl Iterator<Item = &Annotation> {
        self.annotations.iter().filter(move |a| a.image_id == image)
    }
}

/// Dataset-level metadata.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DatasetInfo {
    pub year: Option<u32>,
    pub version: Option<String>,
    pub description: Option<String>,
    pub contributor: Option<String>,
    pub url: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct License {
    pub id: LicenseId,
    pub name: String,
    pub url: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Category {
    pub id: CategoryId,
    pub supercategory: Option<String>,
    pub name: String,
}

/// A tile, as seen by the detection dataset.
#[derive(Clone, Debug, PartialEq)]
pub struct Image {
    pub id: ImageId,
    /// Path of the tile image, relative to wherever the consumer resolves it.
    pub file_name: String,
    pub width: u32,
    pub height: u32,
    pub license: Option<LicenseId>,
}

/// A label fragment in pixel coordinates.
#[derive(Clone, Debug, PartialEq)]
pub struct Annotation {
    pub id: AnnotationId,
    pub image_id: ImageId,
    pub category_id: CategoryId,
    /// Polygon rings, each flattened as `[x1, y1, x2, y2, ...]`.
    pub segmentation: Vec<Vec<f64>>,
    /// Polygon area in square pixels.
    pub area: f64,
    /// `[x, y, width, height]` of the polygon, top-left origin.
    pub bbox: [f64; 4],
    pub iscrowd: u8,
}
