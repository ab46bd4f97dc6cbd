//! Annotation dataset documents in COCO layout.

mod builder;
mod ids;
pub mod io_coco_json;
mod model;

pub use builder::DocumentBuilder;
pub use ids::{AnnotationId, CategoryId, ImageId, LicenseId};
pub use model::{Annotation, Category, CocoDocument, DatasetInfo, Image, License};
