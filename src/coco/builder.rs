//! Incremental construction of a [`CocoDocument`].
//!
//! Identifiers are issued by per-document counters starting at 1. A record
//! may only reference identifiers the same builder has already issued.

use super::ids::{AnnotationId, CategoryId, ImageId, LicenseId};
use super::model::{Annotation, Category, CocoDocument, DatasetInfo, Image, License};
use crate::error::PrepError;
use crate::geo::PixelRing;

/// Issues identifiers 1, 2, 3, ...
#[derive(Clone, Copy, Debug)]
struct Counter {
    next: u64,
}

impl Default for Counter {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl Counter {
    fn issue(&mut self) -> u64 {
        let id = self.next;
        self.next += 1;
        id
    }

    fn issued(&self, id: u64) -> bool {
        id >= 1 && id < self.next
    }
}

#[derive(Debug, Default)]
pub struct DocumentBuilder {
    document: CocoDocument,
    licenses: Counter,
    categories: Counter,
    images: Counter,
    annotations: Counter,
}

impl DocumentBuilder {
    pub fn new(info: DatasetInfo) -> Self {
        Self {
            document: CocoDocument {
                info,
                ..CocoDocument::default()
            },
            ..Self::default()
        }
    }

    pub fn add_license(&mut self, name: impl Into<String>, url: Option<String>) -> LicenseId {
        let id = LicenseId::new(self.licenses.issue());
        self.document.licenses.push(License {
            id,
            name: name.into(),
            url,
        });
        id
    }

    pub fn add_category(
        &mut self,
        supercategory: Option<String>,
        name: impl Into<String>,
    ) -> CategoryId {
        let id = CategoryId::new(self.categories.issue());
        self.document.categories.push(Category {
            id,
            supercategory,
            name: name.into(),
        });
        id
    }

    /// # Errors
    /// [`PrepError::UnknownReference`] if `license` was not issued here.
    pub fn add_image(
        &mut self,
        file_name: impl Into<String>,
        width: u32,
        height: u32,
        license: Option<LicenseId>,
    ) -> Result<ImageId, PrepError> {
        if let Some(license) = license {
            check(&self.licenses, "license", license.as_u64())?;
        }
        let id = ImageId::new(self.images.issue());
        self.document.images.push(Image {
            id,
            file_name: file_name.into(),
            width,
            height,
            license,
        });
        Ok(id)
    }

    /// Adds a single-ring polygon annotation; bbox and area derive from the
    /// ring.
    ///
    /// # Errors
    /// [`PrepError::UnknownReference`] if `image` or `category` was not
    /// issued here.
    pub fn add_annotation(
        &mut self,
        image: ImageId,
        category: CategoryId,
        ring: &PixelRing,
    ) -> Result<AnnotationId, PrepError> {
        check(&self.images, "image", image.as_u64())?;
        check(&self.categories, "category", category.as_u64())?;

        let (x, y, w, h) = ring.extent().to_xywh();
        let id = AnnotationId::new(self.annotations.issue());
        self.document.annotations.push(Annotation {
            id,
            image_id: image,
            category_id: category,
            segmentation: vec![ring.flatten()],
            area: ring.area(),
            bbox: [x, y, w, h],
            iscrowd: 0,
        });
        Ok(id)
    }

    pub fn image_count(&self) -> usize {
        self.document.images.len()
    }

    pub fn annotation_count(&self) -> usize {
        self.document.annotations.len()
    }

    pub fn finish(self) -> CocoDocument {
        self.document
    }
}

fn check(counter: &Counter, kind: &'static str, id: u64) -> Result<(), PrepError> {
    if counter.issued(id) {
        Ok(())
    } else {
        Err(PrepError::UnknownReference { kind, id })
    }
}
