//! Consistency checks for written annotation documents.
//!
//! The builder already guarantees referential integrity for documents it
//! produces; this module re-checks any document read back from disk:
//! - unique IDs and resolvable license/image/category references
//! - non-empty names and positive image dimensions
//! - polygon segmentations that are well-formed and inside their image

mod report;

pub use report::{IssueCode, IssueContext, Severity, ValidationIssue, ValidationReport};

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use crate::coco::{CocoDocument, ImageId};

/// Options for validation behavior.
#[derive(Clone, Debug, Default)]
pub struct ValidateOptions {
    /// If true, treat warnings as errors.
    pub strict: bool,
}

impl ValidateOptions {
    /// Whether `report` passes under these options.
    pub fn passes(&self, report: &ValidationReport) -> bool {
        if self.strict {
            report.is_clean()
        } else {
            report.is_ok()
        }
    }
}

/// Validates a document and returns every issue found.
pub fn validate_document(document: &CocoDocument) -> ValidationReport {
    let mut report = ValidationReport::new();

    validate_licenses(document, &mut report);
    validate_categories(document, &mut report);
    validate_images(document, &mut report);
    validate_annotations(document, &mut report);

    report
}

/// Reports ids seen before under `code`.
fn check_unique<T: Copy + Eq + Hash>(
    seen: &mut HashMap<T, usize>,
    id: T,
    idx: usize,
    code: IssueCode,
    context: IssueContext,
    report: &mut ValidationReport,
) {
    if let Some(first_idx) = seen.get(&id) {
        report.add(ValidationIssue::error(
            code,
            format!("Duplicate ID (first seen at index {})", first_idx),
            context,
        ));
    } else {
        seen.insert(id, idx);
    }
}

fn validate_licenses(document: &CocoDocument, report: &mut ValidationReport) {
    let mut seen = HashMap::new();
    for (idx, license) in document.licenses.iter().enumerate() {
        check_unique(
            &mut seen,
            license.id,
            idx,
            IssueCode::DuplicateLicenseId,
            IssueContext::License {
                id: license.id.as_u64(),
            },
            report,
        );
    }
}

fn validate_categories(document: &CocoDocument, report: &mut ValidationReport) {
    let mut seen = HashMap::new();
    let mut seen_names: HashMap<&str, u64> = HashMap::new();

    for (idx, category) in document.categories.iter().enumerate() {
        let id = category.id.as_u64();
        check_unique(
            &mut seen,
            category.id,
            idx,
            IssueCode::DuplicateCategoryId,
            IssueContext::Category { id },
            report,
        );

        if category.name.is_empty() {
            report.add(ValidationIssue::warning(
                IssueCode::EmptyCategoryName,
                "Empty category name",
                IssueContext::Category { id },
            ));
        } else if let Some(first_id) = seen_names.get(category.name.as_str()) {
            report.add(ValidationIssue::warning(
                IssueCode::DuplicateCategoryName,
                format!(
                    "Duplicate category name '{}' (also used by category {})",
                    category.name, first_id
                ),
                IssueContext::Category { id },
            ));
        } else {
            seen_names.insert(&category.name, id);
        }
    }
}

fn validate_images(document: &CocoDocument, report: &mut ValidationReport) {
    let licenses: HashSet<_> = document.licenses.iter().map(|l| l.id).collect();
    let annotated: HashSet<ImageId> = document.annotations.iter().map(|a| a.image_id).collect();
    let mut seen = HashMap::new();

    for (idx, image) in document.images.iter().enumerate() {
        let id = image.id.as_u64();
        check_unique(
            &mut seen,
            image.id,
            idx,
            IssueCode::DuplicateImageId,
            IssueContext::Image { id },
            report,
        );

        if let Some(license) = image.license {
            if !licenses.contains(&license) {
                report.add(ValidationIssue::error(
                    IssueCode::MissingLicenseRef,
                    format!("References non-existent license {}", license),
                    IssueContext::Image { id },
                ));
            }
        }

        if image.width == 0 || image.height == 0 {
            report.add(ValidationIssue::error(
                IssueCode::InvalidImageDimensions,
                format!(
                    "Invalid dimensions {}x{} (must be positive)",
                    image.width, image.height
                ),
                IssueContext::Image { id },
            ));
        }

        if image.file_name.is_empty() {
            report.add(ValidationIssue::warning(
                IssueCode::EmptyFileName,
                "Empty filename",
                IssueContext::Image { id },
            ));
        }

        if !annotated.contains(&image.id) {
            report.add(ValidationIssue::warning(
                IssueCode::ImageWithoutAnnotations,
                format!("Image {} has no annotation", image.file_name),
                IssueContext::Image { id },
            ));
        }
    }
}

fn validate_annotations(document: &CocoDocument, report: &mut ValidationReport) {
    let category_ids: HashSet<_> = document.categories.iter().map(|c| c.id).collect();
    let image_dims: HashMap<ImageId, (u32, u32)> = document
        .images
        .iter()
        .map(|i| (i.id, (i.width, i.height)))
        .collect();
    let mut seen = HashMap::new();

    for (idx, annotation) in document.annotations.iter().enumerate() {
        let id = annotation.id.as_u64();
        let context = || IssueContext::Annotation { id };
        check_unique(
            &mut seen,
            annotation.id,
            idx,
            IssueCode::DuplicateAnnotationId,
            context(),
            report,
        );

        let dims = image_dims.get(&annotation.image_id).copied();
        if dims.is_none() {
            report.add(ValidationIssue::error(
                IssueCode::MissingImageRef,
                format!("References non-existent image {}", annotation.image_id),
                context(),
            ));
        }

        if !category_ids.contains(&annotation.category_id) {
            report.add(ValidationIssue::error(
                IssueCode::MissingCategoryRef,
                format!(
                    "References non-existent category {}",
                    annotation.category_id
                ),
                context(),
            ));
        }

        if annotation.segmentation.is_empty() {
            report.add(ValidationIssue::error(
                IssueCode::EmptySegmentation,
                "Segmentation holds no polygon",
                context(),
            ));
            continue;
        }

        for (ring_idx, ring) in annotation.segmentation.iter().enumerate() {
            if ring.len() % 2 != 0 {
                report.add(ValidationIssue::error(
                    IssueCode::OddSegmentationLength,
                    format!("Polygon {} has {} values, expected pairs", ring_idx, ring.len()),
                    context(),
                ));
                continue;
            }
            if ring.len() < 6 {
                report.add(ValidationIssue::error(
                    IssueCode::DegenerateRing,
                    format!(
                        "Polygon {} has {} vertices, at least 3 required",
                        ring_idx,
                        ring.len() / 2
                    ),
                    context(),
                ));
            }
            if ring.iter().any(|v| !v.is_finite()) {
                report.add(ValidationIssue::error(
                    IssueCode::SegmentationNotFinite,
                    format!("Polygon {} has non-finite coordinates", ring_idx),
                    context(),
                ));
                continue;
            }
            if let Some((width, height)) = dims {
                let (w, h) = (f64::from(width), f64::from(height));
                let outside = ring
                    .chunks_exact(2)
                    .position(|p| p[0] < 0.0 || p[1] < 0.0 || p[0] > w || p[1] > h);
                if let Some(vertex) = outside {
                    report.add(ValidationIssue::error(
                        IssueCode::SegmentationOutOfBounds,
                        format!(
                            "Polygon {} vertex {} ({:.3}, {:.3}) lies outside the {}x{} image",
                            ring_idx,
                            vertex,
                            ring[2 * vertex],
                            ring[2 * vertex + 1],
                            width,
                            height
                        ),
                        context(),
                    ));
                }
            }
        }

        if annotation.area <= 0.0 {
            report.add(ValidationIssue::warning(
                IssueCode::ZeroArea,
                format!("Zero or negative area: {:.2}", annotation.area),
                context(),
            ));
        }
    }
}
