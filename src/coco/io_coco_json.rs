//! COCO JSON reader and writer for annotation documents.
//!
//! Key order on output is `info`, `licenses`, `categories`, `images`,
//! `annotations`, and records keep the order the builder produced them in,
//! so two runs over the same input give byte-identical files.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::ids::{AnnotationId, CategoryId, ImageId, LicenseId};
use super::model::{Annotation, Category, CocoDocument, DatasetInfo, Image, License};
use crate::error::PrepError;

// ============================================================================
// COCO Schema Types (internal to this module)
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
struct CocoDataset {
    #[serde(default)]
    info: CocoInfo,

    #[serde(default)]
    licenses: Vec<CocoLicense>,

    #[serde(default)]
    categories: Vec<CocoCategory>,

    #[serde(default)]
    images: Vec<CocoImage>,

    #[serde(default)]
    annotations: Vec<CocoAnnotation>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct CocoInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    year: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    contributor: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct CocoLicense {
    id: u64,
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct CocoCategory {
    id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    supercategory: Option<String>,
    name: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct CocoImage {
    id: u64,
    file_name: String,
    #[serde(default)]
    width: u32,
    #[serde(default)]
    height: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    license: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize)]
struct CocoAnnotation {
    id: u64,
    image_id: u64,
    category_id: u64,

    /// Polygon rings as flat `[x1, y1, x2, y2, ...]` lists.
    #[serde(default)]
    segmentation: Vec<Vec<f64>>,

    #[serde(default)]
    area: f64,

    /// `[x, y, width, height]`, top-left origin.
    #[serde(default)]
    bbox: [f64; 4],

    #[serde(default)]
    iscrowd: u8,
}

// ============================================================================
// Public API
// ============================================================================

/// Reads a document from a COCO JSON file.
///
/// # Example
/// ```no_run
/// use std::path::Path;
/// use geoprep::coco::io_coco_json::read_coco_json;
///
/// let document = read_coco_json(Path::new("COCO_trn.json"))?;
/// # Ok::<(), geoprep::PrepError>(())
/// ```
pub fn read_coco_json(path: &Path) -> Result<CocoDocument, PrepError> {
    let file = File::open(path).map_err(PrepError::Io)?;
    let reader = BufReader::new(file);

    let coco: CocoDataset =
        serde_json::from_reader(reader).map_err(|source| PrepError::CocoJsonParse {
            path: path.to_path_buf(),
            source,
        })?;

    Ok(coco_to_document(coco))
}

/// Writes a document to a COCO JSON file, pretty-printed with a trailing
/// newline.
pub fn write_coco_json(path: &Path, document: &CocoDocument) -> Result<(), PrepError> {
    let file = File::create(path).map_err(PrepError::Io)?;
    let mut writer = BufWriter::new(file);

    let coco = document_to_coco(document);

    serde_json::to_writer_pretty(&mut writer, &coco).map_err(|source| {
        PrepError::CocoJsonWrite {
            path: path.to_path_buf(),
            source,
        }
    })?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

/// Reads a document from a COCO JSON string.
pub fn from_coco_str(json: &str) -> Result<CocoDocument, serde_json::Error> {
    let coco: CocoDataset = serde_json::from_str(json)?;
    Ok(coco_to_document(coco))
}

/// Reads a document from a COCO JSON byte slice.
///
/// Useful for fuzzing and processing raw bytes without UTF-8 validation overhead.
pub fn from_coco_slice(bytes: &[u8]) -> Result<CocoDocument, serde_json::Error> {
    let coco: CocoDataset = serde_json::from_slice(bytes)?;
    Ok(coco_to_document(coco))
}

/// Writes a document to a COCO JSON string.
pub fn to_coco_string(document: &CocoDocument) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&document_to_coco(document))
}

// ============================================================================
// Conversion: COCO -> document
// ============================================================================

fn coco_to_document(coco: CocoDataset) -> CocoDocument {
    let info = DatasetInfo {
        year: coco.info.year,
        version: coco.info.version,
        description: coco.info.description,
        contributor: coco.info.contributor,
        url: coco.info.url,
    };

    let licenses = coco
        .licenses
        .into_iter()
        .map(|l| License {
            id: LicenseId::new(l.id),
            name: l.name,
            url: l.url,
        })
        .collect();

    let categories = coco
        .categories
        .into_iter()
        .map(|c| Category {
            id: CategoryId::new(c.id),
            supercategory: c.supercategory,
            name: c.name,
        })
        .collect();

    let images = coco
        .images
        .into_iter()
        .map(|img| Image {
            id: ImageId::new(img.id),
            file_name: img.file_name,
            width: img.width,
            height: img.height,
            license: img.license.map(LicenseId::new),
        })
        .collect();

    let annotations = coco
        .annotations
        .into_iter()
        .map(|ann| Annotation {
            id: AnnotationId::new(ann.id),
            image_id: ImageId::new(ann.image_id),
            category_id: CategoryId::new(ann.category_id),
            segmentation: ann.segmentation,
            area: ann.area,
            bbox: ann.bbox,
            iscrowd: ann.iscrowd,
        })
        .collect();

    CocoDocument {
        info,
        licenses,
        categories,
        images,
        annotations,
    }
}

// ============================================================================
// Conversion: document -> COCO
// ============================================================================

fn document_to_coco(document: &CocoDocument) -> CocoDataset {
    let info = CocoInfo {
        year: document.info.year,
        version: document.info.version.clone(),
        description: document.info.description.clone(),
        contributor: document.info.contributor.clone(),
        url: document.info.url.clone(),
    };

    let licenses = document
        .licenses
        .iter()
        .map(|l| CocoLicense {
            id: l.id.as_u64(),
            name: l.name.clone(),
            url: l.url.clone(),
        })
        .collect();

    let categories = document
        .categories
        .iter()
        .map(|c| CocoCategory {
            id: c.id.as_u64(),
            supercategory: c.supercategory.clone(),
            name: c.name.clone(),
        })
        .collect();

    let images = document
        .images
        .iter()
        .map(|img| CocoImage {
            id: img.id.as_u64(),
            file_name: img.file_name.clone(),
            width: img.width,
            height: img.height,
            license: img.license.map(|l| l.as_u64()),
        })
        .collect();

    let annotations = document
        .annotations
        .iter()
        .map(|ann| CocoAnnotation {
            id: ann.id.as_u64(),
            image_id: ann.image_id.as_u64(),
            category_id: ann.category_id.as_u64(),
            segmentation: ann.segmentation.clone(),
            area: ann.area,
            bbox: ann.bbox,
            iscrowd: ann.iscrowd,
        })
        .collect();

    CocoDataset {
        info,
        licenses,
        categories,
        images,
        annotations,
    }
}
