//! End-to-end dataset preparation.
//!
//! For every conformation entry: register tiles, distribute labels onto
//! them, link fragments to tiles, split the tiles, and write one COCO
//! document per split. Any error aborts the run; a split's document is only
//! written once its whole annotation pass succeeded.

pub mod io_csv;

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::coco::io_coco_json::write_coco_json;
use crate::coco::{CocoDocument, DatasetInfo, DocumentBuilder};
use crate::config::{Config, ConformationEntry};
use crate::error::PrepError;
use crate::geo::fragment_to_pixels;
use crate::label::io_geojson::{read_labels, write_fragments_geojson, write_tiles_geojson};
use crate::label::{Label, LabelFragment};
use crate::link::TileLinks;
use crate::overlay::clip_labels;
use crate::split::{split, SplitKind, SplitPartition, SplitProportions};
use crate::tile::io_worldfile::read_tile_descriptors;
use crate::tile::TileRegistry;

pub const TILES_LAYER: &str = "tiles.geojson";
pub const FRAGMENTS_LAYER: &str = "label-on-tile.geojson";
pub const LINK_TABLE: &str = "tile-label-link.csv";
pub const SPLIT_INDEX: &str = "split.csv";

/// Fixed content shared by the documents of one entry.
#[derive(Clone, Debug, PartialEq)]
pub struct DocumentTemplate {
    pub info: DatasetInfo,
    pub license_name: String,
    pub license_url: Option<String>,
    pub supercategory: Option<String>,
    pub category: String,
    /// Prefix joined to every tile file name in `images[].file_name`.
    pub image_dir: Option<PathBuf>,
}

impl DocumentTemplate {
    pub fn from_config(config: &Config, entry: &ConformationEntry) -> Self {
        let metadata = &config.prepare.metadata;
        Self {
            info: DatasetInfo {
                year: Some(entry.year),
                version: Some(metadata.version.clone()),
                description: Some(metadata.description.clone()),
                contributor: Some(metadata.contributor.clone()),
                url: Some(metadata.url.clone()),
            },
            license_name: config.prepare.license.name.clone(),
            license_url: Some(config.prepare.license.url.clone()),
            supercategory: Some(config.common.class.clone()),
            category: config.common.category.clone(),
            image_dir: Some(entry.tile_dir(&config.prepare.dataset)),
        }
    }

    fn image_file_name(&self, tile_file: &str) -> String {
        match &self.image_dir {
            Some(dir) => dir.join(tile_file).to_string_lossy().into_owned(),
            None => tile_file.to_string(),
        }
    }
}

/// Tiles, fragments, links and split of one dataset slice, ready to be
/// turned into documents.
#[derive(Clone, Debug)]
pub struct PreparedDataset {
    pub registry: TileRegistry,
    pub fragments: Vec<LabelFragment>,
    pub links: TileLinks,
    pub partition: SplitPartition,
}

impl PreparedDataset {
    /// Runs overlay, linking and splitting in memory.
    ///
    /// With `clip` the labels are cut along tile edges first; otherwise they
    /// are taken as ready-made fragments.
    pub fn new(
        registry: TileRegistry,
        labels: Vec<Label>,
        clip: bool,
        seed: u32,
        proportions: SplitProportions,
    ) -> Result<Self, PrepError> {
        Self::assemble(registry, labels, clip, seed, proportions, None)
    }

    /// Overlay, linking, orphan check and split. With `debug_dir` the
    /// fragment layer and the link table are written there as soon as they
    /// exist, so they survive an orphan failure.
    fn assemble(
        registry: TileRegistry,
        labels: Vec<Label>,
        clip: bool,
        seed: u32,
        proportions: SplitProportions,
        debug_dir: Option<&Path>,
    ) -> Result<Self, PrepError> {
        let fragments = if clip {
            clip_labels(&registry, &labels)
        } else {
            LabelFragment::from_labels(labels)
        };
        if let Some(dir) = debug_dir {
            write_fragments_geojson(&dir.join(FRAGMENTS_LAYER), registry.crs(), &fragments)?;
        }

        let links = TileLinks::group(&registry, &fragments);
        if let Some(dir) = debug_dir {
            io_csv::write_link_csv(&dir.join(LINK_TABLE), &registry, &fragments, &links)?;
        }
        links.ensure_no_orphans(&registry)?;

        let partition = split(registry.len(), seed, proportions);
        info!(
            "Split {} tile(s): {} train, {} test, {} validation",
            registry.len(),
            partition.train.len(),
            partition.test.len(),
            partition.validation.len()
        );
        Ok(Self {
            registry,
            fragments,
            links,
            partition,
        })
    }

    /// Builds the document of one split.
    pub fn document(
        &self,
        kind: SplitKind,
        template: &DocumentTemplate,
    ) -> Result<CocoDocument, PrepError> {
        build_split_document(
            &self.registry,
            &self.fragments,
            &self.links,
            self.partition.indices(kind),
            kind,
            template,
        )
    }
}

/// Builds one split's document from its tile indices, in the given order.
///
/// # Errors
/// - [`PrepError::OrphanTile`] for a tile with no linked fragment
/// - [`PrepError::UnsupportedGeometryType`] for a fragment that is not a
///   single polygon
/// - [`PrepError::LabelOutOfTileBounds`] for a vertex outside its tile
pub fn build_split_document(
    registry: &TileRegistry,
    fragments: &[LabelFragment],
    links: &TileLinks,
    indices: &[usize],
    kind: SplitKind,
    template: &DocumentTemplate,
) -> Result<CocoDocument, PrepError> {
    let mut builder = DocumentBuilder::new(template.info.clone());
    let license = builder.add_license(&template.license_name, template.license_url.clone());
    let category = builder.add_category(template.supercategory.clone(), &template.category);

    for &index in indices {
        let tile = registry.get(index).ok_or(PrepError::UnknownReference {
            kind: "tile",
            id: index as u64,
        })?;
        debug!("COCO annotation: {}", tile.file_name());

        let linked = links.fragments_of(index);
        if linked.is_empty() {
            return Err(PrepError::OrphanTile {
                file: tile.file_name().to_string(),
                split: Some(kind.name().to_string()),
            });
        }

        let image = builder.add_image(
            template.image_file_name(tile.file_name()),
            tile.width(),
            tile.height(),
            Some(license),
        )?;

        for id in linked {
            let fragment = fragments.get(id.index()).ok_or(PrepError::UnknownReference {
                kind: "fragment",
                id: id.index() as u64,
            })?;
            let ring = fragment_to_pixels(tile, fragment)?;
            builder.add_annotation(image, category, &ring)?;
        }
    }

    info!(
        "Built {} document: {} image(s), {} annotation(s)",
        kind,
        builder.image_count(),
        builder.annotation_count()
    );
    Ok(builder.finish())
}

/// What one conformation entry produced.
#[derive(Clone, Debug)]
pub struct EntryOutcome {
    pub slug: String,
    pub output_dir: PathBuf,
    pub tiles: usize,
    pub fragments: usize,
    pub partition: SplitPartition,
    pub documents: Vec<PathBuf>,
}

/// Runs every conformation entry of the configuration, in file order.
pub fn run_prepare(config: &Config) -> Result<Vec<EntryOutcome>, PrepError> {
    let proportions = config.proportions()?;
    let entries = config.read_conformation()?;
    info!("Conformation lists {} entry(ies)", entries.len());

    fs::create_dir_all(&config.common.working)?;

    entries
        .iter()
        .map(|entry| prepare_entry(config, entry, proportions))
        .collect()
}

/// Runs one conformation entry and writes its outputs.
pub fn prepare_entry(
    config: &Config,
    entry: &ConformationEntry,
    proportions: SplitProportions,
) -> Result<EntryOutcome, PrepError> {
    let dataset = &config.prepare.dataset;
    let slug = entry.slug();
    info!("Preparing {slug}");

    let label_path = entry.label_path(dataset, &config.prepare.label_file);
    if !label_path.is_file() {
        return Err(PrepError::Configuration(format!(
            "label file not found: {}",
            label_path.display()
        )));
    }
    let tile_dir = entry.tile_dir(dataset);

    let descriptors = read_tile_descriptors(&tile_dir)?;
    let registry = TileRegistry::build(descriptors, entry.epsg)?;
    let labels = read_labels(&label_path, entry.epsg)?;

    let output_dir = config.common.working.join(&slug);
    fs::create_dir_all(&output_dir)?;

    let debug_layers = config.common.debug;
    if debug_layers {
        write_tiles_geojson(&output_dir.join(TILES_LAYER), &registry)?;
    }

    let prepared = PreparedDataset::assemble(
        registry,
        labels,
        config.prepare.clip_labels,
        config.prepare.split_seed,
        proportions,
        debug_layers.then_some(output_dir.as_path()),
    )?;
    io_csv::write_split_csv(
        &output_dir.join(SPLIT_INDEX),
        &prepared.registry,
        &prepared.partition,
    )?;

    let template = DocumentTemplate::from_config(config, entry);
    let documents = write_documents(&prepared, &template, &output_dir)?;

    Ok(EntryOutcome {
        slug,
        output_dir,
        tiles: prepared.registry.len(),
        fragments: prepared.fragments.len(),
        partition: prepared.partition,
        documents,
    })
}

fn write_documents(
    prepared: &PreparedDataset,
    template: &DocumentTemplate,
    output_dir: &Path,
) -> Result<Vec<PathBuf>, PrepError> {
    let mut written = Vec::with_capacity(SplitKind::ALL.len());
    for kind in SplitKind::ALL {
        let document = prepared.document(kind, template)?;
        let path = output_dir.join(kind.document_file_name());
        write_coco_json(&path, &document)?;
        info!("Wrote {}", path.display());
        written.push(path);
    }
    Ok(written)
}
