#![allow(dead_code)]

use std::collections::HashSet;

use geoprep::coco::CocoDocument;
use geoprep::geo::{Coord, Epsg, GeoTransform, Geographic};
use geoprep::label::{Label, LabelGeometry, LabelId, Polygon};
use geoprep::tile::{TileDescriptor, TileRegistry};
use proptest::prelude::*;
use proptest::strategy::BoxedStrategy;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};

/// Side of a generated tile in metres.
pub const TILE_METRES: u32 = 100;
/// Side of a generated tile in pixels (0.5 m resolution).
pub const TILE_PIXELS: u32 = 200;

pub fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(64);

    let mut config = ProptestConfig::with_failure_persistence(FileFailurePersistence::WithSource(
        "proptest-regressions",
    ));
    config.cases = cases;
    config.max_shrink_iters = 1024;
    config
}

/// `(train, test)` with `train + test <= 1`, in hundredths.
pub fn arb_proportions() -> BoxedStrategy<(f64, f64)> {
    (0u32..=100)
        .prop_flat_map(|train| (Just(train), 0u32..=(100 - train)))
        .prop_map(|(train, test)| (f64::from(train) / 100.0, f64::from(test) / 100.0))
        .boxed()
}

/// Regular grid of `cols x rows` tiles anchored at (2 600 000, 1 200 000).
pub fn grid_registry(cols: u32, rows: u32) -> TileRegistry {
    let (x0, y0) = grid_origin();
    let resolution = f64::from(TILE_METRES) / f64::from(TILE_PIXELS);
    let descriptors = (0..rows)
        .flat_map(|row| (0..cols).map(move |col| (row, col)))
        .map(|(row, col)| {
            let left = x0 + f64::from(col * TILE_METRES);
            let top = y0 + f64::from((row + 1) * TILE_METRES);
            TileDescriptor::new(
                format!("r{row:02}_c{col:02}.tif"),
                TILE_PIXELS,
                TILE_PIXELS,
                GeoTransform::new([left, resolution, 0.0, top, 0.0, -resolution]),
                Epsg(2056),
            )
        })
        .collect();
    TileRegistry::build(descriptors, Epsg(2056)).expect("grid registry")
}

pub fn grid_origin() -> (f64, f64) {
    (2_600_000.0, 1_200_000.0)
}

pub fn rectangle(id: &str, xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> Label {
    let ring: Vec<Coord<Geographic>> = vec![
        Coord::new(xmin, ymin),
        Coord::new(xmax, ymin),
        Coord::new(xmax, ymax),
        Coord::new(xmin, ymax),
        Coord::new(xmin, ymin),
    ];
    Label {
        id: LabelId::new(id),
        tile: None,
        geometry: LabelGeometry::Polygon(Polygon::new(ring)),
    }
}

/// One small label in the middle of every tile, so no tile is an orphan.
pub fn seed_labels(cols: u32, rows: u32) -> Vec<Label> {
    let (x0, y0) = grid_origin();
    let half = f64::from(TILE_METRES) / 2.0;
    (0..rows)
        .flat_map(|row| (0..cols).map(move |col| (row, col)))
        .map(|(row, col)| {
            let cx = x0 + f64::from(col * TILE_METRES) + half;
            let cy = y0 + f64::from(row * TILE_METRES) + half;
            rectangle(&format!("seed-{row}-{col}"), cx - 5.0, cy - 5.0, cx + 5.0, cy + 5.0)
        })
        .collect()
}

/// Axis-aligned labels with whole-metre corners anywhere on the grid,
/// frequently crossing tile edges.
pub fn arb_grid_labels(cols: u32, rows: u32, max: usize) -> BoxedStrategy<Vec<Label>> {
    let (x0, y0) = grid_origin();
    let width = cols * TILE_METRES;
    let height = rows * TILE_METRES;
    prop::collection::vec(
        (0..width, 0..height, 1u32..=150, 1u32..=150),
        0..=max,
    )
    .prop_map(move |rects| {
        rects
            .into_iter()
            .enumerate()
            .map(|(i, (x, y, w, h))| {
                let xmax = (x + w).min(width);
                let ymax = (y + h).min(height);
                rectangle(
                    &format!("rect-{i}"),
                    x0 + f64::from(x),
                    y0 + f64::from(y),
                    x0 + f64::from(xmax.max(x + 1)),
                    y0 + f64::from(ymax.max(y + 1)),
                )
            })
            .collect()
    })
    .boxed()
}

pub fn arb_grid() -> BoxedStrategy<(u32, u32)> {
    (1u32..=4, 1u32..=3).boxed()
}

pub fn assert_valid_references(document: &CocoDocument) -> Result<(), String> {
    let image_ids: HashSet<_> = document.images.iter().map(|i| i.id).collect();
    let category_ids: HashSet<_> = document.categories.iter().map(|c| c.id).collect();

    for annotation in &document.annotations {
        if !image_ids.contains(&annotation.image_id) {
            return Err(format!(
                "annotation {} references missing image {}",
                annotation.id, annotation.image_id
            ));
        }
        if !category_ids.contains(&annotation.category_id) {
            return Err(format!(
                "annotation {} references missing category {}",
                annotation.id, annotation.category_id
            ));
        }
    }
    Ok(())
}
