//! CSV side outputs: the split index and the debug link table.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;

use crate::error::PrepError;
use crate::label::LabelFragment;
use crate::link::TileLinks;
use crate::split::SplitPartition;
use crate::tile::TileRegistry;

#[derive(Debug, Serialize)]
struct SplitRow<'a> {
    index: usize,
    file: &'a str,
    split: &'static str,
}

#[derive(Debug, Serialize)]
struct LinkRow<'a> {
    tile_index: usize,
    tile: &'a str,
    fragment: usize,
    label: &'a str,
}

/// Writes `index,file,split` for every tile, in registry order.
pub fn write_split_csv(
    path: &Path,
    registry: &TileRegistry,
    partition: &SplitPartition,
) -> Result<(), PrepError> {
    let assignments = partition.assignments();
    let rows = registry.iter().enumerate().map(|(index, tile)| SplitRow {
        index,
        file: tile.file_name(),
        split: assignments
            .get(index)
            .copied()
            .flatten()
            .map(|kind| kind.name())
            .unwrap_or(""),
    });
    write_rows(path, rows)
}

/// Writes one `tile_index,tile,fragment,label` row per link.
pub fn write_link_csv(
    path: &Path,
    registry: &TileRegistry,
    fragments: &[LabelFragment],
    links: &TileLinks,
) -> Result<(), PrepError> {
    let rows = links.iter().filter_map(|(tile_index, fragment)| {
        let tile = registry.get(tile_index)?;
        let fragment = fragments.get(fragment.index())?;
        Some(LinkRow {
            tile_index,
            tile: tile.file_name(),
            fragment: fragment.id.index(),
            label: fragment.label.as_str(),
        })
    });
    write_rows(path, rows)
}

fn write_rows<T: Serialize>(path: &Path, rows: impl Iterator<Item = T>) -> Result<(), PrepError> {
    let file = File::create(path).map_err(PrepError::Io)?;
    let writer = BufWriter::new(file);

    let mut csv_writer = csv::Writer::from_writer(writer);
    for row in rows {
        csv_writer.serialize(&row).map_err(|source| PrepError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
    }

    csv_writer
        .into_inner()
        .map_err(|e| PrepError::Io(e.into_error()))?
        .flush()
        .map_err(PrepError::Io)?;

    Ok(())
}
