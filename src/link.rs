//! Label-tile spatial linker.
//!
//! Groups label fragments by tile in one pass over the fragments. A fragment
//! that names its tile is linked to that tile alone; a fragment without a
//! tile reference is linked to every tile its envelope overlaps.

use log::{debug, info, warn};

use crate::error::PrepError;
use crate::label::{FragmentId, LabelFragment};
use crate::tile::TileRegistry;

/// Tile index to linked fragments, in fragment order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TileLinks {
    by_tile: Vec<Vec<FragmentId>>,
}

impl TileLinks {
    /// Builds the tile-to-fragment relation.
    ///
    /// Fragments without a tile reference are matched on positive overlap
    /// area between their envelope and the tile rectangle, so a fragment that
    /// merely touches a neighbouring tile along the shared edge is not linked
    /// there. Point-like and line-like envelopes have no area and fall back to
    /// closed intersection. Duplicated links are kept and reported.
    ///
    /// # Errors
    /// [`PrepError::OrphanTile`] for the first tile (in registry order) left
    /// without any fragment.
    pub fn build(registry: &TileRegistry, fragments: &[LabelFragment]) -> Result<Self, PrepError> {
        let links = Self::group(registry, fragments);
        links.ensure_no_orphans(registry)?;
        Ok(links)
    }

    /// Groups fragments by tile without the orphan check.
    pub fn group(registry: &TileRegistry, fragments: &[LabelFragment]) -> Self {
        let mut by_tile: Vec<Vec<FragmentId>> = vec![Vec::new(); registry.len()];
        let tree = registry.spatial_index();

        for fragment in fragments {
            if let Some(name) = fragment.tile.as_deref() {
                match registry.position(name) {
                    Some(index) => by_tile[index].push(fragment.id),
                    None => warn!(
                        "Fragment {} of label {} refers to unknown tile {name}, skipped",
                        fragment.id, fragment.label
                    ),
                }
                continue;
            }

            let Some(envelope) = fragment.geometry.envelope() else {
                warn!(
                    "Fragment {} of label {} has no vertices, skipped",
                    fragment.id, fragment.label
                );
                continue;
            };

            let degenerate = envelope.is_degenerate();
            let mut hits: Vec<usize> = tree
                .locate_in_envelope_intersecting(&envelope.to_aabb())
                .map(|b| b.index)
                .filter(|&index| match registry.get(index) {
                    Some(tile) if degenerate => tile.extent().intersects(&envelope),
                    Some(tile) => tile.extent().overlap_area(&envelope) > 0.0,
                    None => false,
                })
                .collect();
            hits.sort_unstable();

            match hits.len() {
                0 => debug!(
                    "Fragment {} of label {} is outside every tile",
                    fragment.id, fragment.label
                ),
                1 => {}
                n => warn!(
                    "Fragment {} of label {} overlaps {n} tiles, linked to all of them",
                    fragment.id, fragment.label
                ),
            }
            for index in hits {
                by_tile[index].push(fragment.id);
            }
        }

        let links = Self { by_tile };
        info!(
            "Linked {} fragment(s) to {} tile(s)",
            links.link_count(),
            registry.len()
        );
        links
    }

    /// Fails on the first tile without any linked fragment.
    pub fn ensure_no_orphans(&self, registry: &TileRegistry) -> Result<(), PrepError> {
        match self.orphans().next() {
            Some(index) => Err(PrepError::OrphanTile {
                file: registry
                    .get(index)
                    .map(|t| t.file_name().to_string())
                    .unwrap_or_else(|| format!("#{index}")),
                split: None,
            }),
            None => Ok(()),
        }
    }

    /// Fragments linked to the tile at `index`; empty for unknown indices.
    pub fn fragments_of(&self, index: usize) -> &[FragmentId] {
        self.by_tile.get(index).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Indices of tiles without links.
    pub fn orphans(&self) -> impl Iterator<Item = usize> + '_ {
        self.by_tile
            .iter()
            .enumerate()
            .filter(|(_, fragments)| fragments.is_empty())
            .map(|(index, _)| index)
    }

    pub fn tile_count(&self) -> usize {
        self.by_tile.len()
    }

    /// Total number of (tile, fragment) pairs.
    pub fn link_count(&self) -> usize {
        self.by_tile.iter().map(Vec::len).sum()
    }

    /// `(tile index, fragment)` pairs in tile order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, FragmentId)> + '_ {
        self.by_tile
            .iter()
            .enumerate()
            .flat_map(|(index, fragments)| fragments.iter().map(move |&f| (index, f)))
    }
}
