//! Coordinate space marker types.
//!
//! These are zero-sized types (ZSTs) used as type parameters to distinguish
//! between map coordinates and image coordinates at compile time.

use std::fmt;

/// Marker type for geographic (map) coordinates.
///
/// Values are expressed in the units of the tile's coordinate reference
/// system, with y increasing northwards.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum Geographic {}

/// Marker type for pixel coordinates within one tile.
///
/// (0, 0) is the top-left corner of the image and y grows downwards.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pixel {}

impl fmt::Debug for Geographic {
    fn fmt(&self, _: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {}
    }
}

impl fmt::Debug for Pixel {
    fn fmt(&self, _: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {}
    }
}
