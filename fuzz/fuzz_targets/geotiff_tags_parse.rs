//! Fuzz target for embedded GeoTIFF tag decoding.
//!
//! Run with:
//!   cargo +nightly fuzz run geotiff_tags_parse

#![no_main]

use std::io::Cursor;

use geoprep::tile::io_geotiff::from_geotiff_reader;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(embedded) = from_geotiff_reader(Cursor::new(data)) {
        if let Some(transform) = embedded.transform {
            let _ = transform.footprint(256, 256);
        }
    }
});
