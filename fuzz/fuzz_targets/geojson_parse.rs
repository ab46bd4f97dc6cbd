//! Fuzz target for label GeoJSON parsing.
//!
//! Run with:
//!   cargo +nightly fuzz run geojson_parse

#![no_main]

use geoprep::label::io_geojson::from_geojson_slice;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    if let Ok(collection) = from_geojson_slice(data) {
        for label in &collection.labels {
            let _ = label.geometry.envelope();
        }
    }
});
