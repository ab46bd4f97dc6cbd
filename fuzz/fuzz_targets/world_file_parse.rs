//! Fuzz target for world file parsing.
//!
//! Run with:
//!   cargo +nightly fuzz run world_file_parse

#![no_main]

use geoprep::tile::io_worldfile::parse_world_file;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok(transform) = parse_world_file(text) {
        let _ = transform.footprint(256, 256);
    }
});
