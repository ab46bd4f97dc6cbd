//! Fuzz target for conformation list parsing.
//!
//! Run with:
//!   cargo +nightly fuzz run conformation_parse

#![no_main]

use geoprep::config::parse_conformation;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok(entries) = parse_conformation(text) {
        for entry in &entries {
            let _ = entry.slug();
        }
    }
});
