//! Fuzz target for COCO JSON parsing.
//!
//! Run with:
//!   cargo +nightly fuzz run coco_json_parse

#![no_main]

use geoprep::coco::io_coco_json::from_coco_slice;
use geoprep::validation::validate_document;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // 10MB is generous for a per-split document.
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    // Anything that parses must also validate without panicking.
    if let Ok(document) = from_coco_slice(data) {
        let _ = validate_document(&document);
    }
});
