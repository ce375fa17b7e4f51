//! Fuzz harness for embedded report archives.
//!
//! Target: `reportmerge_archive::decode_archive` and entry classification

#![no_main]

use libfuzzer_sys::fuzz_target;
use reportmerge_archive::decode_archive;
use reportmerge_merge::ReportAccumulator;

fuzz_target!(|data: &[u8]| {
    let Ok(entries) = decode_archive(data) else {
        return;
    };

    // Malformed reports must surface as errors, never panics.
    let mut acc = ReportAccumulator::new();
    for entry in &entries {
        if acc.apply_archive_entry(entry).is_err() {
            return;
        }
    }
    let _ = acc.into_entries();
});
