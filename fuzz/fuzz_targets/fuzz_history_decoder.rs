//! Fuzz target: `parse_history`
//!
//! Drives arbitrary bytes through the history-node decoder and asserts it
//! never panics and never returns more rows than the requested window.
//! Every returned row must have finite climate values.
//!
//! cargo fuzz run fuzz_history_decoder

#![no_main]

use hazardwatch::adapters::cloud::parse_history;
use hazardwatch::classification::MAX_FEATURE_WINDOW;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // First byte picks the window so short and oversized requests both run.
    let Some((&window, body)) = data.split_first() else {
        return;
    };
    let window = usize::from(window);

    if let Ok(rows) = parse_history(body, window) {
        assert!(rows.len() <= window.min(MAX_FEATURE_WINDOW));
        for r in &rows {
            assert!(r.temperature_c().is_finite());
            assert!(r.humidity_pct().is_finite());
        }
    }
});
