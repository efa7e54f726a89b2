//! Fuzz target: `parse_verdict`
//!
//! cargo fuzz run fuzz_verdict_decoder

#![no_main]

use hazardwatch::adapters::classifier::parse_verdict;
use hazardwatch::error::CommsError;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Anything that is not a clear verdict means "classifier unavailable".
    if let Err(e) = parse_verdict(data) {
        assert_eq!(e, CommsError::ClassifierUnavailable);
    }
});
