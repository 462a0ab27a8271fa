#![no_main]

use codetrail::vet;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|source: &str| {
    // Arbitrary text is either rejected with a fault or parsed; never a panic
    if let Err(fault) = vet(source) {
        assert!(!fault.message.is_empty());
    }
});
