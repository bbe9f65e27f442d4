#![no_main]
use libfuzzer_sys::fuzz_target;
use niuc_core::normalize::normalize;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        // Should never panic on any UTF-8 input, and must be deterministic.
        let a = normalize(s);
        let b = normalize(s);
        assert_eq!(a.text, b.text, "non-deterministic normalization");
        assert_eq!(a.stats, b.stats);
    }
});
