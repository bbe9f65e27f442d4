#![no_main]
use libfuzzer_sys::fuzz_target;
use niuc_core::detect::detect;
use niuc_core::normalize::normalize;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let normalized = normalize(s);
        // Should never panic, and every returned span must be a valid,
        // non-empty, in-bounds character range (invariant T2).
        let spans = detect(&normalized.text);
        let len = normalized.text.chars().count();
        for span in &spans {
            assert!(span.start < span.end);
            assert!(span.end <= len);
        }
    }
});
