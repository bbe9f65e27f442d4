#![no_main]
use libfuzzer_sys::fuzz_target;
use niuc_core::certificate::validate_json;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        // The validator must never panic on arbitrary, possibly malformed
        // certificate JSON — only ever return (false, Some(reason)).
        let _ = validate_json(s);
    }
});
