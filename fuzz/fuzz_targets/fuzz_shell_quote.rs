#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(word) = std::str::from_utf8(data) {
        let quoted = dockhand::domain::shell_quote(word);
        // Either left bare or fully wrapped in single quotes
        assert!(quoted == word || (quoted.starts_with('\'') && quoted.ends_with('\'')));
    }
});
