#![no_main]

use std::path::Path;

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(content) = std::str::from_utf8(data) {
        // Parsing and validation should never panic
        let entries = dockhand::config::parse_entries(content);
        let _ = dockhand::config::from_entries(&entries, Path::new("/etc/dockhand"));
        let _ = dockhand::config::unknown_key_warnings(&entries);
    }
});
