//! Property tests for the key=value config parser.

use std::path::Path;

use proptest::prelude::*;

use dockhand::config::{from_entries, parse_entries};

fn known_key() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec![
        "host",
        "user",
        "port",
        "ssh_key",
        "remote_dir",
        "service",
        "branch",
        "compose_file",
        "migration_marker",
    ])
}

fn plain_value() -> impl Strategy<Value = String> {
    proptest::string::string_regex("[A-Za-z0-9_./:@-]{1,24}").unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        .. ProptestConfig::default()
    })]

    /// PROPERTY: For duplicate keys the last assignment wins.
    #[test]
    fn property_last_duplicate_wins(
        assignments in proptest::collection::vec((known_key(), plain_value()), 1..=16),
    ) {
        let content: String = assignments
            .iter()
            .map(|(k, v)| format!("{}={}\n", k, v))
            .collect();

        let entries = parse_entries(&content);

        for (key, _) in &assignments {
            let (line, expected) = assignments
                .iter()
                .enumerate()
                .rev()
                .find(|(_, (k, _))| k == key)
                .map(|(i, (_, v))| (i + 1, v))
                .unwrap();
            let entry = &entries[*key];
            prop_assert_eq!(&entry.value, expected);
            prop_assert_eq!(entry.line, line);
        }
    }

    /// PROPERTY: Key case never matters.
    #[test]
    fn property_keys_are_case_insensitive(key in known_key(), value in plain_value()) {
        let lower = parse_entries(&format!("{}={}", key, value));
        let upper = parse_entries(&format!("{}={}", key.to_ascii_uppercase(), value));
        prop_assert_eq!(lower, upper);
    }

    /// PROPERTY: Surrounding whitespace and one pair of quotes are not part of the value.
    #[test]
    fn property_quotes_and_padding_stripped(
        key in known_key(),
        value in plain_value(),
        quote in prop::sample::select(vec!["", "\"", "'"]),
    ) {
        let entries = parse_entries(&format!("  {} = {}{}{}  \n", key, quote, value, quote));
        prop_assert_eq!(&entries[key].value, &value);
    }

    /// PROPERTY: Arbitrary input never panics the parser or the loader.
    #[test]
    fn property_parser_never_panics(content in "\\PC{0,400}") {
        let entries = parse_entries(&content);
        let _ = from_entries(&entries, Path::new("/etc/dockhand"));
    }
}
