//! Property tests for shell quoting of remote commands.

use proptest::prelude::*;

use dockhand::domain::{shell_quote, RemoteCommand};

/// Undo POSIX single quoting and backslash escapes
fn shell_unquote(word: &str) -> String {
    let mut out = String::new();
    let mut chars = word.chars();
    let mut quoted = false;
    while let Some(c) = chars.next() {
        match (quoted, c) {
            (true, '\'') => quoted = false,
            (true, c) => out.push(c),
            (false, '\'') => quoted = true,
            (false, '\\') => {
                if let Some(next) = chars.next() {
                    out.push(next);
                }
            }
            (false, c) => out.push(c),
        }
    }
    out
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        .. ProptestConfig::default()
    })]

    /// PROPERTY: Quoting is lossless.
    #[test]
    fn property_quote_round_trips(s in "\\PC{0,40}") {
        prop_assert_eq!(shell_unquote(&shell_quote(&s)), s);
    }

    /// PROPERTY: Words with shell metacharacters are always single-quoted.
    #[test]
    fn property_quoted_word_is_single_token(s in "[a-z]{0,8}[ ;&|$`()<>*?\"'][a-z ;]{0,8}") {
        let quoted = shell_quote(&s);
        prop_assert!(quoted.starts_with('\''));
        prop_assert!(quoted.ends_with('\''));
    }
}

#[cfg(unix)]
proptest! {
    #![proptest_config(ProptestConfig {
        cases: 24,
        .. ProptestConfig::default()
    })]

    /// PROPERTY: A real shell receives exactly the argument that was given.
    #[test]
    fn property_shell_sees_original_argument(arg in "[ -~]{0,30}") {
        let line = RemoteCommand::new("printf").arg("%s").arg(arg.as_str()).render();
        let out = std::process::Command::new("sh")
            .arg("-c")
            .arg(&line)
            .output()
            .unwrap();
        prop_assert!(out.status.success());
        prop_assert_eq!(String::from_utf8_lossy(&out.stdout), arg);
    }
}
