//! Compose file inspection
//!
//! Only the `services:` mapping is read; everything else in the file is
//! Compose's business.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::{DeployError, DeployResult};

#[derive(Debug, Default, Deserialize)]
struct ComposeDocument {
    #[serde(default)]
    services: Option<BTreeMap<String, serde_yaml_ng::Value>>,
}

/// Service names declared in a compose file, sorted
pub fn declared_services(path: &Path) -> DeployResult<Vec<String>> {
    let content = fs::read_to_string(path)
        .map_err(|e| DeployError::precondition(path, format!("cannot read compose file: {}", e)))?;
    parse_services(&content)
        .map_err(|reason| DeployError::precondition(path, reason))
}

fn parse_services(content: &str) -> Result<Vec<String>, String> {
    let doc: ComposeDocument = serde_yaml_ng::from_str(content)
        .map_err(|e| format!("compose file is not valid YAML: {}", e))?;
    Ok(doc.services.unwrap_or_default().into_keys().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_services_sorted() {
        let yaml = r#"
services:
  rolebot:
    build: .
    env_file: .env
  redis:
    image: redis:7
volumes:
  data: {}
"#;
        assert_eq!(parse_services(yaml).unwrap(), ["redis", "rolebot"]);
    }

    #[test]
    fn missing_services_key_is_empty() {
        assert!(parse_services("version: '3.8'\n").unwrap().is_empty());
    }

    #[test]
    fn invalid_yaml_is_reported() {
        let err = parse_services("services: [unclosed\n").unwrap_err();
        assert!(err.contains("not valid YAML"));
    }

    #[test]
    fn unreadable_file_is_precondition_error() {
        let err = declared_services(Path::new("/nonexistent/docker-compose.yml")).unwrap_err();
        assert!(matches!(err, DeployError::Precondition { .. }));
    }
}
