//! # Config Loader
//!
//! Reads the YAML manifest from disk into the typed [`Manifest`] model. Shape
//! problems (unknown fields, nested parameter values) are reported here, before
//! any command is resolved.

use crate::models::Manifest;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while loading the manifest.
#[derive(Error, Debug)]
pub enum ManifestError {
    /// The manifest file could not be read.
    #[error("Could not read manifest '{path}': {source}")]
    Io {
        /// The manifest path.
        path: PathBuf,
        /// The underlying read error.
        #[source]
        source: std::io::Error,
    },
    /// The manifest is not valid YAML or does not have the expected shape.
    #[error("Failed to parse manifest '{path}': {source}")]
    YamlParse {
        /// The manifest path.
        path: PathBuf,
        /// The underlying parse error.
        #[source]
        source: serde_yaml::Error,
    },
}

/// Loads and parses the manifest at `path`.
pub fn load_manifest(path: &Path) -> Result<Manifest, ManifestError> {
    log::debug!("Loading manifest from {}", path.display());
    let content = fs::read_to_string(path).map_err(|source| ManifestError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_manifest(&content).map_err(|source| ManifestError::YamlParse {
        path: path.to_path_buf(),
        source,
    })
}

/// Parses manifest text. A document with no content (or only comments) is an
/// empty manifest.
pub fn parse_manifest(content: &str) -> Result<Manifest, serde_yaml::Error> {
    let has_content = content.lines().any(|line| {
        let line = line.trim();
        !line.is_empty() && !line.starts_with('#')
    });
    if !has_content {
        return Ok(Manifest::default());
    }
    let manifest: Option<Manifest> = serde_yaml::from_str(content)?;
    let manifest = manifest.unwrap_or_default();
    log::debug!(
        "Manifest declares {} context(s).",
        manifest.contexts.len()
    );
    Ok(manifest)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_manifest_success() {
        // --- Setup ---
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(
                b"defaults:\n  parameters: { repository: aa8y/foo }\ncontexts:\n  stable:\n    tags: { latest: {} }\n",
            )
            .unwrap();
        temp_file.flush().unwrap();

        // --- Execute ---
        let manifest = load_manifest(temp_file.path()).unwrap();

        // --- Assert ---
        assert_eq!(manifest.contexts.len(), 1);
        assert!(manifest.contexts["stable"].tag("latest").is_some());
        assert_eq!(
            manifest.defaults.parameters["repository"].to_string(),
            "aa8y/foo"
        );
    }

    #[test]
    fn test_load_manifest_file_not_found() {
        let result = load_manifest(Path::new("non_existent_manifest_for_test.yml"));
        assert!(matches!(result, Err(ManifestError::Io { .. })));
    }

    #[test]
    fn test_load_manifest_reports_path_on_parse_error() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(b"contexts: [not, a, mapping]\n").unwrap();
        temp_file.flush().unwrap();

        let error = load_manifest(temp_file.path()).unwrap_err();
        assert!(matches!(error, ManifestError::YamlParse { .. }));
        assert!(error.to_string().contains(&temp_file.path().display().to_string()));
    }

    #[test]
    fn test_empty_documents_are_empty_manifests() {
        assert_eq!(parse_manifest("").unwrap(), Manifest::default());
        assert_eq!(parse_manifest("  \n# only a comment\n").unwrap(), Manifest::default());
        assert_eq!(parse_manifest("~").unwrap(), Manifest::default());
    }

    #[test]
    fn test_unknown_root_field_is_rejected() {
        let error = parse_manifest("parameters: { a: b }\n").unwrap_err();
        assert!(error.to_string().contains("unknown field `parameters`"));
    }

    #[test]
    fn test_duplicate_keys_are_rejected() {
        assert!(parse_manifest("contexts:\n  a: {}\n  a: {}\n").is_err());
    }

    #[test]
    fn test_numeric_and_quoted_keys_with_same_text_are_rejected() {
        let yaml = "contexts:\n  c:\n    tags:\n      1: { bar: numeric }\n      '1': { bar: string }\n";
        let error = parse_manifest(yaml).unwrap_err();
        assert!(error.to_string().contains("duplicate key '1'"), "{}", error);
    }
}
