//! Blueprint library files.
//!
//! A library is stored as one pretty-printed JSON document. A missing file
//! reads as an empty library so a fresh install can save into it directly.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use tracing::info;

use logicgraph_core::BlueprintLibrary;

use crate::error::StorageError;

pub fn library_to_json(library: &BlueprintLibrary) -> Result<String, StorageError> {
    Ok(serde_json::to_string_pretty(library)?)
}

/// Parses a library and validates every template in it.
pub fn library_from_json(json: &str) -> Result<BlueprintLibrary, StorageError> {
    let library: BlueprintLibrary = serde_json::from_str(json)?;
    for template in library.iter() {
        template.validate()?;
    }
    Ok(library)
}

pub fn read_library(path: impl AsRef<Path>) -> Result<BlueprintLibrary, StorageError> {
    let path = path.as_ref();
    let json = match fs::read_to_string(path) {
        Ok(json) => json,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(BlueprintLibrary::new()),
        Err(e) => return Err(e.into()),
    };
    let library = library_from_json(&json)?;
    info!(path = %path.display(), templates = library.len(), "loaded blueprint library");
    Ok(library)
}

pub fn write_library(library: &BlueprintLibrary, path: impl AsRef<Path>) -> Result<(), StorageError> {
    let path = path.as_ref();
    fs::write(path, library_to_json(library)?)?;
    info!(path = %path.display(), templates = library.len(), "saved blueprint library");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use logicgraph_core::{CoreError, ElbowConfig, WireTemplate};

    #[test]
    fn builtin_library_survives_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("library.json");
        let library = BlueprintLibrary::builtin().unwrap();
        write_library(&library, &path).unwrap();
        assert_eq!(read_library(&path).unwrap(), library);
    }

    #[test]
    fn missing_file_is_empty_library() {
        let dir = tempfile::tempdir().unwrap();
        let library = read_library(dir.path().join("absent.json")).unwrap();
        assert!(library.is_empty());
    }

    #[test]
    fn invalid_template_rejected() {
        let mut library = BlueprintLibrary::builtin().unwrap();
        let mut broken = library.iter().next().unwrap().clone();
        broken.wires.push(WireTemplate {
            start_index: 0,
            end_index: 99,
            elbow_config: ElbowConfig::Horizontal,
        });
        library.insert(broken);
        let json = library_to_json(&library).unwrap();
        assert!(matches!(
            library_from_json(&json),
            Err(StorageError::Core(CoreError::DanglingIndex { index: 99, .. }))
        ));
    }

    #[test]
    fn malformed_json_is_serialization_error() {
        assert!(matches!(
            library_from_json("{ not json"),
            Err(StorageError::Serialization(_))
        ));
    }
}
