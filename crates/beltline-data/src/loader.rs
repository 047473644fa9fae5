//! Format detection (RON/JSON/TOML), file discovery and deserialization
//! helpers used by the loading pipeline.

use beltline_core::catalog::CatalogError;
use beltline_core::config::ConfigError;
use beltline_core::grid::{GridPosition, PlacementError};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

// ===========================================================================
// Errors
// ===========================================================================

/// Errors that can occur during data loading.
#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    /// A required data file was not found in the given directory.
    #[error("required file '{file}' not found in {dir}")]
    MissingRequired { file: String, dir: PathBuf },

    #[error("unsupported format for file: {file}")]
    UnsupportedFormat { file: PathBuf },

    /// Two files with the same base name but different formats exist.
    #[error("conflicting formats: {a} and {b}")]
    ConflictingFormats { a: PathBuf, b: PathBuf },

    #[error("parse error in {file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    /// A name reference could not be resolved.
    #[error("unresolved {expected_kind} reference '{name}' in {file}")]
    UnresolvedRef {
        file: PathBuf,
        name: String,
        expected_kind: &'static str,
    },

    #[error("duplicate name '{name}' in {file}")]
    DuplicateName { file: PathBuf, name: String },

    #[error("invalid configuration in {file}: {source}")]
    Config {
        file: PathBuf,
        #[source]
        source: ConfigError,
    },

    #[error("cannot place machine at ({}, {}) from {file}: {source}", .position.x, .position.y)]
    Placement {
        file: PathBuf,
        position: GridPosition,
        #[source]
        source: PlacementError,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl DataLoadError {
    /// Attach the file being read to a catalog error.
    pub(crate) fn from_catalog(file: &Path, err: CatalogError) -> Self {
        match err {
            CatalogError::DuplicateItem(name) => DataLoadError::DuplicateName {
                file: file.to_path_buf(),
                name,
            },
            CatalogError::UnknownItem(name) => DataLoadError::UnresolvedRef {
                file: file.to_path_buf(),
                name,
                expected_kind: "item",
            },
        }
    }
}

// ===========================================================================
// Formats
// ===========================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ron,
    Toml,
    Json,
}

impl Format {
    /// Lookup order for [`find_data_file`].
    pub const ALL: [Format; 3] = [Format::Ron, Format::Toml, Format::Json];

    pub fn extension(self) -> &'static str {
        match self {
            Format::Ron => "ron",
            Format::Toml => "toml",
            Format::Json => "json",
        }
    }

    /// The format named by `path`'s extension.
    pub fn of(path: &Path) -> Result<Format, DataLoadError> {
        let ext = path.extension().and_then(|e| e.to_str());
        Format::ALL
            .into_iter()
            .find(|format| Some(format.extension()) == ext)
            .ok_or_else(|| DataLoadError::UnsupportedFormat {
                file: path.to_path_buf(),
            })
    }

    fn parse<T: DeserializeOwned>(self, content: &str) -> Result<T, String> {
        match self {
            Format::Ron => ron::from_str(content).map_err(|e| e.to_string()),
            Format::Toml => toml::from_str(content).map_err(|e| e.to_string()),
            Format::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
        }
    }
}

// ===========================================================================
// File discovery
// ===========================================================================

/// The data file called `base_name` in `dir`, in whichever format exists.
///
/// `Ok(None)` when there is none; `ConflictingFormats` when two formats of
/// the same base name sit side by side.
pub fn find_data_file(dir: &Path, base_name: &str) -> Result<Option<PathBuf>, DataLoadError> {
    let mut present = Format::ALL
        .into_iter()
        .map(|format| dir.join(format!("{base_name}.{}", format.extension())))
        .filter(|candidate| candidate.is_file());
    let Some(first) = present.next() else {
        return Ok(None);
    };
    match present.next() {
        Some(second) => Err(DataLoadError::ConflictingFormats { a: first, b: second }),
        None => Ok(Some(first)),
    }
}

/// [`find_data_file`] for files the world cannot be built without.
pub fn require_data_file(dir: &Path, base_name: &str) -> Result<PathBuf, DataLoadError> {
    find_data_file(dir, base_name)?.ok_or_else(|| DataLoadError::MissingRequired {
        file: base_name.to_string(),
        dir: dir.to_path_buf(),
    })
}

// ===========================================================================
// Deserialization
// ===========================================================================

fn read(path: &Path) -> Result<(Format, String), DataLoadError> {
    let format = Format::of(path)?;
    Ok((format, std::fs::read_to_string(path)?))
}

fn parse_error(path: &Path, detail: String) -> DataLoadError {
    DataLoadError::Parse {
        file: path.to_path_buf(),
        detail,
    }
}

/// Read `path` and deserialize it in the format its extension names.
pub fn deserialize_file<T: DeserializeOwned>(path: &Path) -> Result<T, DataLoadError> {
    let (format, content) = read(path)?;
    format.parse(&content).map_err(|detail| parse_error(path, detail))
}

/// Deserialize a top-level list. A TOML document cannot be an array, so
/// TOML files keep the list under `toml_key`.
pub fn deserialize_list<T: DeserializeOwned>(
    path: &Path,
    toml_key: &str,
) -> Result<Vec<T>, DataLoadError> {
    let (format, content) = read(path)?;
    if format != Format::Toml {
        return format.parse(&content).map_err(|detail| parse_error(path, detail));
    }
    let mut table: toml::Table = format
        .parse(&content)
        .map_err(|detail| parse_error(path, detail))?;
    let list = table
        .remove(toml_key)
        .ok_or_else(|| parse_error(path, format!("no `{toml_key}` array in TOML file")))?;
    list.try_into()
        .map_err(|e: toml::de::Error| parse_error(path, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    /// A fresh directory per test.
    fn make_test_dir(suffix: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "beltline_data_test_{suffix}_{}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn cleanup(dir: &Path) {
        let _ = fs::remove_dir_all(dir);
    }

    #[derive(Debug, serde::Deserialize, PartialEq)]
    struct Named {
        name: String,
    }

    #[test]
    fn format_follows_extension() {
        assert_eq!(Format::of(Path::new("items.ron")).unwrap(), Format::Ron);
        assert_eq!(Format::of(Path::new("a/items.toml")).unwrap(), Format::Toml);
        assert_eq!(Format::of(Path::new("items.json")).unwrap(), Format::Json);
        assert!(matches!(
            Format::of(Path::new("items.yaml")),
            Err(DataLoadError::UnsupportedFormat { .. })
        ));
        assert!(matches!(
            Format::of(Path::new("items")),
            Err(DataLoadError::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn find_data_file_missing_and_found() {
        let dir = make_test_dir("find");
        assert_eq!(find_data_file(&dir, "items").unwrap(), None);
        fs::write(dir.join("items.json"), "[]").unwrap();
        assert_eq!(
            find_data_file(&dir, "items").unwrap(),
            Some(dir.join("items.json"))
        );
        cleanup(&dir);
    }

    #[test]
    fn find_data_file_conflict() {
        let dir = make_test_dir("conflict");
        fs::write(dir.join("items.ron"), "[]").unwrap();
        fs::write(dir.join("items.json"), "[]").unwrap();
        assert!(matches!(
            find_data_file(&dir, "items"),
            Err(DataLoadError::ConflictingFormats { .. })
        ));
        cleanup(&dir);
    }

    #[test]
    fn require_data_file_missing() {
        let dir = make_test_dir("require");
        let err = require_data_file(&dir, "items").unwrap_err();
        assert!(matches!(err, DataLoadError::MissingRequired { ref file, .. } if file == "items"));
        cleanup(&dir);
    }

    #[test]
    fn deserialize_list_in_each_format() {
        let dir = make_test_dir("lists");
        fs::write(dir.join("a.ron"), r#"[(name: "iron")]"#).unwrap();
        fs::write(dir.join("b.json"), r#"[{"name": "iron"}]"#).unwrap();
        fs::write(dir.join("c.toml"), "[[items]]\nname = \"iron\"\n").unwrap();
        let expected = vec![Named {
            name: "iron".to_string(),
        }];
        for file in ["a.ron", "b.json", "c.toml"] {
            let list: Vec<Named> = deserialize_list(&dir.join(file), "items").unwrap();
            assert_eq!(list, expected, "{file}");
        }
        cleanup(&dir);
    }

    #[test]
    fn deserialize_list_toml_missing_key() {
        let dir = make_test_dir("toml_key");
        let path = dir.join("items.toml");
        fs::write(&path, "[[things]]\nname = \"iron\"\n").unwrap();
        assert!(matches!(
            deserialize_list::<Named>(&path, "items"),
            Err(DataLoadError::Parse { .. })
        ));
        cleanup(&dir);
    }

    #[test]
    fn deserialize_file_parse_error() {
        let dir = make_test_dir("parse");
        let path = dir.join("config.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            deserialize_file::<Named>(&path),
            Err(DataLoadError::Parse { .. })
        ));
        cleanup(&dir);
    }
}
