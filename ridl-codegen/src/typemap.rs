//! Base-type mapping table
//!
//! Maps primitive and named source type names to target type names with
//! a per-type pass-by-reference flag. The built-in defaults cover the
//! C++ target; a JSON file of records can extend or override them at
//! startup, and the live table can be dumped back out for inspection or
//! for bootstrapping new overrides.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

/// One record of the mapping table, in the on-disk JSON shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeMapping {
    #[serde(rename = "source-type")]
    pub source_type: String,
    #[serde(rename = "target-type")]
    pub target_type: String,
    #[serde(rename = "pass-by-ref", default)]
    pub pass_by_ref: bool,
}

impl TypeMapping {
    pub fn new(source: &str, target: &str, pass_by_ref: bool) -> Self {
        Self {
            source_type: source.to_string(),
            target_type: target.to_string(),
            pass_by_ref,
        }
    }
}

/// Errors loading or saving a mapping file.
#[derive(Debug, thiserror::Error)]
pub enum TypeMapError {
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("serializing type map: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// The live mapping table. Small scalar types default to pass-by-value;
/// strings, errors and user aggregates default to pass-by-reference so
/// argument translation avoids copies.
#[derive(Debug, Clone)]
pub struct TypeMap {
    entries: HashMap<String, TypeMapping>,
}

const DEFAULT_MAPPINGS: &[(&str, &str, bool)] = &[
    ("byte", "std::byte", false),
    ("error", "std::runtime_error", true),
    ("string", "std::string", true),
    ("float32", "float", false),
    ("float64", "double", false),
    ("rune", "uint32_t", false),
    ("bool", "bool", false),
    ("float", "double", false),
    ("int", "int", false),
    ("uint", "unsigned int", false),
    ("int8", "int8_t", false),
    ("uint8", "uint8_t", false),
    ("int16", "int16_t", false),
    ("uint16", "uint16_t", false),
    ("int32", "int32_t", false),
    ("uint32", "uint32_t", false),
    ("int64", "int64_t", false),
    ("uint64", "uint64_t", false),
    ("uintptr", "ptrdiff_t", false),
    ("complex64", "std::complex<float>", false),
    ("complex128", "std::complex<double>", false),
];

impl Default for TypeMap {
    fn default() -> Self {
        let mut map = TypeMap {
            entries: HashMap::with_capacity(DEFAULT_MAPPINGS.len()),
        };
        for (source, target, pass_by_ref) in DEFAULT_MAPPINGS {
            map.insert(TypeMapping::new(source, target, *pass_by_ref));
        }
        map
    }
}

impl TypeMap {
    /// Adds or replaces one mapping record.
    pub fn insert(&mut self, mapping: TypeMapping) {
        self.entries.insert(mapping.source_type.clone(), mapping);
    }

    /// Merges the records of a JSON mapping file over the current table.
    /// Names the file does not mention keep their current mapping.
    pub fn merge_file(&mut self, path: &Path) -> Result<(), TypeMapError> {
        let data = std::fs::read_to_string(path).map_err(|source| TypeMapError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mappings: Vec<TypeMapping> =
            serde_json::from_str(&data).map_err(|source| TypeMapError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        debug!(path = %path.display(), records = mappings.len(), "merged type map overrides");
        for mapping in mappings {
            self.insert(mapping);
        }
        Ok(())
    }

    /// Resolves a base type name to its target name and pass-by-reference
    /// flag. Names absent from the table pass through unchanged, by
    /// value.
    pub fn lookup(&self, name: &str) -> (String, bool) {
        match self.entries.get(name) {
            Some(m) => (m.target_type.clone(), m.pass_by_ref),
            None => (name.to_string(), false),
        }
    }

    /// Writes the live table as JSON, sorted by source name for a
    /// reproducible dump.
    pub fn dump<W: Write>(&self, mut w: W) -> Result<(), TypeMapError> {
        let mut records: Vec<&TypeMapping> = self.entries.values().collect();
        records.sort_by(|a, b| a.source_type.cmp(&b.source_type));
        serde_json::to_writer_pretty(&mut w, &records)?;
        w.write_all(b"\n").map_err(|source| TypeMapError::Io {
            path: PathBuf::from("<dump>"),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    #[test]
    fn defaults_cover_the_primitives() {
        let map = TypeMap::default();
        assert_eq!(map.lookup("int"), ("int".to_string(), false));
        assert_eq!(map.lookup("string"), ("std::string".to_string(), true));
        assert_eq!(map.lookup("float64"), ("double".to_string(), false));
        assert_eq!(
            map.lookup("error"),
            ("std::runtime_error".to_string(), true)
        );
    }

    #[test]
    fn unknown_names_pass_through_by_value() {
        let map = TypeMap::default();
        assert_eq!(map.lookup("Widget"), ("Widget".to_string(), false));
    }

    #[test]
    fn file_overrides_extend_and_replace() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("map.json");
        let mut f = std::fs::File::create(&path).unwrap();
        write!(
            f,
            r#"[
                {{"source-type": "Timepoint",
                  "target-type": "std::chrono::steady_clock::time_point"}},
                {{"source-type": "int", "target-type": "long", "pass-by-ref": false}}
            ]"#
        )
        .unwrap();
        drop(f);

        let mut map = TypeMap::default();
        map.merge_file(&path).unwrap();

        // New record added, existing default overridden, rest untouched.
        assert_eq!(
            map.lookup("Timepoint"),
            ("std::chrono::steady_clock::time_point".to_string(), false)
        );
        assert_eq!(map.lookup("int"), ("long".to_string(), false));
        assert_eq!(map.lookup("bool"), ("bool".to_string(), false));
    }

    #[test]
    fn dump_roundtrips_through_merge() {
        let mut map = TypeMap::default();
        map.insert(TypeMapping::new("Handle", "uint64_t", false));

        let mut buf = Vec::new();
        map.dump(&mut buf).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dumped.json");
        std::fs::write(&path, &buf).unwrap();

        let mut fresh = TypeMap::default();
        fresh.merge_file(&path).unwrap();
        assert_eq!(fresh.lookup("Handle"), ("uint64_t".to_string(), false));
    }
}
