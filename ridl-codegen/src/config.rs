//! Generator configuration
//!
//! An explicit value threaded into the pipeline entry point rather than
//! ambient process state, so the pipeline can be driven with different
//! configurations in the same process. Loadable from a TOML file; CLI
//! flags are merged over the file's contents.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Everything one generation run needs to know.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Template names to generate, in order.
    pub templates: Vec<String>,
    /// Explicit output path; overrides any embedded output spec.
    /// The `-` sentinel selects standard output.
    pub output: Option<String>,
    /// Directories probed, in order, when resolving template names.
    pub template_dirs: Vec<PathBuf>,
    /// JSON file of type-mapping records merged over the built-in table.
    pub typemap_file: Option<PathBuf>,
    /// Render everything, write nothing.
    pub dry_run: bool,
}

impl GeneratorConfig {
    /// Loads a configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Saves the configuration as TOML.
    pub fn to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self).map_err(ConfigError::Serialize)?;
        std::fs::write(path, content).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Merges another configuration over this one; set fields of `other`
    /// take precedence, template lists append.
    pub fn merge(&mut self, other: GeneratorConfig) {
        self.templates.extend(other.templates);
        self.template_dirs.extend(other.template_dirs);
        if other.output.is_some() {
            self.output = other.output;
        }
        if other.typemap_file.is_some() {
            self.typemap_file = other.typemap_file;
        }
        if other.dry_run {
            self.dry_run = true;
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{path}: {source}")]
    Parse { path: PathBuf, source: toml::de::Error },

    #[error("serializing configuration: {0}")]
    Serialize(toml::ser::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ridl.toml");

        let config = GeneratorConfig {
            templates: vec!["cpp-header".to_string()],
            output: None,
            template_dirs: vec![PathBuf::from("/usr/share/ridl/templates")],
            typemap_file: Some(PathBuf::from("types.json")),
            dry_run: false,
        };
        config.to_file(&path).unwrap();

        let loaded = GeneratorConfig::from_file(&path).unwrap();
        assert_eq!(loaded.templates, config.templates);
        assert_eq!(loaded.template_dirs, config.template_dirs);
        assert_eq!(loaded.typemap_file, config.typemap_file);
    }

    #[test]
    fn partial_files_fill_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ridl.toml");
        std::fs::write(&path, "templates = [\"cpp-header\"]\n").unwrap();

        let loaded = GeneratorConfig::from_file(&path).unwrap();
        assert_eq!(loaded.templates, vec!["cpp-header".to_string()]);
        assert!(!loaded.dry_run);
        assert!(loaded.output.is_none());
    }

    #[test]
    fn merge_appends_lists_and_overrides_scalars() {
        let mut base = GeneratorConfig {
            templates: vec!["a".to_string()],
            output: Some("base.h".to_string()),
            ..Default::default()
        };
        base.merge(GeneratorConfig {
            templates: vec!["b".to_string()],
            dry_run: true,
            ..Default::default()
        });
        assert_eq!(base.templates, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(base.output.as_deref(), Some("base.h"));
        assert!(base.dry_run);
    }
}
