//! Input-unit loading
//!
//! An input unit is either a single symbol-stream JSON file or a
//! directory whose `*.ridl.json` files together describe one package.
//! Directory members are merged in filename order so the declaration
//! model comes out deterministic regardless of readdir order.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context as _, Result};
use tracing::debug;

use ridl_model::SymbolSet;

/// Suffix that marks a file as part of a directory unit.
const UNIT_SUFFIX: &str = ".ridl.json";

/// A loaded input unit, ready for model construction.
#[derive(Debug)]
pub struct InputUnit {
    pub symbols: SymbolSet,
    /// Directory the unit was read from, exposed to templates.
    pub directory: PathBuf,
    /// Source filenames that contributed, in merge order.
    pub filenames: Vec<String>,
}

/// Loads a unit from a file or directory path.
pub fn load_unit(input: &Path) -> Result<InputUnit> {
    let meta = fs::metadata(input)
        .with_context(|| format!("reading {}", input.display()))?;
    if meta.is_dir() {
        load_dir(input)
    } else {
        load_file(input)
    }
}

fn load_file(path: &Path) -> Result<InputUnit> {
    let symbols = parse_set(path)?;
    let directory = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."))
        .to_path_buf();
    let filenames = vec![file_name(path)];
    Ok(InputUnit {
        symbols,
        directory,
        filenames,
    })
}

fn load_dir(dir: &Path) -> Result<InputUnit> {
    let mut members = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("reading {}", dir.display()))? {
        let entry = entry.with_context(|| format!("reading {}", dir.display()))?;
        let path = entry.path();
        let is_member = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(UNIT_SUFFIX));
        if path.is_file() && is_member {
            members.push(path);
        }
    }
    if members.is_empty() {
        bail!("{}: no {} files found", dir.display(), UNIT_SUFFIX);
    }
    members.sort();

    let mut merged: Option<SymbolSet> = None;
    let mut filenames = Vec::with_capacity(members.len());
    for path in &members {
        debug!(file = %path.display(), "merging symbol stream");
        let set = parse_set(path)?;
        filenames.push(file_name(path));
        match &mut merged {
            None => merged = Some(set),
            Some(acc) => {
                if acc.package != set.package {
                    bail!(
                        "{}: package {:?} does not match {:?}",
                        path.display(),
                        set.package,
                        acc.package
                    );
                }
                for import in set.imports {
                    if !acc.imports.contains(&import) {
                        acc.imports.push(import);
                    }
                }
                acc.symbols.extend(set.symbols);
            }
        }
    }
    // members is non-empty, so merged is set by now
    let symbols = match merged {
        Some(set) => set,
        None => bail!("{}: no symbol streams loaded", dir.display()),
    };
    Ok(InputUnit {
        symbols,
        directory: dir.to_path_buf(),
        filenames,
    })
}

fn parse_set(path: &Path) -> Result<SymbolSet> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("parsing {}", path.display()))
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
