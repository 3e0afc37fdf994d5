//! Template files, directives and output destinations
//!
//! A template is a UTF-8 text file, optionally starting with a leading
//! contiguous run of `// ridl:` directive lines. Directives are stripped
//! before the body reaches the template engine; a directive-looking line
//! after the first ordinary line is plain template text. The only
//! directive is `output <spec>`, declaring the suggested output path;
//! the spec is itself a template, rendered against a small metadata
//! context so file names can be parameterized by package name and the
//! like.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use minijinja::Environment;
use serde::Serialize;
use tracing::debug;

use crate::GenError;
use ridl_model::Context;

/// Conventional template-file suffix tried after the exact name.
pub const TEMPLATE_SUFFIX: &str = ".template";

/// Output spec designating the process's standard output.
pub const STDOUT_SENTINEL: &str = "-";

const DIRECTIVE_PREFIX: &str = "//";
const DIRECTIVE_TAG: &str = "ridl:";

/// Locates the file backing a template name: the name itself as a
/// literal path (exact, then suffixed), then each search directory in
/// order with the same two probes. First match wins.
pub fn find_template(name: &str, search_dirs: &[PathBuf]) -> Option<PathBuf> {
    let probe = |candidate: PathBuf| -> Option<PathBuf> {
        if candidate.is_file() {
            return Some(candidate);
        }
        let mut suffixed = candidate.into_os_string();
        suffixed.push(TEMPLATE_SUFFIX);
        let suffixed = PathBuf::from(suffixed);
        suffixed.is_file().then_some(suffixed)
    };

    if let Some(path) = probe(PathBuf::from(name)) {
        debug!(template = name, path = %path.display(), "template found");
        return Some(path);
    }
    for dir in search_dirs {
        if let Some(path) = probe(dir.join(name)) {
            debug!(template = name, path = %path.display(), "template found");
            return Some(path);
        }
    }
    debug!(template = name, "template not found");
    None
}

/// A template with its directives stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTemplate {
    /// The body handed verbatim to the template engine.
    pub body: String,
    /// The `output` directive's spec, if present.
    pub output_spec: Option<String>,
}

// The text of a directive line, or None for ordinary lines.
fn directive_text(line: &str) -> Option<&str> {
    let rest = line.strip_prefix(DIRECTIVE_PREFIX)?;
    let rest = rest.trim_start().strip_prefix(DIRECTIVE_TAG)?;
    Some(rest.trim())
}

/// Strips the leading directive block of a template source and extracts
/// the embedded output spec. A second `output` directive is fatal.
/// Directive lines after the leading block are left in the body as
/// ordinary text.
pub fn parse_template(source: &str, origin: &Path) -> Result<ParsedTemplate, GenError> {
    let mut body = String::with_capacity(source.len());
    let mut output_spec: Option<String> = None;
    let mut in_leading_block = true;

    for line in source.lines() {
        if in_leading_block {
            if let Some(text) = directive_text(line) {
                if text.split_whitespace().next() == Some("output") {
                    if output_spec.is_some() {
                        return Err(GenError::MultipleOutputSpecs {
                            path: origin.display().to_string(),
                        });
                    }
                    let spec = text["output".len()..].trim();
                    output_spec = Some(spec.to_string());
                    debug!(template = %origin.display(), spec, "output spec");
                }
                // Unknown directives are stripped and ignored.
                continue;
            }
            in_leading_block = false;
        }
        body.push_str(line);
        body.push('\n');
    }

    Ok(ParsedTemplate { body, output_spec })
}

/// The fixed metadata context an output spec is rendered against.
#[derive(Debug, Clone, Serialize)]
pub struct OutputMeta {
    pub template: String,
    pub package: String,
    pub directory: String,
    pub time: DateTime<Utc>,
    pub username: String,
    pub hostname: String,
}

impl OutputMeta {
    pub fn new(template: &str, ctx: &Context) -> Self {
        Self {
            template: template.to_string(),
            package: ctx.package.clone(),
            directory: ctx.directory.clone(),
            time: ctx.build_time,
            username: ctx.username.clone(),
            hostname: ctx.hostname.clone(),
        }
    }
}

/// Where a rendered template goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    Stdout,
    File(PathBuf),
}

/// Resolves a template's destination. An explicit override wins
/// unconditionally; otherwise the embedded spec is rendered against the
/// metadata context. An empty result, or the `-` sentinel, selects
/// standard output.
pub fn resolve_destination(
    override_path: Option<&str>,
    embedded_spec: Option<&str>,
    meta: &OutputMeta,
    env: &Environment<'_>,
) -> Result<Destination, GenError> {
    let raw = match override_path {
        Some(path) => path.to_string(),
        None => match embedded_spec {
            Some(spec) => {
                env.render_str(spec, meta)
                    .map_err(|source| GenError::Render {
                        template: meta.template.clone(),
                        source,
                    })?
            }
            None => String::new(),
        },
    };
    let raw = raw.trim();
    if raw.is_empty() || raw == STDOUT_SENTINEL {
        Ok(Destination::Stdout)
    } else {
        Ok(Destination::File(PathBuf::from(raw)))
    }
}

/// An open output destination. Dry runs render fully and discard;
/// files are created or truncated. The sink must be finished explicitly
/// so flush errors are observed; dropping without finishing still closes
/// the file.
pub enum Sink {
    Discard,
    Stdout(io::Stdout),
    File { path: PathBuf, writer: BufWriter<File> },
}

impl Sink {
    pub fn discard() -> Self {
        Sink::Discard
    }

    pub fn open(dest: &Destination) -> Result<Self, GenError> {
        match dest {
            Destination::Stdout => Ok(Sink::Stdout(io::stdout())),
            Destination::File(path) => {
                let file = File::create(path).map_err(|source| GenError::Output {
                    path: path.display().to_string(),
                    source,
                })?;
                Ok(Sink::File {
                    path: path.clone(),
                    writer: BufWriter::new(file),
                })
            }
        }
    }

    pub fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        match self {
            Sink::Discard => Ok(()),
            Sink::Stdout(out) => out.write_all(data),
            Sink::File { writer, .. } => writer.write_all(data),
        }
    }

    /// Flushes and closes the destination, reporting the first error.
    pub fn finish(self) -> Result<(), GenError> {
        match self {
            Sink::Discard => Ok(()),
            Sink::Stdout(mut out) => out.flush().map_err(|source| GenError::Output {
                path: STDOUT_SENTINEL.to_string(),
                source,
            }),
            Sink::File { path, mut writer } => {
                writer.flush().map_err(|source| GenError::Output {
                    path: path.display().to_string(),
                    source,
                })
            }
        }
    }

    /// A printable name for reports and logs.
    pub fn describe(&self) -> String {
        match self {
            Sink::Discard => "<discard>".to_string(),
            Sink::Stdout(_) => STDOUT_SENTINEL.to_string(),
            Sink::File { path, .. } => path.display().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::funcs::template_env;
    use crate::typemap::TypeMap;

    fn meta() -> OutputMeta {
        OutputMeta {
            template: "cpp-header".to_string(),
            package: "wire".to_string(),
            directory: "/src/wire".to_string(),
            time: Utc::now(),
            username: "alice".to_string(),
            hostname: "bld1".to_string(),
        }
    }

    #[test]
    fn leading_directive_block_is_stripped() {
        let src = "// ridl: output {{ package }}.h\n\
                   // ridl: keep this out of the body\n\
                   #pragma once\n\
                   // ridl: output late.h\n";
        let parsed = parse_template(src, Path::new("t.template")).unwrap();
        assert_eq!(parsed.output_spec.as_deref(), Some("{{ package }}.h"));
        // The late directive is ordinary text, not a second spec.
        assert_eq!(parsed.body, "#pragma once\n// ridl: output late.h\n");
    }

    #[test]
    fn second_output_directive_is_fatal() {
        let src = "// ridl: output a.h\n// ridl: output b.h\nbody\n";
        let err = parse_template(src, Path::new("t.template")).unwrap_err();
        assert!(matches!(err, GenError::MultipleOutputSpecs { .. }));
    }

    #[test]
    fn directiveless_template_has_no_spec() {
        let parsed = parse_template("plain body\n", Path::new("t")).unwrap();
        assert_eq!(parsed.output_spec, None);
        assert_eq!(parsed.body, "plain body\n");
    }

    #[test]
    fn find_probes_exact_then_suffixed_then_search_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let exact = dir.path().join("report");
        std::fs::write(&exact, "x").unwrap();
        let suffixed = dir.path().join("header.template");
        std::fs::write(&suffixed, "y").unwrap();

        let dirs = vec![dir.path().to_path_buf()];
        assert_eq!(find_template("report", &dirs), Some(exact));
        assert_eq!(find_template("header", &dirs), Some(suffixed));
        assert_eq!(find_template("missing", &dirs), None);
    }

    #[test]
    fn override_wins_over_embedded_spec() {
        let env = template_env(Arc::new(TypeMap::default()));
        let dest =
            resolve_destination(Some("forced.h"), Some("{{ package }}.h"), &meta(), &env).unwrap();
        assert_eq!(dest, Destination::File(PathBuf::from("forced.h")));
    }

    #[test]
    fn embedded_spec_renders_against_metadata() {
        let env = template_env(Arc::new(TypeMap::default()));
        let dest = resolve_destination(
            None,
            Some("{{ package }}-{{ template }}.h"),
            &meta(),
            &env,
        )
        .unwrap();
        assert_eq!(dest, Destination::File(PathBuf::from("wire-cpp-header.h")));
    }

    #[test]
    fn empty_or_sentinel_spec_means_stdout() {
        let env = template_env(Arc::new(TypeMap::default()));
        let m = meta();
        assert_eq!(
            resolve_destination(None, None, &m, &env).unwrap(),
            Destination::Stdout
        );
        assert_eq!(
            resolve_destination(None, Some(""), &m, &env).unwrap(),
            Destination::Stdout
        );
        assert_eq!(
            resolve_destination(Some("-"), Some("x.h"), &m, &env).unwrap(),
            Destination::Stdout
        );
    }

    #[test]
    fn file_sink_creates_and_truncates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.h");
        std::fs::write(&path, "old and much longer content").unwrap();

        let mut sink = Sink::open(&Destination::File(path.clone())).unwrap();
        sink.write_all(b"new").unwrap();
        sink.finish().unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "new");
    }

    #[test]
    fn discard_sink_writes_nothing() {
        let mut sink = Sink::discard();
        sink.write_all(b"anything").unwrap();
        sink.finish().unwrap();
    }
}
