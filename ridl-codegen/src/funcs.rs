//! Template helper functions
//!
//! Builds the `minijinja` environment a run renders with: the
//! type-translation functions closing over the live mapping table, plus
//! the string and index-arithmetic utilities templates lean on. The
//! environment is a per-run value, not a global registry, so tests can
//! render with different mappings in the same process.

use std::path::Path;
use std::sync::Arc;

use minijinja::{Environment, Error, ErrorKind};

use crate::translate;
use crate::typemap::TypeMap;

fn render_err(err: translate::TranslateError) -> Error {
    Error::new(ErrorKind::InvalidOperation, err.to_string())
}

/// Builds the helper environment for one generation run.
pub fn template_env(typemap: Arc<TypeMap>) -> Environment<'static> {
    let mut env = Environment::new();

    let m = typemap.clone();
    env.add_function("cpptype", move |t: String| -> Result<String, Error> {
        translate::cpp_type(&t, &m).map_err(render_err)
    });
    let m = typemap.clone();
    env.add_function("argtype", move |t: String| -> Result<String, Error> {
        translate::arg_type(&t, &m).map_err(render_err)
    });
    let m = typemap;
    env.add_function("restype", move |t: String| -> Result<String, Error> {
        translate::result_type(&t, &m).map_err(render_err)
    });

    env.add_function("eltype", |t: String| -> Result<String, Error> {
        translate::elem_type(&t)
            .map(str::to_string)
            .map_err(render_err)
    });
    env.add_function("dims", |t: String| -> Result<String, Error> {
        translate::dims(&t).map(str::to_string).map_err(render_err)
    });
    env.add_function("isslice", |t: String| translate::is_slice(&t));

    env.add_function("basename", |path: String| basename(&path));
    env.add_function("tolower", |s: String| s.to_lowercase());
    env.add_function("decap", |s: String| decap(&s));
    env.add_function("trimprefix", |s: String, prefix: String| {
        s.strip_prefix(&prefix).unwrap_or(&s).to_string()
    });
    env.add_function("trimsuffix", |s: String, suffix: String| {
        s.strip_suffix(&suffix).unwrap_or(&s).to_string()
    });

    env.add_function("add", |a: i64, b: i64| a + b);
    env.add_function("subtract", |a: i64, b: i64| a - b);
    env.add_function("multiply", |a: i64, b: i64| a * b);
    env.add_function("divide", |a: i64, b: i64| -> Result<i64, Error> {
        if b == 0 {
            return Err(Error::new(ErrorKind::InvalidOperation, "division by zero"));
        }
        Ok(a / b)
    });

    env
}

/// File name without directory or final extension.
fn basename(path: &str) -> String {
    Path::new(path)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Lower-cases the first character, leaving the rest untouched.
fn decap(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) if first.is_uppercase() => {
            first.to_lowercase().collect::<String>() + chars.as_str()
        }
        _ => s.to_string(),
    }
}
