//! Template-driven generation for the ridl interface compiler
//!
//! Takes the assembled declaration context from `ridl-model` and renders
//! it through template files: a configurable type-mapping table, the
//! type-translation engine, the template helper functions, and the
//! pipeline that resolves template files, strips directives, renders and
//! writes output.

pub mod config;
pub mod funcs;
pub mod pipeline;
pub mod template;
pub mod translate;
pub mod typemap;

pub use config::{ConfigError, GeneratorConfig};
pub use funcs::template_env;
pub use pipeline::{generate, load_typemap, GenReport, GeneratedOutput};
pub use template::{
    find_template, parse_template, resolve_destination, Destination, OutputMeta, ParsedTemplate,
    Sink, STDOUT_SENTINEL, TEMPLATE_SUFFIX,
};
pub use translate::{
    arg_type, cpp_type, dims, elem_type, is_slice, result_type, translate, TranslateError,
    EMPTY_PAYLOAD,
};
pub use typemap::{TypeMap, TypeMapError, TypeMapping};

/// Generation errors. All are fatal for the template (and run) they
/// occur in; nothing is silently swallowed.
#[derive(Debug, thiserror::Error)]
pub enum GenError {
    #[error("{name:?}: template file not found")]
    TemplateNotFound { name: String },

    #[error("{path}: template file contains multiple output specifications")]
    MultipleOutputSpecs { path: String },

    #[error("{path}: {source}")]
    ReadTemplate {
        path: String,
        source: std::io::Error,
    },

    #[error("render {template:?}: {source}")]
    Render {
        template: String,
        source: minijinja::Error,
    },

    #[error("{path}: {source}")]
    Output {
        path: String,
        source: std::io::Error,
    },

    #[error(transparent)]
    TypeMap(#[from] TypeMapError),
}
