//! Generation pipeline
//!
//! Runs the requested templates strictly in order against one assembled
//! context: resolve the template file, strip directives, render the body,
//! resolve the destination, write. The type map and helper environment
//! are built once per run and shared read-only by every template; any
//! failure aborts the remainder of the run. Already-written files are
//! not rolled back (re-running regenerates correctly).

use std::sync::Arc;

use minijinja::value::Value;
use tracing::{debug, info};

use crate::config::GeneratorConfig;
use crate::funcs::template_env;
use crate::template::{
    find_template, parse_template, resolve_destination, Destination, OutputMeta, Sink,
};
use crate::typemap::TypeMap;
use crate::GenError;
use ridl_model::Context;

/// What one generation run produced.
#[derive(Debug, Default)]
pub struct GenReport {
    pub outputs: Vec<GeneratedOutput>,
}

/// One rendered template and where it went.
#[derive(Debug)]
pub struct GeneratedOutput {
    pub template: String,
    pub destination: String,
    pub bytes: usize,
}

/// Loads the effective type map for a configuration: built-in defaults
/// plus any configured override file.
pub fn load_typemap(config: &GeneratorConfig) -> Result<TypeMap, GenError> {
    let mut typemap = TypeMap::default();
    if let Some(path) = &config.typemap_file {
        typemap.merge_file(path)?;
    }
    Ok(typemap)
}

/// Renders every requested template against the context.
pub fn generate(ctx: &Context, config: &GeneratorConfig) -> Result<GenReport, GenError> {
    let typemap = Arc::new(load_typemap(config)?);
    let env = template_env(typemap);
    let ctx_value = Value::from_serialize(ctx);

    let mut report = GenReport::default();
    for name in &config.templates {
        let path = find_template(name, &config.template_dirs).ok_or_else(|| {
            GenError::TemplateNotFound { name: name.clone() }
        })?;
        let source = std::fs::read_to_string(&path).map_err(|source| GenError::ReadTemplate {
            path: path.display().to_string(),
            source,
        })?;
        let parsed = parse_template(&source, &path)?;

        // Render before opening the destination: a failing template must
        // not truncate an existing output file.
        let rendered = env
            .render_str(&parsed.body, ctx_value.clone())
            .map_err(|source| GenError::Render {
                template: name.clone(),
                source,
            })?;

        let meta = OutputMeta::new(name, ctx);
        let dest = resolve_destination(
            config.output.as_deref(),
            parsed.output_spec.as_deref(),
            &meta,
            &env,
        )?;

        let mut sink = if config.dry_run {
            Sink::discard()
        } else {
            Sink::open(&dest)?
        };
        let destination = sink.describe();
        debug!(template = name, destination = %destination, bytes = rendered.len(), "writing");

        let write_result = sink.write_all(rendered.as_bytes());
        let finish_result = sink.finish();
        // First error wins; the close error is reported only when the
        // write itself succeeded.
        if let Err(source) = write_result {
            return Err(GenError::Output {
                path: destination,
                source,
            });
        }
        finish_result?;

        info!(template = name, destination = %destination, "generated");
        report.outputs.push(GeneratedOutput {
            template: name.clone(),
            destination: match dest {
                Destination::Stdout => crate::template::STDOUT_SENTINEL.to_string(),
                Destination::File(p) => p.display().to_string(),
            },
            bytes: rendered.len(),
        });
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    use ridl_model::{derive_enums, Context, HostAbi, Package, Shape, SourcePos, Symbol};

    fn sym(name: &str, line: u32, shape: Shape) -> Symbol {
        Symbol {
            name: name.to_string(),
            pos: SourcePos::new("pipe.ridl", line, 1),
            shape,
        }
    }

    fn color_context(blue: i64) -> Context {
        let constant = |name: &str, value: i64, line: u32| {
            sym(
                name,
                line,
                Shape::Const {
                    typ: "Color".to_string(),
                    value: value.to_string(),
                    exact: value.to_string(),
                },
            )
        };
        let symbols = vec![
            sym(
                "Color",
                1,
                Shape::Scalar {
                    underlying: "int".to_string(),
                    pointer: false,
                },
            ),
            constant("Red", 0, 3),
            constant("Green", 1, 4),
            constant("Blue", blue, 5),
        ];
        let abi = HostAbi::for_symbols(&symbols);
        let mut pkg = Package::from_symbols("paint", &[], &symbols, &abi).unwrap();
        let enums = derive_enums(&mut pkg);
        Context::new("/src/paint", vec!["pipe.ridl".to_string()], &pkg, enums)
    }

    fn config_for(dir: &std::path::Path, template: &str) -> GeneratorConfig {
        GeneratorConfig {
            templates: vec![template.to_string()],
            template_dirs: vec![dir.to_path_buf()],
            ..Default::default()
        }
    }

    const ENUM_TEMPLATE: &str = "\
// ridl: output {{ package }}_enums.h
{% for e in enums %}enum {{ e.typedef.name }} /* dense: {{ e.dense }} */ {
{% for m in e.members %}    {{ m.name }} = {{ m.value }},
{% endfor %}};
{% endfor %}";

    #[test]
    fn dense_enum_generates_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("enums.template"), ENUM_TEMPLATE).unwrap();

        let out_dir = tempfile::tempdir().unwrap();
        let out_path = out_dir.path().join("paint.h");
        let mut config = config_for(dir.path(), "enums");
        config.output = Some(out_path.display().to_string());

        let report = generate(&color_context(2), &config).unwrap();
        assert_eq!(report.outputs.len(), 1);

        let written = std::fs::read_to_string(&out_path).unwrap();
        assert!(written.contains("enum Color /* dense: true */"));
        assert!(written.contains("    Red = 0,"));
        assert!(written.contains("    Blue = 2,"));
    }

    #[test]
    fn gap_in_values_renders_sparse() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("enums.template"), ENUM_TEMPLATE).unwrap();

        let out_dir = tempfile::tempdir().unwrap();
        let out_path = out_dir.path().join("paint.h");
        let mut config = config_for(dir.path(), "enums");
        config.output = Some(out_path.display().to_string());

        generate(&color_context(5), &config).unwrap();
        let written = std::fs::read_to_string(&out_path).unwrap();
        assert!(written.contains("enum Color /* dense: false */"));
        assert!(written.contains("    Blue = 5,"));
    }

    #[test]
    fn double_output_directive_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("bad.template"),
            "// ridl: output a.h\n// ridl: output b.h\nbody\n",
        )
        .unwrap();

        let err = generate(&color_context(2), &config_for(dir.path(), "bad")).unwrap_err();
        assert!(matches!(err, GenError::MultipleOutputSpecs { .. }));
        assert!(!dir.path().join("a.h").exists());
        assert!(!dir.path().join("b.h").exists());
    }

    #[test]
    fn missing_template_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let err = generate(&color_context(2), &config_for(dir.path(), "nope")).unwrap_err();
        assert!(matches!(err, GenError::TemplateNotFound { .. }));
    }

    #[test]
    fn embedded_spec_names_the_output_file() {
        let dir = tempfile::tempdir().unwrap();
        let spec_path = dir.path().join("{{ package }}_enums.h");
        let template = format!(
            "// ridl: output {}\nnamespace {}\n",
            spec_path.display(),
            "{{ package }}"
        );
        std::fs::write(dir.path().join("enums.template"), template).unwrap();

        generate(&color_context(2), &config_for(dir.path(), "enums")).unwrap();
        let expected = dir.path().join("paint_enums.h");
        assert!(expected.exists());
        assert!(std::fs::read_to_string(expected)
            .unwrap()
            .contains("namespace paint"));
    }

    #[test]
    fn dry_run_renders_but_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("enums.template"), ENUM_TEMPLATE).unwrap();

        let out_dir = tempfile::tempdir().unwrap();
        let out_path = out_dir.path().join("paint.h");
        let mut config = config_for(dir.path(), "enums");
        config.output = Some(out_path.display().to_string());
        config.dry_run = true;

        let report = generate(&color_context(2), &config).unwrap();
        assert_eq!(report.outputs[0].destination, "<discard>");
        assert!(!out_path.exists());
    }

    #[test]
    fn render_failure_does_not_truncate_existing_output() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("broken.template"),
            "{{ cpptype('[unclosed') }}\n",
        )
        .unwrap();

        let out_dir = tempfile::tempdir().unwrap();
        let out_path = out_dir.path().join("keep.h");
        std::fs::write(&out_path, "previous contents").unwrap();

        let mut config = config_for(dir.path(), "broken");
        config.output = Some(out_path.display().to_string());

        let err = generate(&color_context(2), &config).unwrap_err();
        assert!(matches!(err, GenError::Render { .. }));
        assert_eq!(
            std::fs::read_to_string(&out_path).unwrap(),
            "previous contents"
        );
    }

    #[test]
    fn translation_helpers_reach_the_configured_map() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("types.json"),
            r#"[{"source-type": "Color", "target-type": "paint::Color", "pass-by-ref": false}]"#,
        )
        .unwrap();
        std::fs::write(
            dir.path().join("t.template"),
            "{{ cpptype('[]Color') }}\n",
        )
        .unwrap();

        let out_dir = tempfile::tempdir().unwrap();
        let out_path = out_dir.path().join("o.txt");
        let mut config = config_for(dir.path(), "t");
        config.output = Some(out_path.display().to_string());
        config.typemap_file = Some(dir.path().join("types.json"));

        generate(&color_context(2), &config).unwrap();
        assert_eq!(
            std::fs::read_to_string(&out_path).unwrap(),
            "std::vector<paint::Color>\n"
        );
    }

    #[test]
    fn templates_run_in_request_order_and_stop_at_first_failure() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("ok.template"), "fine\n").unwrap();

        let out_dir = tempfile::tempdir().unwrap();
        let first = out_dir.path().join("first.txt");
        let config = GeneratorConfig {
            templates: vec!["ok".to_string(), "missing".to_string()],
            template_dirs: vec![dir.path().to_path_buf()],
            output: Some(first.display().to_string()),
            ..Default::default()
        };

        let err = generate(&color_context(2), &config).unwrap_err();
        assert!(matches!(err, GenError::TemplateNotFound { .. }));
        // The first template already ran; no rollback.
        assert!(first.exists());
    }

    #[test]
    fn search_path_order_is_respected() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        std::fs::write(first.path().join("t.template"), "from-first\n").unwrap();
        std::fs::write(second.path().join("t.template"), "from-second\n").unwrap();

        let out_dir = tempfile::tempdir().unwrap();
        let out_path = out_dir.path().join("o.txt");
        let config = GeneratorConfig {
            templates: vec!["t".to_string()],
            template_dirs: vec![first.path().to_path_buf(), second.path().to_path_buf()],
            output: Some(out_path.display().to_string()),
            ..Default::default()
        };
        generate(&color_context(2), &config).unwrap();
        assert_eq!(
            std::fs::read_to_string(&out_path).unwrap(),
            "from-first\n"
        );
    }

    #[test]
    fn literal_template_path_wins_over_search_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let literal = dir.path().join("exact.template");
        std::fs::write(&literal, "literal\n").unwrap();

        let out_dir = tempfile::tempdir().unwrap();
        let out_path = out_dir.path().join("o.txt");
        let config = GeneratorConfig {
            templates: vec![literal.display().to_string()],
            template_dirs: Vec::new(),
            output: Some(out_path.display().to_string()),
            ..Default::default()
        };
        generate(&color_context(2), &config).unwrap();
        assert_eq!(std::fs::read_to_string(&out_path).unwrap(), "literal\n");
    }
}
