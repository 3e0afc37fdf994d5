//! ridl - re-targetable interface compiler CLI
//!
//! Ingests the symbol stream an external front end produced (a JSON
//! file, or a directory of `*.ridl.json` files forming one package),
//! builds the declaration model, and renders the requested templates.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context as _, Result};
use clap::{Args, Parser, Subcommand};
use tracing::error;

use ridl_codegen::{generate, load_typemap, GeneratorConfig};
use ridl_model::{derive_enums, Context, HostAbi, Package, SymbolSet};

mod input;

use input::load_unit;

#[derive(Parser)]
#[command(name = "ridl")]
#[command(about = "Re-targetable interface compiler")]
#[command(version)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render templates against one or more input units
    Generate(GenerateArgs),

    /// Print the assembled template context as JSON
    Show {
        /// Symbol-stream file or directory
        input: PathBuf,
    },

    /// Write the effective type-mapping table as JSON
    DumpTypemap {
        /// Mapping overrides merged over the built-in table
        #[arg(long)]
        typemap: Option<PathBuf>,
    },
}

#[derive(Args)]
struct GenerateArgs {
    /// Symbol-stream files or directories, processed independently
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Generate output using this template (repeatable, runs in order)
    #[arg(short = 't', long = "template")]
    templates: Vec<String>,

    /// Explicit output path ("-" for stdout); overrides embedded specs
    #[arg(short, long)]
    output: Option<String>,

    /// Template search directory (repeatable, probed in order)
    #[arg(short = 'I', long = "template-dir")]
    template_dirs: Vec<PathBuf>,

    /// Type-mapping overrides file (JSON)
    #[arg(long)]
    typemap: Option<PathBuf>,

    /// Generator configuration file (TOML); flags override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Render everything, write nothing
    #[arg(long)]
    dry_run: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Generate(args) => run_generate(args),
        Commands::Show { input } => run_show(&input),
        Commands::DumpTypemap { typemap } => run_dump_typemap(typemap),
    }
}

fn run_generate(args: GenerateArgs) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => GeneratorConfig::from_file(path)
            .with_context(|| format!("loading configuration {}", path.display()))?,
        None => GeneratorConfig::default(),
    };
    config.merge(GeneratorConfig {
        templates: args.templates,
        output: args.output,
        template_dirs: args.template_dirs,
        typemap_file: args.typemap,
        dry_run: args.dry_run,
    });
    if config.templates.is_empty() {
        bail!("no templates requested; pass -t at least once");
    }

    // Input units are independent: a failing unit stops its own
    // templates but not the rest of the batch.
    let mut failures = 0usize;
    for input in &args.inputs {
        if let Err(err) = generate_unit(input, &config) {
            error!("{}: {:#}", input.display(), err);
            failures += 1;
        }
    }
    if failures > 0 {
        bail!("{} of {} input units failed", failures, args.inputs.len());
    }
    Ok(())
}

fn generate_unit(input: &Path, config: &GeneratorConfig) -> Result<()> {
    let ctx = assemble_context(input)?;
    let report = generate(&ctx, config)?;
    for out in &report.outputs {
        eprintln!("{}: {} ({} bytes)", out.template, out.destination, out.bytes);
    }
    Ok(())
}

fn run_show(input: &Path) -> Result<()> {
    let ctx = assemble_context(input)?;
    println!("{}", serde_json::to_string_pretty(&ctx)?);
    Ok(())
}

fn run_dump_typemap(typemap: Option<PathBuf>) -> Result<()> {
    let config = GeneratorConfig {
        typemap_file: typemap,
        ..Default::default()
    };
    let map = load_typemap(&config)?;
    map.dump(std::io::stdout().lock())?;
    Ok(())
}

fn assemble_context(input: &Path) -> Result<Context> {
    let unit = load_unit(input)?;
    let SymbolSet {
        package,
        imports,
        symbols,
    } = unit.symbols;
    let abi = HostAbi::for_symbols(&symbols);
    let mut pkg = Package::from_symbols(package.as_str(), &imports, &symbols, &abi)?;
    let enums = derive_enums(&mut pkg);
    Ok(Context::new(
        unit.directory.display().to_string(),
        unit.filenames,
        &pkg,
        enums,
    ))
}
