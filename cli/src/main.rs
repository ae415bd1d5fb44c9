use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use partial_schema_aggregator::{Aggregator, DEFAULT_TOOL_NAME};
use partial_schema_core::{Document, FileSource, Identity, SectionKind};
use partial_schema_registry::{AggregatorConfig, Manifest, ProviderRegistry};
use serde::Serialize;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

const PACKAGE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Output format for `inspect`.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum CliOutputFormat {
    Json,
    Yaml,
}

#[derive(Debug, Parser)]
#[command(name = "schema-aggregate")]
#[command(about = "Aggregate schema partials into a single schema")]
#[command(version)]
struct Cli {
    /// Log debug output to stderr (overridden by RUST_LOG).
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Aggregate selected partials and everything they require.
    Aggregate(AggregateArgs),
    /// Parse a single partial file and describe it.
    Inspect(InspectArgs),
    /// List the partials found in module directories.
    List(ListArgs),
    /// Compare two aggregation manifests.
    Diff(DiffArgs),
}

#[derive(Debug, Args)]
struct AggregateArgs {
    /// YAML configuration file. Relative paths in it are resolved against
    /// the file's directory.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Module directory holding partial files (repeatable, replaces the
    /// configured modules).
    #[arg(long = "module", value_name = "DIR")]
    modules: Vec<PathBuf>,
    /// Output file (default: standard output).
    #[arg(long)]
    output: Option<PathBuf>,
    /// Write a manifest of the aggregated partials to this file.
    #[arg(long)]
    manifest: Option<PathBuf>,
    /// Tool name used in the output's attribution comments.
    #[arg(long)]
    tool_name: Option<String>,
    /// Partial names, `name-X.Y.Z` identities, or `/regexp/` patterns
    /// (replace the configured selectors).
    selectors: Vec<String>,
}

#[derive(Debug, Args)]
struct InspectArgs {
    /// Partial file to parse.
    input: PathBuf,
    /// Output format.
    #[arg(long, default_value = "json")]
    format: CliOutputFormat,
}

#[derive(Debug, Args)]
struct ListArgs {
    /// Module directory holding partial files (repeatable).
    #[arg(long = "module", value_name = "DIR", required = true)]
    modules: Vec<PathBuf>,
}

#[derive(Debug, Args)]
struct DiffArgs {
    /// Manifest from the earlier run.
    old: PathBuf,
    /// Manifest from the later run.
    new: PathBuf,
}

#[derive(Debug, Serialize)]
struct InspectReport {
    identity: String,
    digest: String,
    source: String,
    requires: Vec<String>,
    sections: Vec<SectionReport>,
}

#[derive(Debug, Serialize)]
struct SectionReport {
    kind: SectionKind,
    description: String,
    length: u64,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Command::Aggregate(args) => run_aggregate(args),
        Command::Inspect(args) => run_inspect(args),
        Command::List(args) => run_list(args),
        Command::Diff(args) => run_diff(args),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run_aggregate(args: AggregateArgs) -> Result<(), String> {
    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => AggregatorConfig::default(),
    };

    let modules = if args.modules.is_empty() {
        config.modules
    } else {
        args.modules
    };
    if modules.is_empty() {
        return Err("no module directories given (use --module or a config file)".to_string());
    }
    let selectors = if args.selectors.is_empty() {
        config.selectors
    } else {
        args.selectors
    };
    let output = args.output.or(config.output);
    let manifest_path = args.manifest.or(config.manifest);
    let tool_name = args
        .tool_name
        .or(config.tool_name)
        .unwrap_or_else(|| DEFAULT_TOOL_NAME.to_string());

    let registry = load_modules(&modules)?;
    let snapshot = registry.snapshot();
    let aggregator = Aggregator::with_tool_name(tool_name);

    info!(
        modules = modules.len(),
        partials = snapshot.len(),
        selectors = ?selectors,
        "Aggregating"
    );
    let selection = aggregator
        .select(&snapshot, &selectors)
        .map_err(|err| err.to_string())?;
    let schema = aggregator
        .render(&selection)
        .map_err(|err| err.to_string())?;

    if let Some(path) = &manifest_path {
        let manifest = Manifest::from_documents(
            PACKAGE_VERSION.to_string(),
            selectors.clone(),
            selection.documents().iter().map(|doc| doc.as_ref()),
        );
        create_parent_dir(path)?;
        manifest
            .save(path)
            .map_err(|err| format!("Failed to write manifest '{}': {err}", path.display()))?;
        debug!(path = %path.display(), partials = manifest.partials.len(), "Wrote manifest");
    }

    match &output {
        Some(path) => {
            create_parent_dir(path)?;
            fs::write(path, &schema)
                .map_err(|err| format!("Failed to write '{}': {err}", path.display()))?;
            println!(
                "Aggregated {} partial(s) into '{}'.",
                selection.len(),
                path.display()
            );
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout
                .write_all(schema.as_bytes())
                .map_err(|err| format!("Failed to write to stdout: {err}"))?;
            stdout
                .flush()
                .map_err(|err| format!("Failed to write to stdout: {err}"))?;
        }
    }

    Ok(())
}

fn run_inspect(args: InspectArgs) -> Result<(), String> {
    let identity = Identity::from_path(&args.input);
    if identity.is_empty() {
        return Err(format!(
            "'{}' is not a partial file name (expected name[-X.Y.Z].txt)",
            args.input.display()
        ));
    }

    let doc = Document::parse(identity, Arc::new(FileSource::new(&args.input)))
        .map_err(|err| format!("Failed to parse '{}': {err}", args.input.display()))?;

    let report = InspectReport {
        identity: doc.identity().to_string(),
        digest: doc.digest().to_string(),
        source: doc.source(),
        requires: doc.requires().iter().map(ToString::to_string).collect(),
        sections: doc
            .sections()
            .map(|section| SectionReport {
                kind: section.kind(),
                description: section.description().to_string(),
                length: section.len(),
            })
            .collect(),
    };

    let rendered = match args.format {
        CliOutputFormat::Json => serde_json::to_string_pretty(&report)
            .map_err(|err| format!("Failed to serialize report: {err}"))?,
        CliOutputFormat::Yaml => serde_yaml::to_string(&report)
            .map_err(|err| format!("Failed to serialize report: {err}"))?,
    };
    println!("{}", rendered.trim_end());
    Ok(())
}

fn run_list(args: ListArgs) -> Result<(), String> {
    let registry = load_modules(&args.modules)?;
    let snapshot = registry.snapshot();
    for (identity, doc) in snapshot.iter() {
        println!("{identity}\t{}", doc.source());
    }
    eprintln!("{} partial(s) in {} module(s).", snapshot.len(), args.modules.len());
    Ok(())
}

fn run_diff(args: DiffArgs) -> Result<(), String> {
    let old = Manifest::load(&args.old)
        .map_err(|err| format!("Failed to load manifest '{}': {err}", args.old.display()))?;
    let new = Manifest::load(&args.new)
        .map_err(|err| format!("Failed to load manifest '{}': {err}", args.new.display()))?;

    let changed = old.diff(&new);
    if changed.is_empty() {
        println!("No changes.");
        return Ok(());
    }
    for identity in &changed {
        let status = match (old.contains(identity), new.contains(identity)) {
            (true, false) => "removed",
            (false, true) => "added",
            _ => "changed",
        };
        println!("{status}\t{identity}");
    }
    Ok(())
}

fn load_config(path: &Path) -> Result<AggregatorConfig, String> {
    let mut config = AggregatorConfig::load(path)
        .map_err(|err| format!("Failed to load config '{}': {err}", path.display()))?;

    let base = path.parent().unwrap_or_else(|| Path::new(""));
    config.modules = config.modules.iter().map(|dir| base.join(dir)).collect();
    config.output = config.output.map(|output| base.join(output));
    config.manifest = config.manifest.map(|manifest| base.join(manifest));
    Ok(config)
}

fn load_modules(modules: &[PathBuf]) -> Result<ProviderRegistry, String> {
    let registry = ProviderRegistry::new();
    for dir in modules {
        registry
            .add_module_dir(dir)
            .map_err(|err| format!("Failed to load module '{}': {err}", dir.display()))?;
    }
    Ok(registry)
}

fn create_parent_dir(path: &Path) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|err| {
                format!(
                    "Failed to create output directory '{}': {err}",
                    parent.display()
                )
            })?;
        }
    }
    Ok(())
}
