//! CLI for `openapi-prune`.
//!
//! # Subcommands
//!
//! ```text
//! # Drop the content API and the `app` path parameter, keep the rest
//! openapi-prune prune \
//!   --input swagger.json \
//!   --output pruned.json \
//!   --config api/openapi/prune.yaml
//!
//! # Inspect baseline reference counts of every definition
//! openapi-prune refs --input swagger.json
//! ```

#![forbid(unsafe_code)]

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use serde_yaml_ng::Value;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use openapi_prune::{Document, ProjectConfig, PruneConfig};

/// Prune paths, path parameters and orphaned definitions from `OpenAPI` documents.
#[derive(Parser)]
#[command(name = "openapi-prune", version, about)]
enum Cli {
    /// Remove excluded paths and stripped parameters, then every definition
    /// nothing left refers to.
    Prune(PruneArgs),

    /// Print how many live references each definition has before pruning.
    Refs(RefsArgs),
}

#[derive(Parser)]
struct PruneArgs {
    /// Path to the input `OpenAPI` document (YAML or JSON).
    #[arg(short, long)]
    input: PathBuf,

    /// Path to the output document. Defaults to overwriting `--input`.
    ///
    /// Written as JSON when the file name ends in `.json`, YAML otherwise.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Path to a project config YAML file.
    ///
    /// CLI flags override values from the config file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Comma-separated path prefixes to exclude.
    /// Overrides `exclude_path_prefixes` from the config file.
    #[arg(long, value_delimiter = ',')]
    exclude: Vec<String>,

    /// Comma-separated names of path parameters to strip.
    /// Overrides `strip_path_parameters` from the config file.
    #[arg(long, value_delimiter = ',')]
    strip: Vec<String>,

    /// Match path prefixes case-sensitively.
    #[arg(long)]
    case_sensitive: bool,
}

#[derive(Parser)]
struct RefsArgs {
    /// Path to the input `OpenAPI` document (YAML or JSON).
    #[arg(short, long)]
    input: PathBuf,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "openapi_prune=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli {
        Cli::Prune(args) => run_prune(&args),
        Cli::Refs(args) => run_refs(&args),
    }
}

fn run_prune(args: &PruneArgs) -> anyhow::Result<()> {
    // Load project config (if provided), otherwise use defaults
    let project = match &args.config {
        Some(path) => {
            eprintln!("Loading config: {}", path.display());
            ProjectConfig::load(path)
                .with_context(|| format!("Failed to load config: {}", path.display()))?
        }
        None => ProjectConfig::default(),
    };

    let config = PruneConfig::new().with_project_config(&project);
    let config = apply_cli_overrides(config, args);

    let mut doc = read_document(&args.input)?;
    let report = openapi_prune::prune_document(&mut doc, &config)
        .with_context(|| format!("Failed to prune {}", args.input.display()))?;

    eprintln!(
        "Removed {} paths, {} parameters, {} definitions",
        report.removed_paths.len(),
        report.stripped_parameters.len(),
        report.removed_definitions.len(),
    );

    let output_path = args.output.as_ref().unwrap_or(&args.input);
    let output = render(&doc, output_path)?;
    fs::write(output_path, output)
        .with_context(|| format!("Failed to write output: {}", output_path.display()))?;
    eprintln!("Wrote pruned document to {}", output_path.display());

    Ok(())
}

/// Apply CLI flags that override config file values.
fn apply_cli_overrides(mut config: PruneConfig, args: &PruneArgs) -> PruneConfig {
    // List overrides (CLI replaces config entirely if provided)
    if !args.exclude.is_empty() {
        let refs: Vec<&str> = args.exclude.iter().map(String::as_str).collect();
        config = config.exclude_path_prefixes(&refs);
    }
    if !args.strip.is_empty() {
        let refs: Vec<&str> = args.strip.iter().map(String::as_str).collect();
        config = config.strip_path_parameters(&refs);
    }

    // One-directional: can only turn case sensitivity on via CLI
    if args.case_sensitive {
        config = config.case_insensitive(false);
    }

    config
}

fn run_refs(args: &RefsArgs) -> anyhow::Result<()> {
    let doc = read_document(&args.input)?;
    let document = Document::from_value(&doc)
        .with_context(|| format!("Failed to load {}", args.input.display()))?;
    let counts = openapi_prune::baseline_counts(&document).context("Failed to count references")?;

    println!("=== Definition references ===");
    println!();

    let mut unreferenced = 0;
    for (name, count) in document.definition_counts(&counts) {
        if count == 0 {
            unreferenced += 1;
        }
        println!("  {count:>4}  {name}");
    }

    println!();
    println!(
        "{} definitions, {} not reachable from any operation",
        document.definitions.len(),
        unreferenced
    );

    Ok(())
}

/// Read a YAML or JSON document.
fn read_document(path: &Path) -> anyhow::Result<Value> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read input: {}", path.display()))?;
    serde_yaml_ng::from_str(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Serialize as JSON for `.json` targets, YAML otherwise.
fn render(doc: &Value, path: &Path) -> anyhow::Result<String> {
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        serde_json::to_string_pretty(doc).context("Failed to serialize JSON")
    } else {
        serde_yaml_ng::to_string(doc).context("Failed to serialize YAML")
    }
}
