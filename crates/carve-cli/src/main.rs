//! Carve CLI - deterministic PRD to microservice decomposition
//!
//! Usage:
//!   carve decompose <FILE|->     Decompose a PRD and validate the result
//!   carve validate <map> <model> Validate an existing service map and domain model
//!   carve init [PATH]            Write .carve/config.toml with defaults
//!   carve sample                 Print a sample PRD

use anyhow::{bail, Context, Result};
use carve_core::{CarveConfig, DomainModel, ServiceMap};
use carve_planning::{decompose_with, example_prd, minimal_prd, terse_prd, Decomposition};
use carve_validation::{IssueReport, Validator, ValidatorConfig};
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tokio::io::AsyncReadExt;
use tracing::{debug, info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "carve")]
#[command(author, version, about = "Deterministic PRD to microservice decomposition")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file (defaults to .carve/config.toml when present)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decompose a PRD into services and a domain model, then validate it
    Decompose {
        /// PRD file, or "-" to read standard input
        input: String,

        /// Print the full result as JSON instead of a summary
        #[arg(long)]
        json: bool,

        /// Write service_map.json, domain_model.json and validation.json here
        #[arg(short, long, value_name = "DIR")]
        output_dir: Option<PathBuf>,

        /// Exit with an error when the validation report is not valid
        #[arg(long)]
        strict: bool,
    },

    /// Validate a service map and domain model produced earlier
    Validate {
        /// Service map JSON file
        service_map: PathBuf,

        /// Domain model JSON file
        domain_model: PathBuf,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write the default configuration
    Init {
        /// Project path (defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// Print a sample PRD
    Sample {
        #[arg(short, long, value_enum, default_value = "example")]
        kind: SampleKind,

        /// Project name for the minimal sample
        #[arg(short, long, default_value = "My Project")]
        name: String,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SampleKind {
    /// Multi-context commerce system
    Example,
    /// A single entity described in prose
    Minimal,
    /// Inline lists and lowercase sentences
    Terse,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so JSON on stdout stays parseable
    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Decompose {
            input,
            json,
            output_dir,
            strict,
        } => {
            let config = load_config(cli.config.as_deref())?;
            cmd_decompose(&config, &input, json, output_dir, strict).await
        }
        Commands::Validate {
            service_map,
            domain_model,
            json,
        } => {
            let config = load_config(cli.config.as_deref())?;
            cmd_validate(&config, &service_map, &domain_model, json).await
        }
        Commands::Init { path } => cmd_init(path).await,
        Commands::Sample { kind, name } => cmd_sample(kind, &name),
    }
}

fn load_config(explicit: Option<&Path>) -> Result<CarveConfig> {
    let config = match explicit {
        Some(path) => CarveConfig::load(path)
            .with_context(|| format!("Failed to load config from {:?}", path))?,
        None => {
            let cwd = std::env::current_dir().context("Failed to resolve current directory")?;
            CarveConfig::load_or_default(&cwd).context("Failed to load .carve/config.toml")?
        }
    };
    debug!("Using config: {:?}", config);
    Ok(config)
}

async fn read_input(input: &str) -> Result<String> {
    if input == "-" {
        let mut text = String::new();
        tokio::io::stdin()
            .read_to_string(&mut text)
            .await
            .context("Failed to read PRD from stdin")?;
        Ok(text)
    } else {
        tokio::fs::read_to_string(input)
            .await
            .with_context(|| format!("Failed to read PRD file {}", input))
    }
}

async fn cmd_decompose(
    config: &CarveConfig,
    input: &str,
    json: bool,
    output_dir: Option<PathBuf>,
    strict: bool,
) -> Result<()> {
    let text = read_input(input).await?;
    info!("Decomposing {} ({} bytes)", input, text.len());

    let decomposition: Decomposition = decompose_with(&text, &config.service_map, Utc::now())?;
    let validator = Validator::new(ValidatorConfig::from(&config.validation));
    let report = validator.validate(
        &decomposition.service_map,
        &decomposition.domain_model,
        Some(decomposition.interview_questions()),
    );

    if let Some(dir) = output_dir {
        write_outputs(&dir, &decomposition, &report).await?;
    }

    if json {
        let bundle = serde_json::json!({
            "document": decomposition.document,
            "boundaries": decomposition.boundaries,
            "service_map": decomposition.service_map,
            "domain_model": decomposition.domain_model,
            "validation": report,
        });
        println!("{}", serde_json::to_string_pretty(&bundle)?);
    } else {
        println!("{}", decomposition.summary());
        if !decomposition.interview_questions().is_empty() {
            println!("Open questions:");
            for question in decomposition.interview_questions() {
                println!("  - {}", question);
            }
            println!();
        }
        print!("{}", report);
    }

    if strict && !report.is_valid() {
        bail!(
            "Decomposition has {} blocking issue(s)",
            report.blocking().len()
        );
    }
    Ok(())
}

async fn write_outputs(dir: &Path, decomposition: &Decomposition, report: &IssueReport) -> Result<()> {
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("Failed to create {:?}", dir))?;

    let files = [
        ("service_map.json", serde_json::to_string_pretty(&decomposition.service_map)?),
        ("domain_model.json", serde_json::to_string_pretty(&decomposition.domain_model)?),
        ("validation.json", serde_json::to_string_pretty(report)?),
    ];
    for (name, content) in files {
        let path = dir.join(name);
        tokio::fs::write(&path, content)
            .await
            .with_context(|| format!("Failed to write {:?}", path))?;
        info!("Wrote {:?}", path);
    }
    Ok(())
}

async fn cmd_validate(
    config: &CarveConfig,
    service_map: &Path,
    domain_model: &Path,
    json: bool,
) -> Result<()> {
    let content = tokio::fs::read_to_string(service_map)
        .await
        .with_context(|| format!("Failed to read {:?}", service_map))?;
    let map: ServiceMap =
        serde_json::from_str(&content).context("Failed to parse service map JSON")?;

    let content = tokio::fs::read_to_string(domain_model)
        .await
        .with_context(|| format!("Failed to read {:?}", domain_model))?;
    let model: DomainModel =
        serde_json::from_str(&content).context("Failed to parse domain model JSON")?;

    let report = Validator::new(ValidatorConfig::from(&config.validation)).validate(&map, &model, None);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Project: {}", map.project_name);
        print!("{}", report);
    }

    if !report.is_valid() {
        bail!("Validation failed with {} blocking issue(s)", report.blocking().len());
    }
    Ok(())
}

async fn cmd_init(path: PathBuf) -> Result<()> {
    info!("Initializing Carve in {:?}", path);

    tokio::fs::create_dir_all(&path)
        .await
        .with_context(|| format!("Failed to create {:?}", path))?;
    CarveConfig::write_default(&path).context("Failed to write default config")?;

    println!("Initialized Carve in {:?}", path);
    println!("Created:");
    println!("  .carve/config.toml");
    println!("\nNext steps:");
    println!("  1. Run 'carve sample > prd.md' for a starting point");
    println!("  2. Run 'carve decompose prd.md' to see the proposed services");
    Ok(())
}

fn cmd_sample(kind: SampleKind, name: &str) -> Result<()> {
    let text = match kind {
        SampleKind::Example => example_prd(),
        SampleKind::Minimal => minimal_prd(name),
        SampleKind::Terse => terse_prd(),
    };
    print!("{}", text);
    Ok(())
}
