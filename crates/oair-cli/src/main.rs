use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use log::debug;

use oair_core::collect::collect_openapi;
use oair_core::config::{self, CONFIG_FILE_NAME, OairConfig};
use oair_core::ir::ApiData;
use oair_core::parse::DocumentSet;
use oair_core::transform::{TransformOptions, transform_openapi};

#[derive(Parser)]
#[command(name = "oair", about = "OpenAPI 2.0/3.0/3.1 to IR transformer", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Transform OpenAPI documents and print the resulting IR
    Inspect {
        /// Paths to the OpenAPI documents (YAML or JSON)
        #[arg(short, long, required = true, num_args = 1..)]
        input: Vec<PathBuf>,

        /// Output format
        #[arg(long, default_value = "yaml")]
        format: InspectFormat,

        /// Dump the complete IR instead of a summary
        #[arg(long)]
        full: bool,
    },

    /// Print what the collector finds in OpenAPI documents
    Collect {
        /// Paths to the OpenAPI documents (YAML or JSON)
        #[arg(short, long, required = true, num_args = 1..)]
        input: Vec<PathBuf>,
    },

    /// Initialize a new oair configuration
    Init {
        /// Overwrite existing files
        #[arg(long)]
        force: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

#[derive(Clone, ValueEnum)]
enum InspectFormat {
    Yaml,
    Json,
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Inspect {
            input,
            format,
            full,
        } => cmd_inspect(&input, format, full),

        Commands::Collect { input } => cmd_collect(&input),

        Commands::Init { force } => cmd_init(force),

        Commands::Completions { shell } => {
            let mut cmd = <Cli as clap::CommandFactory>::command();
            clap_complete::generate(shell, &mut cmd, "oair", &mut std::io::stdout());
            Ok(())
        }
    }
}

/// Try to load the project config file from the current directory.
fn try_load_config() -> Result<Option<OairConfig>> {
    let config_path = PathBuf::from(CONFIG_FILE_NAME);
    config::load_config(&config_path).map_err(|e| anyhow::anyhow!(e))
}

/// Load every input into one document set so cross-file `$ref`s resolve.
fn load_documents(inputs: &[PathBuf]) -> Result<DocumentSet> {
    let mut documents = DocumentSet::new();
    for path in inputs {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let file = path.to_string_lossy();
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("yaml");

        let document = match ext {
            "json" => documents.add_json(&file, &content),
            _ => documents.add_yaml(&file, &content),
        }
        .with_context(|| format!("failed to load {}", path.display()))?;
        debug!("loaded {} as OpenAPI {}", file, document.version.as_str());
    }
    Ok(documents)
}

fn cmd_inspect(inputs: &[PathBuf], format: InspectFormat, full: bool) -> Result<()> {
    let cfg = try_load_config()?.unwrap_or_default();
    let documents = load_documents(inputs)?;

    let collected = collect_openapi(&documents);
    let api = transform_openapi(&collected, &TransformOptions::from(&cfg))?;

    let output = if full {
        serde_json::to_value(&api)?
    } else {
        build_inspect_summary(&api)
    };

    match format {
        InspectFormat::Yaml => {
            let yaml = serde_yaml_ng::to_string(&output)?;
            print!("{}", yaml);
        }
        InspectFormat::Json => {
            let json = serde_json::to_string_pretty(&output)?;
            println!("{}", json);
        }
    }

    Ok(())
}

fn build_inspect_summary(api: &ApiData) -> serde_json::Value {
    let services: Vec<serde_json::Value> = api
        .services
        .iter()
        .map(|service| {
            let endpoints: Vec<serde_json::Value> = service
                .endpoints
                .iter()
                .map(|&id| {
                    let endpoint = api.endpoint(id);
                    serde_json::json!({
                        "id": endpoint.id,
                        "name": endpoint.name,
                        "method": endpoint.method.as_str(),
                        "path": endpoint.path,
                    })
                })
                .collect();
            serde_json::json!({
                "name": service.name,
                "endpoints": endpoints,
            })
        })
        .collect();

    let schemas: Vec<serde_json::Value> = api
        .schemas
        .iter()
        .map(|schema| {
            serde_json::json!({
                "id": schema.id,
                "name": schema.name,
                "kind": schema.kind.name(),
                "nullable": schema.nullable,
            })
        })
        .collect();

    serde_json::json!({
        "services": services,
        "schemas": schemas,
    })
}

fn cmd_collect(inputs: &[PathBuf]) -> Result<()> {
    let documents = load_documents(inputs)?;
    let collected = collect_openapi(&documents);

    for document in &collected.documents {
        let header = &document.document().header;
        eprintln!(
            "{}: OpenAPI {} {} {}",
            document.document().file,
            document.document().version.as_str(),
            header.info.title,
            header.info.version
        );
    }
    eprintln!("  Documents: {}", collected.documents.len());
    eprintln!("  Schemas: {}", collected.schemas.len());
    eprintln!("  Endpoints: {}", collected.endpoints.len());

    for info in collected.endpoints.values() {
        println!("{} {}", info.method, info.path);
    }
    Ok(())
}

fn cmd_init(force: bool) -> Result<()> {
    let config_path = PathBuf::from(CONFIG_FILE_NAME);

    if config_path.exists() && !force {
        anyhow::bail!(
            "{} already exists. Use --force to overwrite.",
            config_path.display()
        );
    }

    fs::write(&config_path, config::default_config_content())
        .with_context(|| format!("failed to write {}", config_path.display()))?;
    eprintln!("Created {}", config_path.display());
    Ok(())
}
