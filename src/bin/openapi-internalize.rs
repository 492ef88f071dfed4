//! OpenAPI internalize CLI
//!
//! Reads an OpenAPI document, internalizes its remote component references
//! and writes the self-contained result.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use openapi_internalize::{
    emit, internalize, load_document_auto, location, CatalogConfig, Format, FsIndexProvider,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "openapi-internalize")]
#[command(about = "Copy remote OpenAPI components into the root document and rewrite their $refs")]
#[command(version)]
struct Cli {
    /// Input document: file path or URL (http:// or https://)
    #[arg(default_value = "spec.yaml")]
    input: String,

    /// Output file (stdout if not specified)
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Output format: yaml or json (default: same as the input)
    #[arg(long)]
    format: Option<Format>,

    /// Never fetch referenced documents over HTTP
    #[arg(long)]
    no_remote: bool,

    /// Print a JSON summary of merged and skipped references to stderr
    #[arg(long)]
    report: bool,

    /// Log progress to stderr (overridden by RUST_LOG)
    #[arg(long, short)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: &Cli) -> Result<(), u8> {
    let root = load_document_auto(&cli.input).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    let root_location = if location::is_url(&cli.input) {
        cli.input.clone()
    } else {
        location::from_path(Path::new(&cli.input))
    };

    let config = CatalogConfig::new(root_location.as_str()).remote_lookup(!cli.no_remote);
    let provider = FsIndexProvider::new(config);

    let report = internalize(&root, &root_location, &provider).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    let format = cli
        .format
        .unwrap_or_else(|| Format::from_location(&cli.input));
    let output = emit(&root, format).map_err(|e| {
        eprintln!("Error serializing output: {}", e);
        e.exit_code() as u8
    })?;

    match &cli.output {
        Some(path) => {
            std::fs::write(path, &output).map_err(|e| {
                eprintln!("Error writing to {}: {}", path.display(), e);
                3u8
            })?;
        }
        None => {
            print!("{}", output);
        }
    }

    if cli.report {
        match serde_json::to_string_pretty(&report) {
            Ok(summary) => eprintln!("{}", summary),
            Err(e) => eprintln!("Error serializing report: {}", e),
        }
    }

    Ok(())
}
