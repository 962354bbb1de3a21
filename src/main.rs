use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use mimalloc::MiMalloc;
use npm_audit_depscan::config::{AppConfig, LogFormat};
use npm_audit_depscan::{convert_with, ConversionOptions};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

// M-MIMALLOC-APP: Use mimalloc as global allocator for improved performance.
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// Convert `npm audit --json` output into a GitLab dependency scanning report.
#[derive(Debug, Parser)]
#[command(name = "npm-audit-depscan", version)]
struct Cli {
    /// Output filename, defaults to gl-dependency-scanning-report.json
    #[arg(short, long, value_name = "PATH")]
    out: Option<PathBuf>,

    /// Read the audit report from a file instead of standard input
    #[arg(short, long, value_name = "PATH")]
    input: Option<PathBuf>,

    /// Manifest path recorded in the report, defaults to the audited lockfile
    #[arg(long, value_name = "PATH")]
    manifest: Option<String>,
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_new(&config.log_filter)
        .unwrap_or_else(|_| "npm_audit_depscan=info".into());
    let registry = tracing_subscriber::registry().with(filter);

    // Logs go to stderr; stdout is reserved for user-facing messages.
    match config.log_format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(io::stderr))
            .init(),
        LogFormat::Text => registry
            .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
            .init(),
    }
}

fn read_input(path: Option<&PathBuf>) -> anyhow::Result<String> {
    match path {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display())),
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read standard input")?;
            Ok(buffer)
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    dotenvy::dotenv().ok();
    let config = AppConfig::from_env().context("Invalid configuration")?;
    init_tracing(&config);

    let output = cli
        .out
        .unwrap_or_else(|| PathBuf::from(&config.output_path));
    let options = ConversionOptions {
        manifest_path: cli.manifest.or(config.manifest_path),
    };

    let input = read_input(cli.input.as_ref())?;
    tracing::debug!(bytes = input.len(), "Read audit report");

    let report = convert_with(&input, &options)?;
    fs::write(&output, format!("{report}\n"))
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!("The file was saved as {}!", output.display());
    Ok(())
}
