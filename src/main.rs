// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * GqlGuard - GraphQL Security Scanner
 * Standalone CLI: loads a scan target from a configuration document,
 * runs the scan and prints a severity-ordered report.
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use gqlguard::{config, engine, reporting};

/// GqlGuard - Escáner de seguridad GraphQL
#[derive(Parser)]
#[command(name = "gqlguard")]
#[command(author = "Bountyy Oy <info@bountyy.fi>")]
#[command(version)]
#[command(about = "Escáner de seguridad GraphQL: introspección, DoS y BOLA", long_about = None)]
struct Cli {
    /// Ruta al documento de configuración JSON
    #[arg(short, long)]
    config: PathBuf,

    /// Escribir el resultado completo del escaneo como JSON
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Salida detallada (nivel debug)
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();

    let target = match config::load_scan_target(&cli.config) {
        Ok(target) => target,
        Err(err) => {
            eprintln!("Error de configuración: {:#}", err);
            std::process::exit(1);
        }
    };

    info!("GqlGuard v{} - Starting scan", env!("CARGO_PKG_VERSION"));
    let result = engine::run_scan(target).await;

    reporting::print_report(&result);

    if let Some(path) = &cli.output {
        if let Err(err) = write_result(&result, path) {
            eprintln!("No se pudo escribir el resultado: {:#}", err);
            std::process::exit(1);
        }
        info!("Result written to {}", path.display());
    }

    std::process::exit(reporting::exit_code(&result));
}

fn write_result(result: &gqlguard::types::ScanResult, path: &PathBuf) -> Result<()> {
    let content = serde_json::to_string_pretty(result).context("Serialización del resultado")?;
    std::fs::write(path, content)
        .with_context(|| format!("Escritura del archivo {}", path.display()))?;
    Ok(())
}
