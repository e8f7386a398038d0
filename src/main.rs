use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use landmark_timelapse::{AppConfig, logging, pipeline};

/// Align a 3D+t stack to two landmarks and export one image per time point.
#[derive(Parser)]
#[command(name = "landmark-timelapse", version, about)]
struct Cli {
    /// JSON configuration file; built-in defaults when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Input TIFF stack, overriding the configuration
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Output directory, overriding the configuration
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Camera zoom, overriding the configuration
    #[arg(long)]
    zoom: Option<f64>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Print the effective configuration as JSON and exit
    #[arg(long)]
    print_config: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    if let Some(input) = cli.input {
        config.input = input;
    }
    if let Some(output) = cli.output {
        config.export.output_dir = output;
    }
    if let Some(zoom) = cli.zoom {
        config.camera.zoom = zoom;
    }
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }

    if cli.print_config {
        println!("{}", config.to_json()?);
        return Ok(());
    }

    logging::init_logging(&config.logging);

    let summary = pipeline::run(&config)
        .with_context(|| format!("exporting {}", config.input.display()))?;
    tracing::info!(
        "Exported {} frames to {}",
        summary.files.len(),
        config.export.output_dir.display()
    );
    Ok(())
}
