//! Nucleus - Main entry point
//!
//! Loads the color table and part list, then opens the 3D viewer.

mod app;
mod config;
mod parts;
mod scene;
mod stl;
mod ui;

use anyhow::Result;
use clap::Parser;
use nucleus_core::ColorTable;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "nucleus")]
#[command(about = "Interactive viewer for multi-part meshes")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "nucleus.toml")]
    config: PathBuf,

    /// Assets directory (overrides [assets] root)
    #[arg(short, long)]
    assets: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Print the parts that would be loaded with their colors and exit
    #[arg(long)]
    list_parts: bool,

    /// Write the default configuration to --config and exit
    #[arg(long)]
    write_default_config: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Nucleus v{}", env!("CARGO_PKG_VERSION"));

    if args.write_default_config {
        config::save_default_config(&args.config)?;
        println!("Wrote default configuration to {}", args.config.display());
        return Ok(());
    }

    let mut config = config::load_config(&args.config)?;
    if let Some(assets) = args.assets {
        config.assets.root = assets;
    }

    info!(
        assets = %config.assets.root.display(),
        color_table = %config.color_table.path.display(),
        "Configuration loaded"
    );

    let colors = ColorTable::load_or_empty(&config.color_table_path());
    let manifest = config.manifest()?;

    if args.list_parts {
        println!("{} parts:", manifest.len());
        for source in manifest.sources() {
            match colors.lookup(&source.name) {
                Some(color) => println!(
                    "  - {} ({}) rgb({:.3}, {:.3}, {:.3})",
                    source.name,
                    source.path.display(),
                    color.r,
                    color.g,
                    color.b
                ),
                None => println!(
                    "  - {} ({}) no color entry, white",
                    source.name,
                    source.path.display()
                ),
            }
        }
        return Ok(());
    }

    app::run(config, colors, manifest)
}
