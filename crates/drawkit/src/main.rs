//! Drawkit CLI - fit photos to a drawing canvas as bounded, upright backgrounds.
//!
//! Every image is probed, planned against the canvas bounding box, decoded
//! under a memory ceiling, composited, rotated per its EXIF orientation, and
//! re-encoded.
//!
//! # Usage
//!
//! ```bash
//! # Compress a single photo into the configured output directory
//! drawkit compress photo.jpg
//!
//! # Compress a directory as JPEG with a JSON Lines report
//! drawkit compress ./photos/ -f jpeg -q 70 --report report.jsonl --report-format jsonl
//!
//! # Show the plan for one image without decoding it
//! drawkit probe photo.jpg
//!
//! # View configuration
//! drawkit config show
//! ```

use clap::{Parser, Subcommand};

mod cli;
mod logging;

/// Drawkit - bounded-memory background images for drawing canvases.
#[derive(Parser, Debug)]
#[command(name = "drawkit")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Compress images into canvas-sized backgrounds
    Compress(cli::compress::CompressArgs),

    /// Report dimensions, plan, and orientation for an image without decoding it
    Probe(cli::probe::ProbeArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging isn't up yet, so config problems go straight to stderr
    let config = match drawkit_core::Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `drawkit config path`."
            );
            drawkit_core::Config::default()
        }
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("Drawkit v{}", drawkit_core::VERSION);

    match cli.command {
        Commands::Compress(args) => cli::compress::execute(args, config).await,
        Commands::Probe(args) => cli::probe::execute(args, &config),
        Commands::Config(args) => cli::config::execute(args),
    }
}
