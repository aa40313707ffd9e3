//! boardfile CLI: board descriptions, pin constraints and programming.

mod commands;
mod manifest;

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use manifest::BoardfileManifest;

#[derive(Parser)]
#[command(name = "boardfile", version, about = "FPGA board descriptions and programming")]
struct Cli {
    /// Verbosity level (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Platform: built-in name, name under platforms/, or .platform.toml path
    #[arg(short, long, global = true)]
    platform: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List built-in and project platforms
    List,
    /// Show signals, connectors, clock and programmer of a platform
    Describe {
        /// Output format (text, toml)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Check a platform definition for problems
    Validate,
    /// Emit pin and clock constraints
    Constraints {
        /// Output format (lpf, text, json)
        #[arg(long, default_value = "lpf")]
        format: String,
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Load a bitstream onto the board
    Program {
        /// Bitstream file
        bitstream: PathBuf,
        /// Print the descriptor without running the programmer
        #[arg(long)]
        dry_run: bool,
        /// Seconds before the programmer is killed
        #[arg(long)]
        timeout: Option<u64>,
    },
    /// Print a starter .platform.toml
    Template {
        /// Platform name
        name: String,
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = run(cli);
    if let Err(e) = result {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let cwd = std::env::current_dir()?;
    let (manifest, project_dir) = load_manifest_optional(&cwd)?;
    let project_dir = project_dir.unwrap_or(cwd);
    let platform = cli.platform.as_deref();

    match cli.command {
        Commands::List => commands::list::run(&project_dir),

        Commands::Describe { format } => {
            let platform = manifest::select_platform(platform, manifest.as_ref(), &project_dir)?;
            commands::describe::run(&platform, &format)
        }

        Commands::Validate => {
            let platform = manifest::select_platform(platform, manifest.as_ref(), &project_dir)?;
            commands::validate::run(&platform)
        }

        Commands::Constraints { format, output } => {
            let platform = manifest::select_platform(platform, manifest.as_ref(), &project_dir)?;
            commands::constraints::run(&platform, &format, output.as_deref())
        }

        Commands::Program {
            bitstream,
            dry_run,
            timeout,
        } => {
            let platform = manifest::select_platform(platform, manifest.as_ref(), &project_dir)?;
            let timeout = timeout.or(manifest.as_ref().and_then(|m| m.program.timeout_secs));
            commands::program::run(&platform, &bitstream, dry_run, timeout)
        }

        Commands::Template { name, output } => commands::template::run(&name, output.as_deref()),
    }
}

/// Try to load a manifest from the current directory upward. Returns (None, None) if not found.
fn load_manifest_optional(
    cwd: &Path,
) -> anyhow::Result<(Option<BoardfileManifest>, Option<PathBuf>)> {
    match BoardfileManifest::find_and_load(cwd)? {
        Some((manifest, dir)) => Ok((Some(manifest), Some(dir))),
        None => Ok((None, None)),
    }
}
