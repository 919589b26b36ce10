use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(version, about = "Build tutorial sites from Markdown")]
struct Args {
    /// The command to execute (defaults to `build`)
    #[command(subcommand)]
    command: Option<LongformCommand>,

    /// Log debug output
    #[arg(short, long, global = true, default_value = "false")]
    verbose: bool,
}

#[derive(Parser)]
struct InitArgs {
    /// The path to initialize the project in
    path: PathBuf,

    /// Whether to create the directory if it doesn't exist
    #[arg(short, long, default_value = "false")]
    create: bool,
}

#[derive(Parser, Default)]
struct BuildArgs {
    /// The path to the configuration file (default: longform.yaml)
    #[arg(short, long = "config")]
    config_file: Option<PathBuf>,

    /// Write the site here instead of the configured output directory
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Abort on the first document that fails
    #[arg(long, default_value = "false")]
    strict: bool,
}

#[derive(Parser)]
struct CleanArgs {
    /// The path to the configuration file (default: longform.yaml)
    #[arg(short, long = "config")]
    config_file: Option<PathBuf>,

    /// Print what would be deleted without deleting it
    #[arg(short, long, default_value = "false")]
    dry_run: bool,
}

#[derive(Subcommand)]
enum LongformCommand {
    /// Initialize a new tutorial site
    Init(InitArgs),

    /// Build the site
    Build(BuildArgs),

    /// Delete the generated site
    Clean(CleanArgs),
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "longform=debug" } else { "longform=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let args = Args::parse();
    init_tracing(args.verbose);

    match args.command {
        Some(LongformCommand::Init(args)) => {
            commands::init::run(&args).await?;
        }
        Some(LongformCommand::Build(args)) => {
            commands::build::run(&args).await?;
        }
        Some(LongformCommand::Clean(args)) => {
            commands::clean::run(&args).await?;
        }
        None => {
            commands::build::run(&BuildArgs::default()).await?;
        }
    }

    Ok(())
}
