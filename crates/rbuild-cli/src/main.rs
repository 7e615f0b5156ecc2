use anyhow::anyhow;
use clap::{Parser, Subcommand};
use rbuild::{
    commands::{
        build::{self, BuildCommand},
        config::{self, ConfigAction},
        merge::{self, MergeCommand},
    },
    logger, GlobalOpts,
};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Overrides the log file directory
const LOG_DIR_ENV: &str = "RBUILD_LOG_DIR";
/// Overrides the tracing filter derived from verbosity
const LOG_FILTER_ENV: &str = "RBUILD_LOG";

#[derive(Parser)]
#[command(name = "rbuild")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(
    about = "Build an R package tarball in CI",
    long_about = "rbuild stamps DESCRIPTION with build metadata, runs R CMD build and reports the produced tarball."
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOpts,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge metadata into DESCRIPTION, run R CMD build and report the tarball
    Build(BuildCommand),
    /// Print the merged DESCRIPTION (use --write to apply it)
    Merge(MergeCommand),
    /// Inspect rbuild settings
    #[command(subcommand_required = false, arg_required_else_help = false)]
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

fn init_logging(opts: &GlobalOpts) -> anyhow::Result<()> {
    let verbosity = opts.verbosity_level();
    let logger_ready = match std::env::var_os(LOG_DIR_ENV) {
        Some(dir) => logger::init_with_dir(verbosity, &PathBuf::from(dir)),
        None => logger::init_with_verbosity(verbosity),
    };
    logger_ready.map_err(|e| anyhow!("Failed to initialize logger: {}", e))?;

    let filter = EnvFilter::try_from_env(LOG_FILTER_ENV)
        .unwrap_or_else(|_| EnvFilter::new(logger::verbosity_to_filter()));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    let installed = if opts.log_json {
        subscriber.json().try_init()
    } else {
        subscriber.try_init()
    };
    installed.map_err(|e| anyhow!("Failed to initialize tracing: {}", e))
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_logging(&cli.global) {
        eprintln!("Warning: {}", e);
    }

    match cli.command {
        Commands::Build(cmd) => match build::handle_build(cmd, &cli.global) {
            Ok(report) => {
                logger::success(&format!("Built {}", report.path.display()));
            }
            Err(e) => {
                logger::error(&format!("Build failed: {}", e));
                logger::show_log_path();
                std::process::exit(1);
            }
        },
        Commands::Merge(cmd) => match merge::handle_merge(cmd, &cli.global) {
            Ok(text) => print!("{}", text),
            Err(e) => {
                logger::error(&format!("Merge failed: {}", e));
                std::process::exit(1);
            }
        },
        Commands::Config { action } => {
            config::handle_config(action, &cli.global);
        }
    }
}
