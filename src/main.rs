//! node-crawler entry point: one crawl run, exit code 0 on success

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use node_crawler::{Config, run_once};

#[derive(Parser)]
#[command(
    name = "node-crawler",
    about = "Fetch the newest free-node article and save its subscription",
    version
)]
struct Cli {
    /// JSON config file; defaults apply to anything it leaves out.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the site root to crawl.
    #[arg(long)]
    base_url: Option<String>,

    /// Write the subscription and status record into this directory.
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Log at debug level.
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let default = if verbose {
        "info,node_crawler=debug"
    } else {
        "info,node_crawler=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

fn load_config(cli: &Cli) -> node_crawler::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    if let Some(base_url) = &cli.base_url {
        config.site.base_url = base_url.clone();
    }
    if let Some(dir) = &cli.output_dir {
        config.output = node_crawler::OutputConfig::in_dir(dir);
    }
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    info!(
        started = %chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "Starting node crawler"
    );

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    if run_once(config).await {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
