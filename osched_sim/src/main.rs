//! OS Scheduling Workbench CLI
//!
//! Run scheduling simulations against the computation service.

use clap::Parser;
use osched_env::HttpService;
use osched_sim::{Cli, SessionError, SessionRunner};
use std::sync::Arc;
use tracing::{debug, error, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging (stderr, so --json output stays clean)
    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }

    match run(&cli).await {
        Ok(output) => println!("{}", output),
        Err(e) => {
            error!("{}", e);
            // Exit with proper code for scripts
            std::process::exit(1);
        }
    }
}

async fn run(cli: &Cli) -> Result<String, SessionError> {
    let config = cli.service_config();
    debug!("Service endpoint: {}", config.base_url);

    let service = Arc::new(HttpService::new(config)?);
    let runner = SessionRunner::new(service);
    runner.dispatch(&cli.command, cli.json).await
}
