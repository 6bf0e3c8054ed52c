//! httpprobe - declarative HTTP endpoint testing
//!
//! Runs YAML/JSON test definitions against HTTP APIs and reports which
//! assertions held.

use clap::Parser;
use commands::Commands;
use httpprobe::common::logging;
use httpprobe::{cli, commands};

#[derive(Parser)]
#[command(name = "httpprobe", about = "Declarative HTTP endpoint testing")]
#[command(version, long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init_cli(cli.verbose);

    match cli::dispatch(cli.command).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}
