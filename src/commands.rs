//! CLI command definitions
//!
//! Defines the clap commands for the httpprobe CLI.

use clap::Subcommand;
use std::path::PathBuf;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the test definitions found under a path
    Run {
        /// Definition file, or directory searched recursively
        #[arg(short = 'p', long = "searchpath", default_value = "tests")]
        search_path: PathBuf,

        /// Accepted file suffixes, comma separated (default: .yaml,.json)
        #[arg(short, long, value_delimiter = ',')]
        include: Vec<String>,

        /// Number of definitions run at once
        #[arg(short, long)]
        concurrency: Option<usize>,

        /// Result format: text, table or json
        #[arg(short, long)]
        output: Option<String>,

        /// KEY=VALUE file layered over the process environment
        #[arg(short, long)]
        env_file: Option<PathBuf>,

        /// Configuration file (default: platform config dir)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Print version information
    Version,
}
