//! CLI command handling
//!
//! Layers command-line flags over the configuration file, wires the runner
//! together and renders the results.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::commands::Commands;
use crate::common::config::Config;
use crate::common::Result;
use crate::definition::FormatParser;
use crate::http::{ClientOptions, ReqwestClient};
use crate::interpolate::Environment;
use crate::results::{self, Summary};
use crate::runner::{Runner, RunnerOptions};

/// Dispatch a CLI command. Returns false when any test case failed.
pub async fn dispatch(command: Commands) -> Result<bool> {
    match command {
        Commands::Version => {
            println!("httpprobe {}", env!("CARGO_PKG_VERSION"));
            Ok(true)
        }

        Commands::Run {
            search_path,
            include,
            concurrency,
            output,
            env_file,
            config,
        } => {
            let config = match &config {
                Some(path) => Config::load_from(path)?,
                None => Config::load()?,
            };
            let settings = RunSettings::resolve(
                &config,
                RunFlags {
                    search_path,
                    include,
                    concurrency,
                    output,
                    env_file,
                },
            );
            run(&config, &settings).await
        }
    }
}

/// Flags given to `httpprobe run`
#[derive(Debug, Default)]
pub struct RunFlags {
    pub search_path: PathBuf,
    pub include: Vec<String>,
    pub concurrency: Option<usize>,
    pub output: Option<String>,
    pub env_file: Option<PathBuf>,
}

/// Effective run settings after flags are layered over the config file
#[derive(Debug, PartialEq)]
pub struct RunSettings {
    pub search_path: PathBuf,
    pub include: Vec<String>,
    pub concurrency: usize,
    pub output: String,
    pub env_file: Option<PathBuf>,
    pub json_output_path: PathBuf,
}

impl RunSettings {
    pub fn resolve(config: &Config, flags: RunFlags) -> Self {
        let include: Vec<String> = flags
            .include
            .iter()
            .map(|suffix| suffix.trim().to_string())
            .filter(|suffix| !suffix.is_empty())
            .collect();

        Self {
            search_path: flags.search_path,
            include: if include.is_empty() {
                config.run.include.clone()
            } else {
                include
            },
            concurrency: flags.concurrency.unwrap_or(config.run.concurrency),
            output: flags.output.unwrap_or_else(|| config.run.output.clone()),
            env_file: flags.env_file.or_else(|| config.run.env_file.clone()),
            json_output_path: config.run.json_output_path.clone(),
        }
    }
}

fn environment(env_file: Option<&Path>) -> Result<Environment> {
    let env = Environment::from_process();
    match env_file {
        Some(path) => env.with_file(path),
        None => Ok(env),
    }
}

async fn run(config: &Config, settings: &RunSettings) -> Result<bool> {
    let env = environment(settings.env_file.as_deref())?;
    let client = ReqwestClient::new(ClientOptions {
        base_url: config.http.base_url.clone(),
        timeout: config.http.timeout(),
        headers: config
            .http
            .headers
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect(),
    })?;

    let runner = Runner::new(RunnerOptions {
        parser: Arc::new(FormatParser),
        client: Arc::new(client),
        env: Arc::new(env),
        concurrency: settings.concurrency,
    });

    let definitions = runner.load_definitions(&settings.search_path, &settings.include)?;
    let results = runner.execute(definitions).await;

    let json_output_path = Some(settings.json_output_path.clone())
        .filter(|path| !path.as_os_str().is_empty());
    let writer = results::for_format(&settings.output, json_output_path);
    writer.write(&results, &mut std::io::stdout().lock())?;

    Ok(Summary::of(&results).all_passed())
}
