mod cli;
mod consts;
mod error;
mod exec;
mod interrupt;
mod locust;
mod run;
mod sitemap;

pub mod prelude {
    pub use crate::error::*;
    pub use tracing::{debug, error, info, warn};
}

use anyhow::Context;
use clap::Parser;
use console::style;
use dotenvy::dotenv;
use swbench_config::{Configuration, GlobalConfiguration};
use tracing_subscriber::EnvFilter;

use crate::exec::local::LocalExecutor;
use crate::prelude::*;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let args = cli::Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();
    debug!(
        "{} v{}",
        env!("CARGO_PKG_DESCRIPTION"),
        env!("CARGO_PKG_VERSION")
    );

    match args.command {
        cli::Commands::Run {
            config,
            duration,
            working_dir,
            skip_sitemap,
        } => {
            let config_path = config;
            let config = Configuration::from_file(&config_path).with_context(|| {
                format!("Failed to load configuration {}", config_path.display())
            })?;
            let global = GlobalConfiguration::from_global_directory()
                .context("Failed to load global configuration")?;
            let working_dir = match working_dir {
                Some(dir) => dir,
                None => std::env::current_dir()?,
            };

            let executor = LocalExecutor::new();
            let report = run::run_benchmark(
                &executor,
                run::RunRequest {
                    config: &config,
                    mode: global.execution_mode,
                    working_dir: &working_dir,
                    duration: duration.as_deref(),
                    refresh_fixtures: !skip_sitemap,
                },
            )
            .await?;

            println!(
                "{} {} finished after {:.0}s ({}), {} result files in {}",
                style("✔").green(),
                config.name(),
                report.outcome.elapsed.as_secs_f64(),
                report.duration,
                report.collected.len(),
                config.data_directory().display()
            );
        }
    }

    Ok(())
}
