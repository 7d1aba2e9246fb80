use std::path::{Path, PathBuf};
use std::time::Duration;

use console::style;
use humanize_bytes::humanize_bytes_binary;
use indicatif::{ProgressBar, ProgressStyle};
use swbench_config::{Configuration, ExecutionMode, validate_duration};

use crate::consts;
use crate::exec::{Executor, OutputStream, ProcessOutcome};
use crate::interrupt::{InterruptListener, ProcessHandle};
use crate::locust::LocustCommand;
use crate::prelude::*;
use crate::sitemap::SitemapFixtures;

pub struct RunRequest<'a> {
    pub config: &'a Configuration,
    pub mode: ExecutionMode,
    /// Directory holding `locustfile.py`; Locust writes its CSVs here.
    pub working_dir: &'a Path,
    pub duration: Option<&'a str>,
    pub refresh_fixtures: bool,
}

#[derive(Debug)]
pub struct RunReport {
    pub duration: String,
    pub outcome: ProcessOutcome,
    pub collected: Vec<PathBuf>,
}

pub async fn run_benchmark<E: Executor>(executor: &E, request: RunRequest<'_>) -> Result<RunReport> {
    let config = request.config;
    if let Some(d) = request.duration.filter(|d| !d.trim().is_empty()) {
        validate_duration(d)?;
    }
    tokio::fs::create_dir_all(config.data_directory()).await?;

    prepare_fixtures(config, request.refresh_fixtures).await?;

    let command = LocustCommand::new(config, request.mode, request.working_dir)
        .with_duration(request.duration);
    let spec = command.to_spec();
    let duration = command.duration().to_string();

    info!(
        "Running benchmark '{}' against {} for {} ({} mode)...",
        config.name(),
        config.scenario().host,
        duration,
        request.mode
    );

    let handle = ProcessHandle::new();
    handle.arm();
    let listener = InterruptListener::spawn(handle.clone());
    let result = executor
        .execute(&spec, &handle, |stream, line| match stream {
            OutputStream::Stdout => println!("{}", line),
            OutputStream::Stderr => eprintln!("{}", line),
        })
        .await;
    drop(listener);
    handle.detach();
    let outcome = result?;

    if outcome.interrupted {
        warn!("Locust was interrupted, collecting partial results");
    } else if !outcome.success {
        warn!(
            "Locust exited with status {}",
            outcome
                .code
                .map(|c| c.to_string())
                .unwrap_or_else(|| "unknown".to_string())
        );
    }
    info!("Complete after {:.0} seconds.", outcome.elapsed.as_secs_f64());

    let collected =
        collect_results(config.name(), request.working_dir, config.data_directory()).await;

    Ok(RunReport {
        duration,
        outcome,
        collected,
    })
}

async fn prepare_fixtures(config: &Configuration, refresh: bool) -> Result<()> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.blue} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message("Update listings and products from sitemap.xml");

    let result: Result<()> = async {
        if refresh {
            SitemapFixtures::new().download(config, &pb).await?;
        } else {
            debug!("Skipping sitemap download, using cached fixtures");
        }
        if SitemapFixtures::is_cached_empty(config).await? {
            return Err(Error::EmptyFixtures);
        }
        Ok(())
    }
    .await;

    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    match &result {
        Ok(()) => pb.finish_with_message(format!("{} Sitemap fixtures ready", style("✔").green())),
        Err(e) => pb.finish_with_message(format!("{} Sitemap fixtures: {}", style("✘").red(), e)),
    }
    result
}

/// Copies `<name><suffix>` for every result suffix from `working_dir` into
/// `data_dir`. Missing or unreadable files are skipped.
pub async fn collect_results(name: &str, working_dir: &Path, data_dir: &Path) -> Vec<PathBuf> {
    let mut collected = Vec::new();
    for suffix in consts::RESULT_FILE_SUFFIXES {
        let file_name = format!("{}{}", name, suffix);
        let src = working_dir.join(&file_name);
        let dst = data_dir.join(&file_name);
        match tokio::fs::copy(&src, &dst).await {
            Ok(bytes) => {
                debug!(
                    "Collected {} ({})",
                    dst.display(),
                    humanize_bytes_binary!(bytes)
                );
                collected.push(dst);
            }
            Err(e) => debug!("Skipping {}: {}", src.display(), e),
        }
    }
    collected
}
