use std::io;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    ConfigError(#[from] swbench_config::Error),
    #[error("HTTP request error: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("Sitemap request to {url} failed with status {status}")]
    SitemapStatus {
        url: String,
        status: reqwest::StatusCode,
    },
    #[error("Sitemap parse error in {url}: {message}")]
    SitemapParse { url: String, message: String },
    #[error(
        "The category and product urls from the sitemap are empty. Was the sitemap generated on Shopware side?"
    )]
    EmptyFixtures,
    #[error("Failed to spawn '{cmd}': {source}")]
    SpawnError { cmd: String, source: io::Error },
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Task join error: {0}")]
    JoinError(#[from] tokio::task::JoinError),
}
