//! Mirror remote hero images into the local cache.
//!
//! Every unique URL becomes its own task. Tasks are paced on launch, may be
//! capped by a semaphore, and settle independently: one failed download never
//! fails the batch. The cache directory is shared without a lock; two tasks
//! writing the same filename write the same bytes.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use indexmap::IndexSet;
use reqwest::Client;
use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use super::cache::ImageCache;
use super::filename::image_filename;
use super::pacing::{LaunchPacer, RetryPolicy};
use crate::config::ImageConfig;

/// Why a single image GET did not produce bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchFailure {
    /// Server answered with a non-2xx status.
    Status(u16),
    /// Connection, timeout or body read error.
    Transport(String),
}

impl FetchFailure {
    /// Transport errors and 5xx are worth another attempt; 4xx are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchFailure::Status(code) => *code >= 500,
            FetchFailure::Transport(_) => true,
        }
    }
}

impl fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchFailure::Status(code) => write!(f, "HTTP status {code}"),
            FetchFailure::Transport(msg) => write!(f, "transport error: {msg}"),
        }
    }
}

impl std::error::Error for FetchFailure {}

/// Source of image bytes for an absolute URL.
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Bytes, FetchFailure>;
}

/// Production fetcher backed by reqwest.
#[derive(Clone)]
pub struct HttpImageFetcher {
    client: Client,
}

impl HttpImageFetcher {
    pub fn new(timeout: std::time::Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self { client }
    }
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn fetch(&self, url: &str) -> Result<Bytes, FetchFailure> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchFailure::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchFailure::Status(status.as_u16()));
        }

        response
            .bytes()
            .await
            .map_err(|e| FetchFailure::Transport(e.to_string()))
    }
}

/// Outcome of one batch: counters plus URL → public local path for every URL
/// that is now cached. Failed URLs are absent from `mapping`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MaterializeReport {
    pub skipped: usize,
    pub downloaded: usize,
    pub failed: usize,
    pub mapping: HashMap<String, String>,
}

impl MaterializeReport {
    fn record(&mut self, url: String, outcome: Outcome) {
        match outcome {
            Outcome::Skipped(path) => {
                self.skipped += 1;
                self.mapping.insert(url, path);
            }
            Outcome::Downloaded(path) => {
                self.downloaded += 1;
                self.mapping.insert(url, path);
            }
            Outcome::Failed => self.failed += 1,
        }
    }

    pub fn log_summary(&self) {
        info!(
            skipped = self.skipped,
            downloaded = self.downloaded,
            failed = self.failed,
            mapped = self.mapping.len(),
            "images: batch complete"
        );
    }
}

#[derive(Debug)]
enum Outcome {
    Skipped(String),
    Downloaded(String),
    Failed,
}

/// Complete an origin-relative image URL against `base_url`.
pub fn resolve_url(url: &str, base_url: &str) -> String {
    if url.starts_with("http") {
        return url.to_string();
    }
    let base = base_url.trim_end_matches('/');
    if url.starts_with('/') {
        format!("{base}{url}")
    } else {
        format!("{base}/{url}")
    }
}

pub struct ImageMaterializer {
    fetcher: Arc<dyn ImageFetcher>,
    cache: ImageCache,
    base_url: String,
    pace_every: usize,
    pace_pause: std::time::Duration,
    max_concurrent: Option<usize>,
    retry: RetryPolicy,
}

impl ImageMaterializer {
    pub fn new(fetcher: Arc<dyn ImageFetcher>, cache: ImageCache, base_url: impl Into<String>) -> Self {
        let defaults = ImageConfig::default();
        Self {
            fetcher,
            cache,
            base_url: base_url.into(),
            pace_every: defaults.pace_every,
            pace_pause: defaults.pace_pause,
            max_concurrent: defaults.max_concurrent,
            retry: RetryPolicy::default(),
        }
    }

    /// Production wiring: reqwest fetcher plus every knob from `config`.
    pub fn from_config(config: &ImageConfig, base_url: impl Into<String>) -> Self {
        let fetcher = Arc::new(HttpImageFetcher::new(config.timeout));
        Self::new(fetcher, ImageCache::from_config(config), base_url)
            .with_pacing(config.pace_every, config.pace_pause)
            .with_max_concurrent(config.max_concurrent)
            .with_retry(RetryPolicy {
                max_retries: config.max_retries,
                base: config.retry_base,
            })
    }

    pub fn with_pacing(mut self, every: usize, pause: std::time::Duration) -> Self {
        self.pace_every = every;
        self.pace_pause = pause;
        self
    }

    pub fn with_max_concurrent(mut self, max_concurrent: Option<usize>) -> Self {
        self.max_concurrent = max_concurrent.filter(|n| *n > 0);
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn cache(&self) -> &ImageCache {
        &self.cache
    }

    /// Ensure a cached copy of every URL, downloading the missing ones.
    ///
    /// Only cache-directory setup can fail; per-URL failures are counted in
    /// the report.
    pub async fn materialize<I, S>(&self, urls: I) -> Result<MaterializeReport>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.cache.ensure_dir().await?;

        let unique: IndexSet<String> = urls
            .into_iter()
            .map(|u| u.as_ref().to_string())
            .filter(|u| !u.is_empty())
            .collect();
        info!(unique = unique.len(), "images: unique urls to process");

        let started = Instant::now();
        let gate = self.max_concurrent.map(|n| Arc::new(Semaphore::new(n)));
        let mut pacer = LaunchPacer::new(self.pace_every, self.pace_pause);
        let mut tasks: JoinSet<(String, Outcome)> = JoinSet::new();
        let mut report = MaterializeReport::default();

        for url in unique {
            let Some(filename) = image_filename(&url) else {
                report.failed += 1;
                continue;
            };
            let job = DownloadJob {
                remote: resolve_url(&url, &self.base_url),
                url,
                filename,
                fetcher: Arc::clone(&self.fetcher),
                cache: self.cache.clone(),
                retry: self.retry.clone(),
                gate: gate.clone(),
            };
            tasks.spawn(job.run());
            pacer.record_launch().await;
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((url, outcome)) => report.record(url, outcome),
                Err(e) => {
                    warn!(error = %e, "images: download task aborted");
                    report.failed += 1;
                }
            }
        }

        debug!(
            launched = pacer.launched(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "images: all tasks settled"
        );
        report.log_summary();
        Ok(report)
    }
}

struct DownloadJob {
    url: String,
    remote: String,
    filename: String,
    fetcher: Arc<dyn ImageFetcher>,
    cache: ImageCache,
    retry: RetryPolicy,
    gate: Option<Arc<Semaphore>>,
}

impl DownloadJob {
    async fn run(self) -> (String, Outcome) {
        let outcome = self.execute().await;
        (self.url, outcome)
    }

    async fn execute(&self) -> Outcome {
        let public = self.cache.public_path(&self.filename);
        if self.cache.contains(&self.filename).await {
            return Outcome::Skipped(public);
        }

        let _permit = match &self.gate {
            Some(gate) => match Arc::clone(gate).acquire_owned().await {
                Ok(permit) => Some(permit),
                Err(_) => return Outcome::Failed,
            },
            None => None,
        };

        let bytes = match self.fetch_with_retry().await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(url = %self.remote, error = %e, "images: download failed");
                return Outcome::Failed;
            }
        };

        // Another task may have written the same file while this one was downloading.
        if self.cache.contains(&self.filename).await {
            return Outcome::Skipped(public);
        }

        match self.cache.write(&self.filename, &bytes).await {
            Ok(()) => {
                debug!(url = %self.remote, file = %self.filename, bytes = bytes.len(), "images: cached");
                Outcome::Downloaded(public)
            }
            Err(e) => {
                warn!(url = %self.remote, error = %e, "images: write failed");
                Outcome::Failed
            }
        }
    }

    async fn fetch_with_retry(&self) -> Result<Bytes, FetchFailure> {
        let mut attempt = 0;
        loop {
            match self.fetcher.fetch(&self.remote).await {
                Ok(bytes) => return Ok(bytes),
                Err(e) if e.is_retryable() && attempt < self.retry.max_retries => {
                    let delay = self.retry.delay(attempt);
                    debug!(url = %self.remote, attempt, delay_ms = delay.as_millis() as u64, error = %e, "images: retrying");
                    sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
