//! Feed → rows, plus the two interchangeable image localization strategies.
//!
//! * eager: per-row cache existence check at serve time, misses become `None`
//! * batch: download everything up front, then rewrite from the report mapping

use std::collections::HashMap;
use std::fmt;

use anyhow::{Context, Result};
use indexmap::IndexSet;
use serde::Deserialize;

use super::flatten::flatten_all;
use super::model::{FeedResponse, FlatRow};
use crate::images::{ImageCache, ImageMaterializer, MaterializeReport};

pub fn assemble(feed: &FeedResponse) -> Vec<FlatRow> {
    flatten_all(&feed.data)
}

/// Decode a raw feed body and flatten it. A body that is not a feed is an error.
pub fn assemble_value(value: serde_json::Value) -> Result<Vec<FlatRow>> {
    let feed: FeedResponse =
        serde_json::from_value(value).context("catalog response is not a product feed")?;
    Ok(assemble(&feed))
}

/// How image URLs in rows are rewritten before rows are served or exported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LocalizeMode {
    /// Keep remote URLs.
    None,
    /// Cache existence check only; uncached images become null.
    #[default]
    Eager,
    /// Download missing images first; failures keep the remote URL.
    Batch,
}

impl fmt::Display for LocalizeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LocalizeMode::None => "none",
            LocalizeMode::Eager => "eager",
            LocalizeMode::Batch => "batch",
        };
        f.write_str(s)
    }
}

/// What to put in a row whose image is not in a materialization mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fallback {
    Remote,
    Missing,
}

/// Eager mode: swap each image URL for its cached public path, or `None`.
/// The cache is checked once per unique URL.
pub async fn localize_cached(rows: Vec<FlatRow>, cache: &ImageCache) -> Vec<FlatRow> {
    let mut hits = HashMap::new();
    for url in image_urls(&rows) {
        if let Some(public) = cache.lookup(url).await {
            hits.insert(url.to_string(), public);
        }
    }
    apply_mapping(rows, &hits, Fallback::Missing)
}

/// Unique image URLs in first-seen order.
pub fn image_urls(rows: &[FlatRow]) -> Vec<&str> {
    rows.iter()
        .filter_map(|r| r.image_url.as_deref())
        .collect::<IndexSet<&str>>()
        .into_iter()
        .collect()
}

/// Batch mode: make sure every referenced image is cached.
pub async fn prewarm(rows: &[FlatRow], materializer: &ImageMaterializer) -> Result<MaterializeReport> {
    materializer.materialize(image_urls(rows)).await
}

/// Rewrite image URLs from a materialization mapping.
pub fn apply_mapping(
    rows: Vec<FlatRow>,
    mapping: &HashMap<String, String>,
    fallback: Fallback,
) -> Vec<FlatRow> {
    rows.into_iter()
        .map(|mut row| {
            row.image_url = row.image_url.and_then(|url| match mapping.get(&url) {
                Some(local) => Some(local.clone()),
                None => match fallback {
                    Fallback::Remote => Some(url),
                    Fallback::Missing => None,
                },
            });
            row
        })
        .collect()
}

/// Apply `mode` to `rows`. Batch mode also returns its report.
pub async fn localize(
    rows: Vec<FlatRow>,
    mode: LocalizeMode,
    materializer: &ImageMaterializer,
) -> Result<(Vec<FlatRow>, Option<MaterializeReport>)> {
    match mode {
        LocalizeMode::None => Ok((rows, None)),
        LocalizeMode::Eager => Ok((localize_cached(rows, materializer.cache()).await, None)),
        LocalizeMode::Batch => {
            let report = prewarm(&rows, materializer).await?;
            let rows = apply_mapping(rows, &report.mapping, Fallback::Remote);
            Ok((rows, Some(report)))
        }
    }
}
