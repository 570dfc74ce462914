//! Runtime configuration assembled from the environment (after `.env`).
//!
//! Every field has a default matching the storefront deployment, so an empty
//! environment yields a working configuration.

use std::path::PathBuf;
use std::time::Duration;

use crate::util::env::{env_opt, env_parse, env_parse_opt};

pub const DEFAULT_BASE_URL: &str = "https://strapi.fiftyfourms.com";
pub const DEFAULT_LOCALE: &str = "ru";
pub const DEFAULT_PAGE_SIZE: u32 = 100_000;
pub const DEFAULT_IMAGE_DIR: &str = "public/images";
pub const DEFAULT_IMAGE_PREFIX: &str = "/images";

/// Where the product feed lives and how it is paged.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// Origin of the content API; also the base for origin-relative image URLs.
    pub base_url: String,
    pub locale: String,
    pub page_size: u32,
    pub timeout: Duration,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            locale: DEFAULT_LOCALE.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            timeout: Duration::from_secs(30),
        }
    }
}

/// Settings for mirroring hero images into the local cache.
#[derive(Debug, Clone)]
pub struct ImageConfig {
    pub dir: PathBuf,
    /// Public path prefix local images are served under (`/images/<file>`).
    pub public_prefix: String,
    /// Pause issuance after this many launched downloads. Zero disables pacing.
    pub pace_every: usize,
    pub pace_pause: Duration,
    /// Optional cap on in-flight downloads; `None` leaves issuance paced only.
    pub max_concurrent: Option<usize>,
    pub timeout: Duration,
    pub max_retries: u32,
    pub retry_base: Duration,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(DEFAULT_IMAGE_DIR),
            public_prefix: DEFAULT_IMAGE_PREFIX.to_string(),
            pace_every: 10,
            pace_pause: Duration::from_millis(100),
            max_concurrent: None,
            timeout: Duration::from_secs(30),
            max_retries: 0,
            retry_base: Duration::from_millis(300),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CatalogConfig {
    pub feed: FeedConfig,
    pub images: ImageConfig,
}

impl CatalogConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let timeout = Duration::from_secs(env_parse(
            "CATALOG_HTTP_TIMEOUT_SECS",
            defaults.feed.timeout.as_secs(),
        ));

        let feed = FeedConfig {
            base_url: env_opt("CATALOG_BASE_URL")
                .map(|s| s.trim().trim_end_matches('/').to_string())
                .unwrap_or(defaults.feed.base_url),
            locale: env_opt("CATALOG_LOCALE")
                .map(|s| s.trim().to_string())
                .unwrap_or(defaults.feed.locale),
            page_size: env_parse("CATALOG_PAGE_SIZE", defaults.feed.page_size).max(1),
            timeout,
        };

        let images = ImageConfig {
            dir: env_opt("CATALOG_IMAGE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.images.dir),
            public_prefix: env_opt("CATALOG_IMAGE_PREFIX")
                .map(|s| s.trim().trim_end_matches('/').to_string())
                .unwrap_or(defaults.images.public_prefix),
            pace_every: env_parse("CATALOG_PACE_EVERY", defaults.images.pace_every),
            pace_pause: Duration::from_millis(env_parse(
                "CATALOG_PACE_PAUSE_MS",
                defaults.images.pace_pause.as_millis() as u64,
            )),
            max_concurrent: env_parse_opt::<usize>("CATALOG_MAX_CONCURRENT").filter(|v| *v > 0),
            timeout,
            max_retries: env_parse("CATALOG_IMAGE_RETRIES", defaults.images.max_retries),
            retry_base: Duration::from_millis(env_parse(
                "CATALOG_RETRY_BASE_MS",
                defaults.images.retry_base.as_millis() as u64,
            )),
        };

        Self { feed, images }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_storefront_deployment() {
        let cfg = CatalogConfig::default();
        assert_eq!(cfg.feed.base_url, "https://strapi.fiftyfourms.com");
        assert_eq!(cfg.feed.locale, "ru");
        assert_eq!(cfg.images.pace_every, 10);
        assert_eq!(cfg.images.pace_pause, Duration::from_millis(100));
        assert!(cfg.images.max_concurrent.is_none());
        assert_eq!(cfg.images.max_retries, 0);
    }
}
