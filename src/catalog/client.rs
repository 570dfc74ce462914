use anyhow::{Context, Result};
use reqwest::Client;
use tracing::{debug, info};

use super::flatten::flatten_all;
use super::model::{FeedResponse, FlatRow, ProductRecord};
use crate::config::FeedConfig;

/// Fields and relations requested from the products collection. Detail items
/// are restricted to the `is_main` entries upstream.
const PRODUCT_QUERY: &str = concat!(
    "filters[publishedAt][$notNull]=true",
    "&fields=name",
    "&fields=slug_item",
    "&populate[hero_image][fields]=url",
    "&populate[properties][populate][bedsize][populate][bedsize][fields]=name",
    "&populate[properties][populate][bedsize][fields]=artnum",
    "&populate[details][populate][detailitems][filters][is_main][$eq]=true",
    "&populate[details][populate][detailitems][fields]=value",
);

/// Upper bound on pages followed in one fetch.
const MAX_PAGES: u32 = 1_000;

/// Client for the Strapi products endpoint.
#[derive(Clone)]
pub struct CatalogClient {
    client: Client,
    config: FeedConfig,
}

impl CatalogClient {
    pub fn new(config: FeedConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self { client, config }
    }

    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    /// Products endpoint URL for one page.
    pub fn page_url(&self, page: u32) -> String {
        format!(
            "{}/api/products?pagination[page]={}&pagination[pageSize]={}&locale={}&{}",
            self.config.base_url.trim_end_matches('/'),
            page,
            self.config.page_size,
            self.config.locale,
            PRODUCT_QUERY
        )
    }

    /// Fetch every product record, following `meta.pagination.pageCount`.
    pub async fn fetch_records(&self) -> Result<Vec<ProductRecord>> {
        let first = self.fetch_page(1).await?;
        let page_count = first.page_count().unwrap_or(1).clamp(1, MAX_PAGES);
        let mut records = first.data;

        for page in 2..=page_count {
            let next = self.fetch_page(page).await?;
            if next.data.is_empty() {
                break;
            }
            records.extend(next.data);
        }

        info!(
            products = records.len(),
            pages = page_count,
            "catalog: feed fetched"
        );
        Ok(records)
    }

    /// Fetch and flatten in one step.
    pub async fn fetch_rows(&self) -> Result<(usize, Vec<FlatRow>)> {
        let records = self.fetch_records().await?;
        let rows = flatten_all(&records);
        info!(
            products = records.len(),
            rows = rows.len(),
            "catalog: rows assembled"
        );
        Ok((records.len(), rows))
    }

    async fn fetch_page(&self, page: u32) -> Result<FeedResponse> {
        let url = self.page_url(page);
        debug!(page, url = %url, "catalog: requesting page");

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await
            .context("Failed to send catalog request")?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error".to_string());
            anyhow::bail!("Catalog API returned status {}: {}", status, error_text);
        }

        response
            .json::<FeedResponse>()
            .await
            .with_context(|| format!("Failed to parse catalog page {page}"))
    }
}
