// API request/response models (DTOs)

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::catalog::{FlatRow, LocalizeMode};

/// Standard API response wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            meta: Some(Meta::now()),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
            meta: Some(Meta::now()),
        }
    }
}

/// Metadata included in all API responses
#[derive(Debug, Serialize, Deserialize)]
pub struct Meta {
    pub timestamp: DateTime<Utc>,
    pub request_id: String,
    pub version: String,
}

impl Meta {
    pub fn now() -> Self {
        Self {
            timestamp: Utc::now(),
            request_id: uuid::Uuid::new_v4().to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub upstream: String,
    pub image_dir: String,
    pub uptime_seconds: u64,
}

/// `?localize=` on row-returning endpoints. Absent means eager.
#[derive(Debug, Default, Deserialize)]
pub struct LocalizeQuery {
    #[serde(default)]
    pub localize: Option<LocalizeMode>,
}

impl LocalizeQuery {
    pub fn mode(&self) -> LocalizeMode {
        self.localize.unwrap_or_default()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProductsPayload {
    pub total_products: usize,
    pub total_rows: usize,
    pub rows: Vec<FlatRow>,
}

/// One product as the storefront gallery shows it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GalleryCard {
    pub name: String,
    pub slug: String,
    pub image: Option<String>,
    pub variants: Vec<GalleryVariant>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GalleryVariant {
    pub bedsize: Option<String>,
    pub artnum: Option<String>,
    pub dimensions: Option<String>,
}

/// Fold flat rows back into one card per slug, in first-seen order.
///
/// Name and image come from the first row of each slug. Rows carrying no
/// variant data at all (the single row of a bare product) add no variant.
pub fn build_gallery(rows: Vec<FlatRow>) -> Vec<GalleryCard> {
    let mut cards: IndexMap<String, GalleryCard> = IndexMap::new();
    for row in rows {
        let card = cards.entry(row.slug.clone()).or_insert_with(|| GalleryCard {
            name: row.name.clone(),
            slug: row.slug.clone(),
            image: row.image_url.clone(),
            variants: Vec::new(),
        });
        if row.bedsize.is_some() || row.artnum.is_some() || row.dimensions.is_some() {
            card.variants.push(GalleryVariant {
                bedsize: row.bedsize,
                artnum: row.artnum,
                dimensions: row.dimensions,
            });
        }
    }
    cards.into_values().collect()
}
