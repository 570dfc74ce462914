//! Typed decoding of the Strapi product feed and the flat row it becomes.
//!
//! Every nesting level of the feed is optional. Absent keys, explicit `null`s
//! and empty strings all decode to `None`, so downstream code never has to
//! chase optional chains through raw JSON.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Column names in export order.
pub const COLUMNS: [&str; 6] = [
    "name",
    "slug_item",
    "hero_image_url",
    "bedsize",
    "artnum",
    "dimensions",
];

/// One flattened (variant, dimension) combination of a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatRow {
    pub name: String,
    #[serde(rename = "slug_item")]
    pub slug: String,
    #[serde(rename = "hero_image_url")]
    pub image_url: Option<String>,
    pub bedsize: Option<String>,
    pub artnum: Option<String>,
    pub dimensions: Option<String>,
}

impl FlatRow {
    /// Field values in [`COLUMNS`] order.
    pub fn fields(&self) -> [Option<&str>; 6] {
        [
            Some(self.name.as_str()),
            Some(self.slug.as_str()),
            self.image_url.as_deref(),
            self.bedsize.as_deref(),
            self.artnum.as_deref(),
            self.dimensions.as_deref(),
        ]
    }
}

/// Top-level feed envelope. `data` is required: a body without it is not a feed.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedResponse {
    pub data: Vec<ProductRecord>,
    #[serde(default)]
    pub meta: Option<FeedMeta>,
}

impl FeedResponse {
    /// Number of pages the server reports, if it reports pagination at all.
    pub fn page_count(&self) -> Option<u32> {
        self.meta
            .as_ref()
            .and_then(|m| m.pagination.as_ref())
            .map(|p| p.page_count)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeedMeta {
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub page_size: u32,
    #[serde(default)]
    pub page_count: u32,
    #[serde(default)]
    pub total: u64,
}

/// One product item of the feed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductRecord {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub attributes: ProductAttributes,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductAttributes {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub slug_item: String,
    #[serde(default)]
    pub hero_image: Option<Relation<MediaAttributes>>,
    #[serde(default)]
    pub properties: Option<Properties>,
    #[serde(default)]
    pub details: Option<Details>,
}

/// Strapi v4 relation wrapper: `{ data: { id, attributes } | null }`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Relation<T> {
    #[serde(default = "Option::default")]
    pub data: Option<Entity<T>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Entity<T> {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default = "Option::default")]
    pub attributes: Option<T>,
}

impl<T> Relation<T> {
    pub fn attributes(&self) -> Option<&T> {
        self.data.as_ref()?.attributes.as_ref()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MediaAttributes {
    #[serde(default, deserialize_with = "lenient_text")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Properties {
    #[serde(default, deserialize_with = "null_as_default")]
    pub bedsize: Vec<SizeVariant>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Details {
    #[serde(default, deserialize_with = "null_as_default")]
    pub detailitems: Vec<DimensionEntry>,
}

/// Size variant: an article number plus a reference to a named size.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SizeVariant {
    #[serde(default, deserialize_with = "lenient_text")]
    pub artnum: Option<String>,
    #[serde(default)]
    pub bedsize: Option<Relation<SizeAttributes>>,
}

impl SizeVariant {
    /// Display label resolved through variant → size → name.
    pub fn label(&self) -> Option<&str> {
        self.bedsize.as_ref()?.attributes()?.name.as_deref()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SizeAttributes {
    #[serde(default, deserialize_with = "lenient_text")]
    pub name: Option<String>,
}

/// Primary dimension entry (the feed query only returns `is_main` items).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DimensionEntry {
    #[serde(default, deserialize_with = "lenient_text")]
    pub value: Option<String>,
}

impl ProductRecord {
    pub fn name(&self) -> &str {
        &self.attributes.name
    }

    pub fn slug(&self) -> &str {
        &self.attributes.slug_item
    }

    pub fn hero_image_url(&self) -> Option<&str> {
        self.attributes.hero_image.as_ref()?.attributes()?.url.as_deref()
    }

    pub fn size_variants(&self) -> &[SizeVariant] {
        self.attributes
            .properties
            .as_ref()
            .map(|p| p.bedsize.as_slice())
            .unwrap_or(&[])
    }

    pub fn dimension_entries(&self) -> &[DimensionEntry] {
        self.attributes
            .details
            .as_ref()
            .map(|d| d.detailitems.as_slice())
            .unwrap_or(&[])
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accepts strings, numbers and booleans; `null`, `""` and containers become `None`.
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(Value::String(s)) if !s.is_empty() => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}
