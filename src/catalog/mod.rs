//! Product feed: decoding, flattening, fetching and assembly.

pub mod assemble;
pub mod client;
#[cfg(test)]
pub(crate) mod fixture;
pub mod flatten;
pub mod model;

pub use assemble::{
    apply_mapping, assemble, assemble_value, image_urls, localize, localize_cached, prewarm,
    Fallback, LocalizeMode,
};
pub use client::CatalogClient;
pub use flatten::{flatten, flatten_all};
pub use model::{FeedResponse, FlatRow, ProductRecord, COLUMNS};
