//! Flattens the Strapi product feed into one row per (size variant,
//! dimension) pair, mirrors hero images into a local cache, and exports the
//! rows as CSV, XLSX or JSON.

pub mod api;
pub mod catalog;
pub mod config;
pub mod export;
pub mod images;
pub mod logging;

pub mod util {
    pub mod env;
}

pub use catalog::{FlatRow, LocalizeMode};
pub use config::CatalogConfig;
pub use export::ExportFormat;
