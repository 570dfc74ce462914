//! Local mirror of product hero images.

pub mod cache;
pub mod filename;
pub mod materialize;
pub mod pacing;

pub use cache::ImageCache;
pub use filename::image_filename;
pub use materialize::{
    resolve_url, FetchFailure, HttpImageFetcher, ImageFetcher, ImageMaterializer,
    MaterializeReport,
};
pub use pacing::{LaunchPacer, RetryPolicy};
