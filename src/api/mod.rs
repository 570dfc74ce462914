// HTTP surface over the catalog pipeline: rows, gallery cards, exports and
// the local image cache.

pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod server;

pub use server::{ApiServer, AppState};
