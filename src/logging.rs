//! Subscriber setup shared by the `catalog` and `api_server` binaries.

use anyhow::anyhow;
use tracing_subscriber::EnvFilter;

/// CLI default when `RUST_LOG` is unset.
pub const CLI_FILTER: &str = "info";

/// Server default: request lines from actix, but no connection-level noise
/// from the HTTP client stack.
pub const SERVER_FILTER: &str = "info,actix_web=info,hyper=warn,reqwest=warn";

/// Install the global fmt subscriber. `RUST_LOG` wins over `default_filter`.
pub fn init_tracing(default_filter: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .map_err(|e| anyhow!("invalid log filter {default_filter:?}: {e}"))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .compact()
        .try_init()
        .map_err(|e| anyhow!("tracing subscriber already set: {e}"))
}
