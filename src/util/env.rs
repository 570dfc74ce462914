//! Environment helpers: centralized dotenv loading and ergonomic getters.
//! Call `init_env()` once early in each binary (or rely on lazy Once).
use std::fmt::Display;
use std::str::FromStr;
use std::sync::Once;
use tracing::{info, warn};

static INIT: Once = Once::new();

/// Load .env exactly once. Safe to call many times.
pub fn init_env() {
    INIT.call_once(|| {
        if dotenv::dotenv().is_ok() {
            return;
        }
        // Fallback to Cargo project root
        let candidate = format!("{}/.env", env!("CARGO_MANIFEST_DIR"));
        let _ = dotenv::from_filename(candidate);
    });
}

/// Common bootstrap for CLI binaries: load dotenv once and log a redacted
/// snapshot of the catalog-related variables that are set.
pub fn bootstrap_cli(bin_name: &str) {
    init_env();

    let snapshot: Vec<(String, String)> = SNAPSHOT_KEYS
        .iter()
        .filter_map(|k| env_opt(k).map(|v| (k.to_string(), redact_value(k, &v))))
        .collect();
    info!(
        target = "bootstrap",
        bin = bin_name,
        snapshot = ?snapshot,
        "configuration snapshot"
    );
}

const SNAPSHOT_KEYS: &[&str] = &[
    "CATALOG_BASE_URL",
    "CATALOG_LOCALE",
    "CATALOG_PAGE_SIZE",
    "CATALOG_IMAGE_DIR",
    "CATALOG_IMAGE_PREFIX",
    "CATALOG_PACE_EVERY",
    "CATALOG_PACE_PAUSE_MS",
    "CATALOG_MAX_CONCURRENT",
    "CATALOG_HTTP_TIMEOUT_SECS",
    "CATALOG_IMAGE_RETRIES",
    "CATALOG_RETRY_BASE_MS",
    "API_HOST",
    "API_PORT",
    "ALLOWED_ORIGINS",
];

/// Get optional env var (None if unset or empty).
pub fn env_opt(key: &str) -> Option<String> {
    init_env();
    match std::env::var(key) {
        Ok(v) if !v.trim().is_empty() => Some(v),
        _ => None,
    }
}

/// Get parsed value with default fallback. Unparseable values are logged and ignored.
pub fn env_parse<T>(key: &str, default: T) -> T
where
    T: FromStr + Display,
{
    match env_opt(key) {
        Some(raw) => match raw.trim().parse::<T>() {
            Ok(value) => value,
            Err(_) => {
                warn!(
                    env_key = key,
                    raw_value = %raw,
                    fallback = %default,
                    "invalid env value; using default"
                );
                default
            }
        },
        None => default,
    }
}

/// Optional parsed value; unparseable values are logged and treated as unset.
pub fn env_parse_opt<T>(key: &str) -> Option<T>
where
    T: FromStr,
{
    let raw = env_opt(key)?;
    match raw.trim().parse::<T>() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!(env_key = key, raw_value = %raw, "invalid env value; ignoring");
            None
        }
    }
}

fn redact_value(key: &str, val: &str) -> String {
    let k = key.to_ascii_uppercase();
    if k.contains("PASSWORD") || k.contains("SECRET") || k.contains("TOKEN") {
        return "***".to_string();
    }

    let val_trim = val.trim();

    // Credentials embedded in URLs never reach the logs.
    if let Ok(mut u) = url::Url::parse(val_trim) {
        if !u.username().is_empty() || u.password().is_some() {
            let _ = u.set_username("***");
            let _ = u.set_password(Some("***"));
            return u.to_string();
        }
    }

    val_trim.to_string()
}
