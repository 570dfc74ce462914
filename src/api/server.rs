// API server implementation using actix-web

use std::time::Instant;

use actix_web::{web, App, HttpServer};
use anyhow::{Context, Result};

use crate::api::{middleware, routes};
use crate::catalog::CatalogClient;
use crate::config::CatalogConfig;
use crate::images::ImageMaterializer;
use crate::util::env::env_opt;

/// Shared per-process state handed to every handler.
pub struct AppState {
    pub client: CatalogClient,
    pub materializer: ImageMaterializer,
    pub started: Instant,
}

impl AppState {
    pub fn new(config: &CatalogConfig) -> Self {
        Self {
            client: CatalogClient::new(config.feed.clone()),
            materializer: ImageMaterializer::from_config(&config.images, &config.feed.base_url),
            started: Instant::now(),
        }
    }
}

pub struct ApiServer {
    pub host: String,
    pub port: u16,
    pub allowed_origins: String,
    pub config: CatalogConfig,
}

impl ApiServer {
    /// Create server from environment variables
    pub fn from_env() -> Result<Self> {
        crate::util::env::init_env();

        let host = env_opt("API_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = env_opt("API_PORT")
            .map(|raw| raw.trim().parse::<u16>())
            .transpose()
            .context("Invalid API_PORT")?
            .unwrap_or(8080);
        let allowed_origins =
            env_opt("ALLOWED_ORIGINS").unwrap_or_else(|| "http://localhost:3000".to_string());

        Ok(Self {
            host,
            port,
            allowed_origins,
            config: CatalogConfig::from_env(),
        })
    }

    /// Start the HTTP server
    pub async fn run(self) -> Result<()> {
        let bind_addr = format!("{}:{}", self.host, self.port);

        tracing::info!(
            host = %self.host,
            port = %self.port,
            upstream = %self.config.feed.base_url,
            image_dir = %self.config.images.dir.display(),
            "Starting catalog API server"
        );

        let state = web::Data::new(AppState::new(&self.config));
        state.materializer.cache().ensure_dir().await?;
        let allowed_origins = self.allowed_origins.clone();

        HttpServer::new(move || {
            let (logger, compress) = middleware::setup_middleware();
            let cors = middleware::setup_cors(&allowed_origins);

            App::new()
                .app_data(state.clone())
                .wrap(logger)
                .wrap(compress)
                .wrap(cors)
                .configure(routes::configure_routes)
        })
        .bind(&bind_addr)
        .with_context(|| format!("Failed to bind to {}", bind_addr))?
        .run()
        .await
        .context("HTTP server error")?;

        Ok(())
    }
}
