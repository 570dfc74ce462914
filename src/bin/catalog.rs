use std::path::PathBuf;

use anyhow::{Context, Result};
use catalog_flat::catalog::{localize, prewarm, CatalogClient, FlatRow, LocalizeMode, COLUMNS};
use catalog_flat::config::CatalogConfig;
use catalog_flat::export::ExportFormat;
use catalog_flat::images::ImageMaterializer;
use catalog_flat::logging::{init_tracing, CLI_FILTER};
use catalog_flat::util::env;
use clap::{Parser, Subcommand};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "catalog", version, about = "Product catalog flattener and image mirror")]
struct Cli {
    /// Override CATALOG_BASE_URL
    #[arg(long, global = true)]
    base_url: Option<String>,
    /// Override CATALOG_LOCALE
    #[arg(long, global = true)]
    locale: Option<String>,
    /// Override CATALOG_IMAGE_DIR
    #[arg(long, global = true)]
    image_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
#[command(rename_all = "kebab-case")]
enum Commands {
    /// Fetch and flatten the feed, then print the rows
    Fetch {
        #[arg(long, value_enum, default_value_t = LocalizeMode::Eager)]
        localize: LocalizeMode,
        /// Print at most this many rows
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Download every hero image referenced by the feed into the image dir
    SyncImages,
    /// Write the flattened rows to a file
    Export {
        #[arg(long, value_enum)]
        format: ExportFormat,
        /// Output path (default: strapi_products.<ext>)
        #[arg(long)]
        out: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t = LocalizeMode::Eager)]
        localize: LocalizeMode,
    },
}

impl Cli {
    fn config(&self) -> CatalogConfig {
        let mut config = CatalogConfig::from_env();
        if let Some(base_url) = &self.base_url {
            config.feed.base_url = base_url.trim_end_matches('/').to_string();
        }
        if let Some(locale) = &self.locale {
            config.feed.locale = locale.clone();
        }
        if let Some(dir) = &self.image_dir {
            config.images.dir = dir.clone();
        }
        config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing(CLI_FILTER)?;
    env::bootstrap_cli("catalog");

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        error!(error = ?e, "catalog: failed");
        return Err(e);
    }
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    let config = cli.config();
    let client = CatalogClient::new(config.feed.clone());
    let materializer = ImageMaterializer::from_config(&config.images, &config.feed.base_url);

    match cli.command {
        Commands::Fetch { localize: mode, limit } => {
            let (total_products, rows) = client.fetch_rows().await?;
            let (rows, report) = localize(rows, mode, &materializer).await?;
            if let Some(report) = report {
                report.log_summary();
            }
            info!(total_products, total_rows = rows.len(), %mode, "fetch: completed");
            print_table(&rows, limit.unwrap_or(rows.len()));
        }
        Commands::SyncImages => {
            let (total_products, rows) = client.fetch_rows().await?;
            info!(
                products = total_products,
                rows = rows.len(),
                dir = %materializer.cache().dir().display(),
                "sync-images: starting"
            );
            let report = prewarm(&rows, &materializer).await?;
            report.log_summary();
        }
        Commands::Export {
            format,
            out,
            localize: mode,
        } => {
            let (total_products, rows) = client.fetch_rows().await?;
            let (rows, report) = localize(rows, mode, &materializer).await?;
            if let Some(report) = report {
                report.log_summary();
            }
            let path = out.unwrap_or_else(|| PathBuf::from(format.default_file_name()));
            format
                .write(&path, &rows)
                .with_context(|| format!("export {format} to {}", path.display()))?;
            info!(
                total_products,
                total_rows = rows.len(),
                %format,
                %mode,
                path = %path.display(),
                "export: written"
            );
        }
    }
    Ok(())
}

fn print_table(rows: &[FlatRow], limit: usize) {
    let shown = &rows[..limit.min(rows.len())];
    let mut widths = COLUMNS.map(str::len);
    for row in shown {
        for (w, f) in widths.iter_mut().zip(row.fields()) {
            *w = (*w).max(f.map_or(0, |s| s.chars().count()));
        }
    }

    let line = |cells: [&str; 6]| {
        cells
            .iter()
            .zip(widths)
            .map(|(c, w)| format!("{c:<w$}"))
            .collect::<Vec<_>>()
            .join(" | ")
    };
    println!("{}", line(COLUMNS));
    for row in shown {
        println!("{}", line(row.fields().map(|f| f.unwrap_or(""))));
    }
    if shown.len() < rows.len() {
        println!("... {} more rows", rows.len() - shown.len());
    }
}
