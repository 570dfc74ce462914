//! Row exports: CSV in the legacy dialect, a one-sheet XLSX, and JSON.

pub mod csv;
pub mod json;
pub mod xlsx;

use std::fmt;
use std::path::Path;

use anyhow::Result;
use serde::Deserialize;

use crate::catalog::model::FlatRow;

pub use self::csv::{read_csv, render_csv, write_csv};
pub use self::json::{render_json, write_json};
pub use self::xlsx::{render_xlsx, write_xlsx};

/// Stem of the default export file name.
pub const DEFAULT_STEM: &str = "strapi_products";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    Xlsx,
    Json,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Xlsx => "xlsx",
            ExportFormat::Json => "json",
        }
    }

    pub fn mime(self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv; charset=utf-8",
            ExportFormat::Xlsx => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
            ExportFormat::Json => "application/json",
        }
    }

    pub fn default_file_name(self) -> String {
        format!("{DEFAULT_STEM}.{}", self.extension())
    }

    pub fn render(self, rows: &[FlatRow]) -> Result<Vec<u8>> {
        Ok(match self {
            ExportFormat::Csv => render_csv(rows).into_bytes(),
            ExportFormat::Xlsx => render_xlsx(rows)?,
            ExportFormat::Json => render_json(rows)?.into_bytes(),
        })
    }

    pub fn write(self, path: &Path, rows: &[FlatRow]) -> Result<()> {
        match self {
            ExportFormat::Csv => write_csv(path, rows),
            ExportFormat::Xlsx => write_xlsx(path, rows),
            ExportFormat::Json => write_json(path, rows),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}
