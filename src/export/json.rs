use std::path::Path;

use anyhow::{Context, Result};

use crate::catalog::model::FlatRow;

pub fn render_json(rows: &[FlatRow]) -> Result<String> {
    serde_json::to_string_pretty(rows).context("serialize rows")
}

pub fn write_json(path: &Path, rows: &[FlatRow]) -> Result<()> {
    let json_str = render_json(rows)?;
    std::fs::write(path, json_str).with_context(|| format!("write {}", path.display()))
}
