use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};

use crate::catalog::model::{FlatRow, COLUMNS};

/// Render rows in the export dialect: bare header line, every non-null field
/// quoted with inner quotes doubled, nulls empty, `\n` between lines and no
/// trailing newline.
///
/// `csv::Writer` can't emit this (it either quotes everything, empties
/// included, or only what needs it), so lines are built directly.
pub fn render_csv(rows: &[FlatRow]) -> String {
    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(COLUMNS.join(","));
    for row in rows {
        let line = row
            .fields()
            .iter()
            .map(|f| f.map(quote).unwrap_or_default())
            .collect::<Vec<_>>()
            .join(",");
        lines.push(line);
    }
    lines.join("\n")
}

fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

pub fn write_csv(path: &Path, rows: &[FlatRow]) -> Result<()> {
    std::fs::write(path, render_csv(rows)).with_context(|| format!("write {}", path.display()))
}

/// Parse an export back into rows. Empty fields come back as `None`.
pub fn read_csv<R: Read>(reader: R) -> Result<Vec<FlatRow>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::None)
        .from_reader(reader);

    let headers = rdr.headers().context("csv header")?.clone();
    if headers.iter().ne(COLUMNS.iter().copied()) {
        anyhow::bail!("unexpected csv header: {:?}", headers);
    }

    let mut rows = Vec::new();
    for (i, record) in rdr.records().enumerate() {
        let record = record.with_context(|| format!("csv record {}", i + 1))?;
        let field = |idx: usize| -> Option<String> {
            record
                .get(idx)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        rows.push(FlatRow {
            name: field(0).unwrap_or_default(),
            slug: field(1).unwrap_or_default(),
            image_url: field(2),
            bedsize: field(3),
            artnum: field(4),
            dimensions: field(5),
        });
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(bedsize: Option<&str>, dims: Option<&str>) -> FlatRow {
        FlatRow {
            name: "Sofa".into(),
            slug: "sofa".into(),
            image_url: Some("/images/1a2b3c4d.png".into()),
            bedsize: bedsize.map(str::to_string),
            artnum: bedsize.map(|_| "A1".to_string()),
            dimensions: dims.map(str::to_string),
        }
    }

    #[test]
    fn header_only_for_no_rows() {
        assert_eq!(
            render_csv(&[]),
            "name,slug_item,hero_image_url,bedsize,artnum,dimensions"
        );
    }

    #[test]
    fn nulls_are_empty_and_values_quoted() {
        let out = render_csv(&[row(None, Some("W 200"))]);
        let lines: Vec<&str> = out.split('\n').collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1], r#""Sofa","sofa","/images/1a2b3c4d.png",,,"W 200""#);
        assert!(!out.ends_with('\n'));
    }

    #[test]
    fn inner_quotes_are_doubled() {
        let mut r = row(Some("160x200"), None);
        r.name = r#"Bed "Luna""#.into();
        let out = render_csv(&[r]);
        assert!(out.contains(r#""Bed ""Luna""""#), "{out}");
    }

    #[test]
    fn commas_and_newlines_survive_a_read_back() {
        let mut r = row(Some("160x200"), Some("W 160, L 200"));
        r.name = "Bed \"Luna\"\nKing".into();
        let rows = vec![r, row(None, None)];

        let parsed = read_csv(render_csv(&rows).as_bytes()).unwrap();
        assert_eq!(parsed, rows);
    }

    #[test]
    fn read_rejects_foreign_header() {
        assert!(read_csv("a,b,c\n1,2,3".as_bytes()).is_err());
    }

    #[test]
    fn write_csv_to_disk() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("out.csv");
        write_csv(&path, &[row(Some("90x200"), None)]).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("name,slug_item"));
        assert!(text.contains(r#""90x200","A1","#));
    }
}
