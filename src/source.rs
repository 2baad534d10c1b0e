// 📥 Row Sources - Spreadsheet exports and the remote category snapshot
//
// The only module that reads input files. Everything it returns is plain
// data handed to the pipeline.

use crate::parser::RawRow;
use crate::reconciliation::RemoteCategory;
use anyhow::{Context, Result};
use csv::ReaderBuilder;
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Anything that can supply ordered spreadsheet rows
pub trait RowSource {
    fn rows(&self) -> Result<Vec<RawRow>>;

    /// Human label for logs
    fn describe(&self) -> String;
}

// ============================================================================
// CSV EXPORT
// ============================================================================

pub struct CsvRowSource {
    path: PathBuf,
    id_column: String,
}

impl CsvRowSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        CsvRowSource {
            path: path.as_ref().to_path_buf(),
            id_column: "ID".to_string(),
        }
    }

    /// Column whose value "ID" marks a repeated header row
    pub fn with_id_column(mut self, label: &str) -> Self {
        self.id_column = label.to_string();
        self
    }
}

impl RowSource for CsvRowSource {
    fn rows(&self) -> Result<Vec<RawRow>> {
        let file = File::open(&self.path)
            .with_context(|| format!("Failed to open file: {}", self.path.display()))?;

        read_csv_rows(file, &self.id_column)
            .with_context(|| format!("Failed to read CSV: {}", self.path.display()))
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Parse a headered CSV stream into rows.
///
/// Quoted cells may span lines. A first data row repeating the header
/// (ID column == "ID") is skipped.
pub fn read_csv_rows<R: Read>(reader: R, id_column: &str) -> Result<Vec<RawRow>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = reader
        .headers()
        .context("Failed to read CSV header")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();

    for (index, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("Failed to parse CSV record {}", index + 1))?;

        let line_number = record
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(index + 2);

        let cells: HashMap<String, String> = headers
            .iter()
            .zip(record.iter())
            .map(|(h, v)| (h.clone(), v.to_string()))
            .collect();

        let row = RawRow::new(line_number, cells);

        if index == 0 && row.get(id_column).trim() == "ID" {
            log::debug!("Skipping repeated header row at line {}", line_number);
            continue;
        }

        rows.push(row);
    }

    log::info!("Read {} rows from CSV", rows.len());
    Ok(rows)
}

// ============================================================================
// REMOTE SNAPSHOT
// ============================================================================

/// Load the remote category list from a JSON array file.
/// A missing file yields an empty snapshot: every category will be new.
pub fn load_remote_snapshot<P: AsRef<Path>>(path: P) -> Result<Vec<RemoteCategory>> {
    let path = path.as_ref();

    if !path.exists() {
        log::warn!(
            "Remote snapshot {} not found, reconciling against an empty list",
            path.display()
        );
        return Ok(Vec::new());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read remote snapshot: {}", path.display()))?;

    let remote: Vec<RemoteCategory> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse remote snapshot: {}", path.display()))?;

    log::info!("Loaded {} remote categories from {}", remote.len(), path.display());
    Ok(remote)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const HEADER: &str =
        "ID,Category,Service Name,Doctor name,Price,Duration,Note,Available In Branches\n";

    #[test]
    fn test_read_rows_with_multiline_cells() {
        let csv = format!(
            "{}{}{}",
            HEADER,
            "1,Botox,\"Full face\nForehead\nCrow's feet\",\"Dr.Anna Zakhozha\nDr. Sarah Mohamed\",",
            "500 + VAT,30 min,,Both\n2,Fillers,Lips,,1200,1 hour,,SRZ\n"
        );
        let rows = read_csv_rows(csv.as_bytes(), "ID").unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("Category"), "Botox");
        assert_eq!(rows[0].get("Service Name"), "Full face\nForehead\nCrow's feet");
        assert_eq!(rows[0].line_number, 2);
        // Record 1 spans several physical lines
        assert!(rows[1].line_number > rows[0].line_number + 1);
        assert_eq!(rows[1].get("Available In Branches"), "SRZ");
    }

    #[test]
    fn test_repeated_header_row_skipped() {
        let csv = format!("{}{}3,Laser,Hair removal,,,45 min,,\n", HEADER, HEADER);
        let rows = read_csv_rows(csv.as_bytes(), "ID").unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("Category"), "Laser");
    }

    #[test]
    fn test_headers_trimmed_and_missing_columns_blank() {
        let csv = " ID , Category ,Service Name\n1,Botox,Forehead\n";
        let rows = read_csv_rows(csv.as_bytes(), "ID").unwrap();

        assert_eq!(rows[0].get("Category"), "Botox");
        assert_eq!(rows[0].get("Duration"), "");
    }

    #[test]
    fn test_csv_row_source_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}1,Botox,Forehead,,,30 min,,\n", HEADER).unwrap();

        let source = CsvRowSource::new(file.path());
        let rows = source.rows().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(source.describe(), file.path().display().to_string());
    }

    #[test]
    fn test_missing_csv_is_an_error() {
        let source = CsvRowSource::new("/nonexistent/services.csv");
        assert!(source.rows().is_err());
    }

    #[test]
    fn test_load_remote_snapshot() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"id": 5, "name": "BOTOX"}},
                {{"id": 9, "name_i18n": {{"en": "Laser"}}, "is_archived": true}}]"#
        )
        .unwrap();

        let remote = load_remote_snapshot(file.path()).unwrap();
        assert_eq!(remote.len(), 2);
        assert_eq!(remote[1].name, "Laser");
        assert!(remote[1].is_archived);
    }

    #[test]
    fn test_missing_remote_snapshot_is_empty() {
        let remote = load_remote_snapshot("/nonexistent/remote.json").unwrap();
        assert!(remote.is_empty());
    }

    #[test]
    fn test_malformed_remote_snapshot_is_an_error() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(load_remote_snapshot(file.path()).is_err());
    }
}
