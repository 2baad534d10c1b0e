// 🏗️ Record Extractor
// One raw sheet row → one typed IntermediateRecord. No cross-row state,
// so rows can be extracted independently.

use crate::config::PipelineConfig;
use crate::entities::Branch;
use crate::error::{PipelineError, RowError};
use crate::normalize::{canonical_practitioner_name, collapse_whitespace};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::sync::OnceLock;

// ============================================================================
// CORE TYPES
// ============================================================================

/// RawRow - one spreadsheet row as column label → cell text
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRow {
    /// Position in the source (1-based, header counted)
    pub line_number: usize,
    pub cells: HashMap<String, String>,
}

impl RawRow {
    pub fn new(line_number: usize, cells: HashMap<String, String>) -> Self {
        RawRow { line_number, cells }
    }

    /// Builder used by tests and the API server
    pub fn from_pairs(line_number: usize, pairs: &[(&str, &str)]) -> Self {
        let cells = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        RawRow { line_number, cells }
    }

    /// Cell text; a missing column reads as ""
    pub fn get(&self, label: &str) -> &str {
        self.cells.get(label).map(String::as_str).unwrap_or("")
    }
}

/// Parsed price column
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceQuote {
    /// None for an empty cell or a zero price
    pub amount: Option<f64>,
    /// Source carried a "+VAT" marker
    pub excludes_vat: bool,
}

/// IntermediateRecord - Extractor output, consumed by the Collector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntermediateRecord {
    pub line_number: usize,
    pub category: String,
    pub name: String,
    pub description: Option<String>,
    pub practitioners: Vec<String>,
    pub price: PriceQuote,
    pub duration_minutes: u32,
    pub note: Option<String>,
    pub branches: BTreeSet<Branch>,
}

/// Records that passed validation plus the rows that did not
#[derive(Debug, Default)]
pub struct ExtractionBatch {
    pub records: Vec<IntermediateRecord>,
    pub errors: Vec<PipelineError>,
}

// ============================================================================
// RECORD EXTRACTOR
// ============================================================================

pub struct RecordExtractor {
    config: PipelineConfig,
}

impl RecordExtractor {
    pub fn new(config: PipelineConfig) -> Self {
        RecordExtractor { config }
    }

    /// Extract one row; blank category/name or a bad duration rejects it
    pub fn extract(&self, row: &RawRow) -> Result<IntermediateRecord, RowError> {
        let columns = &self.config.columns;

        let category = collapse_whitespace(row.get(&columns.category));
        if category.is_empty() {
            return Err(RowError::MissingField {
                column: columns.category.clone(),
            });
        }

        let (name, description) = split_service_name(row.get(&columns.name), &self.config);
        if name.is_empty() {
            return Err(RowError::MissingField {
                column: columns.name.clone(),
            });
        }

        let duration_minutes = parse_duration(row.get(&columns.duration))?;

        let note = row.get(&columns.note).trim();

        Ok(IntermediateRecord {
            line_number: row.line_number,
            category,
            name,
            description,
            practitioners: parse_practitioners(row.get(&columns.practitioners)),
            price: parse_price(row.get(&columns.price)),
            duration_minutes,
            note: (!note.is_empty()).then(|| note.to_string()),
            branches: parse_branches(row.get(&columns.branches)),
        })
    }

    /// Extract every row; a bad row is listed and skipped, never fatal
    pub fn extract_all(&self, rows: &[RawRow]) -> ExtractionBatch {
        let mut batch = ExtractionBatch::default();

        for row in rows {
            match self.extract(row) {
                Ok(record) => batch.records.push(record),
                Err(reason) => {
                    log::warn!("Skipping row {}: {}", row.line_number, reason);
                    batch.errors.push(PipelineError::row(row.line_number, reason));
                }
            }
        }

        log::info!(
            "Extracted {} records ({} rows rejected)",
            batch.records.len(),
            batch.errors.len()
        );
        batch
    }
}

// ============================================================================
// CELL PARSERS
// ============================================================================

/// Split the service-name cell into (name, description)
///
/// - multi-line: first line is the name, the rest become "Includes: a, b"
/// - single line with a trailing "(...)": the parenthetical is the description
/// - single line over the threshold: split at the first ": ", " - ", " – " or ". "
/// - otherwise the whole line is the name
pub fn split_service_name(cell: &str, config: &PipelineConfig) -> (String, Option<String>) {
    let lines: Vec<String> = cell
        .lines()
        .map(collapse_whitespace)
        .filter(|l| !l.is_empty())
        .collect();

    match lines.as_slice() {
        [] => (String::new(), None),
        [single] => split_single_line(single, config.description_threshold),
        [first, rest @ ..] => {
            let description = format!(
                "{}{}",
                config.includes_prefix,
                rest.join(config.description_separator.as_str())
            );
            (first.clone(), Some(description))
        }
    }
}

fn split_single_line(line: &str, threshold: usize) -> (String, Option<String>) {
    if let Some((head, inner)) = split_trailing_parenthetical(line) {
        return (head, Some(inner));
    }

    if line.chars().count() > threshold {
        let split_at = [": ", " - ", " – ", ". "]
            .iter()
            .filter_map(|delim| line.find(delim).map(|pos| (pos, delim.len())))
            .min_by_key(|(pos, _)| *pos);

        if let Some((pos, len)) = split_at {
            let head = line[..pos].trim();
            let tail = line[pos + len..].trim();
            if !head.is_empty() && !tail.is_empty() {
                return (head.to_string(), Some(tail.to_string()));
            }
        }
    }

    (line.to_string(), None)
}

/// "Botox (forehead, frown lines)" → ("Botox", "forehead, frown lines")
fn split_trailing_parenthetical(line: &str) -> Option<(String, String)> {
    let body = line.strip_suffix(')')?;

    // Walk back to the matching "("
    let mut depth = 0usize;
    for (pos, ch) in body.char_indices().rev() {
        match ch {
            ')' => depth += 1,
            '(' if depth == 0 => {
                let head = body[..pos].trim();
                let inner = body[pos + 1..].trim();
                if head.is_empty() || inner.is_empty() {
                    return None;
                }
                return Some((head.to_string(), inner.to_string()));
            }
            '(' => depth -= 1,
            _ => {}
        }
    }

    None
}

/// One practitioner per line. Commas are part of names, never separators.
pub fn parse_practitioners(cell: &str) -> Vec<String> {
    cell.lines()
        .map(canonical_practitioner_name)
        .filter(|name| !name.is_empty())
        .collect()
}

fn vat_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\s*\+?\s*\bvat\b").expect("invalid vat regex"))
}

fn currency_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\baed\b|[$€£]").expect("invalid currency regex"))
}

fn amount_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d[\d,]*(?:\.\d+)?").expect("invalid amount regex"))
}

/// "500 + VAT" → 500 with the VAT flag; "0" and "" → no price
pub fn parse_price(cell: &str) -> PriceQuote {
    let cell = cell.trim();
    if cell.is_empty() {
        return PriceQuote::default();
    }

    let excludes_vat = vat_re().is_match(cell);
    let stripped = vat_re().replace_all(cell, "");
    let stripped = currency_re().replace_all(&stripped, "");

    let amount = amount_re()
        .find(&stripped)
        .and_then(|m| m.as_str().replace(',', "").parse::<f64>().ok())
        .filter(|value| *value > 0.0);

    PriceQuote {
        amount,
        excludes_vat,
    }
}

fn duration_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^(\d+(?:\.\d+)?)\s*(minutes?|mins?|hours?|hrs?)$")
            .expect("invalid duration regex")
    })
}

/// "75 min" → 75, "1 hour" → 60, "1.5 hours" → 90, "45" → 45
pub fn parse_duration(cell: &str) -> Result<u32, RowError> {
    let cell = collapse_whitespace(cell);
    if cell.is_empty() {
        return Err(RowError::MissingDuration);
    }

    let unrecognized = || RowError::UnrecognizedDuration {
        value: cell.clone(),
    };

    // Bare number = minutes
    if cell.chars().all(|c| c.is_ascii_digit()) {
        return cell.parse::<u32>().map_err(|_| unrecognized());
    }

    let caps = duration_re().captures(&cell).ok_or_else(unrecognized)?;
    let value: f64 = caps[1].parse().map_err(|_| unrecognized())?;
    let unit = caps[2].to_lowercase();

    let minutes = if unit.starts_with('h') {
        value * 60.0
    } else {
        value
    };

    let minutes = minutes.round();
    if !minutes.is_finite() || minutes > u32::MAX as f64 {
        return Err(unrecognized());
    }

    Ok(minutes as u32)
}

/// "Both"/blank/unknown → both branches; "SRZ" → {srz}; "Jumeirah" → {jumeirah}
pub fn parse_branches(cell: &str) -> BTreeSet<Branch> {
    let value = cell.trim().to_lowercase();

    match value.as_str() {
        "jumeirah" => [Branch::Jumeirah].into_iter().collect(),
        "srz" | "szr" => [Branch::Srz].into_iter().collect(),
        "both" | "" => Branch::all(),
        other => {
            log::debug!("Unknown branch '{}', defaulting to both", other);
            Branch::all()
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
