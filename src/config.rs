// ⚙️ Pipeline Configuration
// Column labels and text rules, loadable from a TOML file

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Labels of the source spreadsheet columns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnLabels {
    pub id: String,
    pub category: String,
    pub name: String,
    pub practitioners: String,
    pub price: String,
    pub duration: String,
    pub note: String,
    pub branches: String,
}

impl Default for ColumnLabels {
    fn default() -> Self {
        ColumnLabels {
            id: "ID".to_string(),
            category: "Category".to_string(),
            name: "Service Name".to_string(),
            practitioners: "Doctor name".to_string(),
            price: "Price".to_string(),
            duration: "Duration".to_string(),
            note: "Note".to_string(),
            branches: "Available In Branches".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Locale code populated in every i18n map
    pub locale: String,

    pub columns: ColumnLabels,

    /// Single-line names longer than this (in characters) get split
    pub description_threshold: usize,

    /// Prefix of descriptions built from extra name lines
    pub includes_prefix: String,

    /// Joins extra name lines inside a description
    pub description_separator: String,

    /// Sentence added to the price note when a price excludes VAT
    pub vat_note: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            locale: "en".to_string(),
            columns: ColumnLabels::default(),
            description_threshold: 100,
            includes_prefix: "Includes: ".to_string(),
            description_separator: ", ".to_string(),
            vat_note: "Price excludes VAT".to_string(),
        }
    }
}

impl PipelineConfig {
    /// Load config from a TOML file; absent keys keep their defaults
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path.as_ref()))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: PipelineConfig = toml::from_str(content)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_source_sheet() {
        let config = PipelineConfig::default();
        assert_eq!(config.locale, "en");
        assert_eq!(config.columns.practitioners, "Doctor name");
        assert_eq!(config.columns.branches, "Available In Branches");
        assert_eq!(config.description_threshold, 100);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = PipelineConfig::from_toml_str(
            r#"
            vat_note = "VAT not included"

            [columns]
            practitioners = "Practitioners"
            "#,
        )
        .unwrap();

        assert_eq!(config.vat_note, "VAT not included");
        assert_eq!(config.columns.practitioners, "Practitioners");
        assert_eq!(config.columns.category, "Category");
        assert_eq!(config.includes_prefix, "Includes: ");
    }

    #[test]
    fn test_invalid_toml_is_error() {
        assert!(PipelineConfig::from_toml_str("description_threshold = \"long\"").is_err());
    }

    #[test]
    fn test_missing_file_is_error() {
        let result = PipelineConfig::from_file("/nonexistent/pipeline.toml");
        assert!(result.is_err());
    }
}
