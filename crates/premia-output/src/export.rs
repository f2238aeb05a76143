//! Export functionality for result tables.
//!
//! Result sets and documents can be written as CSV, JSON or Markdown.

use crate::report::{ResultDocument, ResultSet};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur during export operations.
#[derive(Debug, Error)]
pub enum ExportError {
    /// CSV serialization error.
    #[error("CSV serialization error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization error.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid format error.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

/// Export format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExportFormat {
    /// Comma-separated values format.
    Csv,

    /// Compact JSON format.
    Json,

    /// Pretty-printed JSON format.
    PrettyJson,

    /// Markdown tables.
    #[default]
    Markdown,
}

impl ExportFormat {
    /// Get the file extension for this format.
    pub const fn extension(&self) -> &str {
        match self {
            Self::Csv => "csv",
            Self::Json | Self::PrettyJson => "json",
            Self::Markdown => "md",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            "pretty-json" | "pretty_json" => Ok(Self::PrettyJson),
            "markdown" | "md" => Ok(Self::Markdown),
            other => Err(ExportError::InvalidFormat(other.to_string())),
        }
    }
}

/// Flattened result row for CSV export.
#[derive(Debug, Serialize)]
struct PremiumRecord<'a> {
    set: &'a str,
    factor: &'a str,
    risk_premium: f64,
    t_stat_newey_west: f64,
}

fn csv_string<'a>(records: impl IntoIterator<Item = PremiumRecord<'a>>) -> Result<String, ExportError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    for record in records {
        wtr.serialize(&record)?;
    }
    let bytes = wtr.into_inner().map_err(|e| e.into_error())?;
    String::from_utf8(bytes).map_err(|e| ExportError::InvalidFormat(e.to_string()))
}

fn records(set: &ResultSet) -> impl Iterator<Item = PremiumRecord<'_>> {
    set.rows.iter().map(move |row| PremiumRecord {
        set: &set.title,
        factor: &row.factor,
        risk_premium: row.risk_premium,
        t_stat_newey_west: row.t_stat_newey_west,
    })
}

/// Trait for exporting data in various formats.
pub trait Exporter {
    /// Export data to a string in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError>;

    /// Export data to a file in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or file writing fails.
    fn export_to_file(&self, path: &Path, format: ExportFormat) -> Result<(), ExportError> {
        let content = self.export_to_string(format)?;
        let mut file = File::create(path)?;
        file.write_all(content.as_bytes())?;
        Ok(())
    }
}

impl Exporter for ResultSet {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => csv_string(records(self)),
            ExportFormat::Json => Ok(serde_json::to_string(self)?),
            ExportFormat::PrettyJson => Ok(serde_json::to_string_pretty(self)?),
            ExportFormat::Markdown => Ok(self.to_markdown()),
        }
    }
}

impl Exporter for ResultDocument {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => csv_string(self.sets.iter().flat_map(records)),
            ExportFormat::Json => Ok(serde_json::to_string(self)?),
            ExportFormat::PrettyJson => Ok(serde_json::to_string_pretty(self)?),
            ExportFormat::Markdown => Ok(self.to_markdown()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::PremiumRow;
    use rstest::rstest;

    fn sample() -> ResultSet {
        ResultSet::new(
            "All Data",
            vec![
                PremiumRow::new("Intercept", 1.25, 3.5),
                PremiumRow::new("op", 0.125, -2.25),
            ],
        )
    }

    #[test]
    fn test_result_set_csv() {
        let csv = sample().export_to_string(ExportFormat::Csv).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "set,factor,risk_premium,t_stat_newey_west");
        assert_eq!(lines[1], "All Data,Intercept,1.25,3.5");
        assert_eq!(lines[2], "All Data,op,0.125,-2.25");
    }

    #[test]
    fn test_result_set_json() {
        let json = sample().export_to_string(ExportFormat::Json).unwrap();
        assert!(json.contains("\"All Data\""));
        assert!(json.contains("\"t_stat_newey_west\":-2.25"));

        let pretty = sample().export_to_string(ExportFormat::PrettyJson).unwrap();
        assert!(pretty.contains("  "));
        let back: ResultSet = serde_json::from_str(&pretty).unwrap();
        assert_eq!(back, sample());
    }

    #[test]
    fn test_document_csv_has_every_set() {
        let mut doc = ResultDocument::new("Premia");
        doc.push(sample());
        let mut micro = sample();
        micro.title = "Micro Caps".to_string();
        doc.push(micro);

        let csv = doc.export_to_string(ExportFormat::Csv).unwrap();
        assert_eq!(csv.lines().count(), 5);
        assert!(csv.contains("Micro Caps,op,0.125,-2.25"));
    }

    #[test]
    fn test_markdown_export() {
        let markdown = sample().export_to_string(ExportFormat::Markdown).unwrap();
        assert!(markdown.starts_with("## All Data"));
        assert!(markdown.contains("| **op** | 0.125 | -2.250 |"));
    }

    #[test]
    fn test_export_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(format!("premia.{}", ExportFormat::Json.extension()));
        sample().export_to_file(&path, ExportFormat::Json).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("Intercept"));
    }

    #[rstest]
    #[case("csv", ExportFormat::Csv)]
    #[case("JSON", ExportFormat::Json)]
    #[case("pretty-json", ExportFormat::PrettyJson)]
    #[case("md", ExportFormat::Markdown)]
    fn test_parse_format(#[case] input: &str, #[case] expected: ExportFormat) {
        assert_eq!(input.parse::<ExportFormat>().unwrap(), expected);
    }

    #[test]
    fn test_unknown_format() {
        assert!(matches!(
            "xml".parse::<ExportFormat>(),
            Err(ExportError::InvalidFormat(_))
        ));
    }
}
