//! Markdown result tables.
//!
//! A results document holds one table per size subset:
//!
//! ```text
//! # Fama-MacBeth Risk Premia
//!
//! ## All Data
//!
//! | Factor | Risk Premium | t-stat (Newey-West) |
//! |--------|--------------|---------------------|
//! | **Intercept** | 1.234 | 4.567 |
//! ...
//! ```
//!
//! Documents can be rendered, parsed back, validated, and compared table by
//! table against another document such as a README.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

/// Factor labels every result table must contain.
pub const EXPECTED_FACTORS: [&str; 8] = [
    "Intercept",
    "inv",
    "log_bm",
    "log_mktcap",
    "momentum",
    "op",
    "ret_excess",
    "volatility",
];

/// Table header row.
pub const TABLE_HEADER: &str = "| Factor | Risk Premium | t-stat (Newey-West) |";

/// Table separator row.
pub const TABLE_SEPARATOR: &str = "|--------|--------------|---------------------|";

/// Errors that can occur while reading or checking result documents.
#[derive(Debug, Error)]
pub enum ReportError {
    /// A table line could not be parsed.
    #[error("line {line}: {reason}")]
    Malformed {
        /// 1-based line number
        line: usize,
        /// What was wrong
        reason: String,
    },

    /// A table does not have the expected shape or content.
    #[error("invalid table: {0}")]
    Invalid(String),

    /// A set that was asked for is not in the document.
    #[error("missing result set: {0}")]
    MissingSet(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// One factor row of a result table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PremiumRow {
    /// Factor label
    pub factor: String,
    /// Risk premium (percent per month)
    pub risk_premium: f64,
    /// Newey-West t-statistic
    pub t_stat_newey_west: f64,
    /// Cell text as read from a document
    #[serde(skip)]
    source: Option<[String; 3]>,
}

impl PartialEq for PremiumRow {
    fn eq(&self, other: &Self) -> bool {
        self.factor == other.factor
            && self.risk_premium == other.risk_premium
            && self.t_stat_newey_west == other.t_stat_newey_west
    }
}

impl PremiumRow {
    /// Create a row from computed values.
    pub fn new(factor: impl Into<String>, risk_premium: f64, t_stat_newey_west: f64) -> Self {
        Self {
            factor: factor.into(),
            risk_premium,
            t_stat_newey_west,
            source: None,
        }
    }

    /// Rendered table row; parsed rows keep their original cell text.
    pub fn to_markdown(&self) -> String {
        match &self.source {
            Some([factor, premium, t]) => format!("| {} | {} | {} |", factor, premium, t),
            None => format!(
                "| **{}** | {:.3} | {:.3} |",
                self.factor, self.risk_premium, self.t_stat_newey_west
            ),
        }
    }
}

/// A titled table of risk premia.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultSet {
    /// Heading above the table, e.g. `All Data`
    pub title: String,
    /// Factor rows
    pub rows: Vec<PremiumRow>,
}

impl ResultSet {
    /// Create a result set.
    pub fn new(title: impl Into<String>, rows: Vec<PremiumRow>) -> Self {
        Self {
            title: title.into(),
            rows,
        }
    }

    /// Row for one factor.
    pub fn row(&self, factor: &str) -> Option<&PremiumRow> {
        self.rows.iter().find(|r| r.factor == factor)
    }

    /// The table alone: header, separator and rows.
    pub fn table_markdown(&self) -> String {
        let mut output = String::new();
        output.push_str(TABLE_HEADER);
        output.push('\n');
        output.push_str(TABLE_SEPARATOR);
        output.push('\n');
        for row in &self.rows {
            output.push_str(&row.to_markdown());
            output.push('\n');
        }
        output
    }

    /// `## {title}` followed by the table.
    pub fn to_markdown(&self) -> String {
        format!("## {}\n\n{}", self.title, self.table_markdown())
    }
}

/// A document made of result sets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultDocument {
    /// Top-level heading
    pub title: String,
    /// Tables in document order
    pub sets: Vec<ResultSet>,
}

impl ResultDocument {
    /// Create an empty document.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            sets: Vec::new(),
        }
    }

    /// Append a result set.
    pub fn push(&mut self, set: ResultSet) {
        self.sets.push(set);
    }

    /// Set with the given title.
    pub fn set(&self, title: &str) -> Option<&ResultSet> {
        self.sets.iter().find(|s| s.title == title)
    }

    /// Like [`set`](Self::set) but an error when absent.
    pub fn require(&self, title: &str) -> Result<&ResultSet, ReportError> {
        self.set(title)
            .ok_or_else(|| ReportError::MissingSet(title.to_string()))
    }

    /// Render the whole document.
    pub fn to_markdown(&self) -> String {
        let mut output = String::new();
        if !self.title.is_empty() {
            output.push_str(&format!("# {}\n\n", self.title));
        }
        let sets: Vec<String> = self.sets.iter().map(ResultSet::to_markdown).collect();
        output.push_str(&sets.join("\n"));
        output
    }

    /// Validate every set.
    pub fn validate(&self) -> Result<(), ReportError> {
        if self.sets.is_empty() {
            return Err(ReportError::Invalid("document has no tables".to_string()));
        }
        self.sets.iter().try_for_each(validate)
    }

    /// Read and parse a document from disk.
    pub fn from_file(path: &Path) -> Result<Self, ReportError> {
        parse_document(&std::fs::read_to_string(path)?)
    }

    /// Write the rendered document to disk.
    pub fn write_file(&self, path: &Path) -> Result<(), ReportError> {
        std::fs::write(path, self.to_markdown())?;
        Ok(())
    }
}

fn split_cells(line: &str) -> Vec<&str> {
    let inner = line.trim();
    let inner = inner.strip_prefix('|').unwrap_or(inner);
    let inner = inner.strip_suffix('|').unwrap_or(inner);
    inner.split('|').map(str::trim).collect()
}

fn is_separator(cells: &[&str]) -> bool {
    cells.iter().all(|c| {
        let body = c.trim_matches(':');
        !body.is_empty() && body.chars().all(|ch| ch == '-')
    })
}

fn strip_bold(cell: &str) -> &str {
    cell.strip_prefix("**")
        .and_then(|c| c.strip_suffix("**"))
        .unwrap_or(cell)
        .trim()
}

fn parse_number(cell: &str, line: usize, column: &str) -> Result<f64, ReportError> {
    strip_bold(cell)
        .parse::<f64>()
        .map_err(|_| ReportError::Malformed {
            line,
            reason: format!("{} is not a number: {:?}", column, cell),
        })
}

/// Table being read.
struct PendingTable {
    title: String,
    header_line: usize,
    seen_separator: bool,
    rows: Vec<PremiumRow>,
}

/// Parse a Markdown document into result sets.
///
/// Headings set the title of the tables below them; the first level-one
/// heading before any table is the document title. Tables whose header is
/// not [`TABLE_HEADER`] are skipped.
pub fn parse_document(text: &str) -> Result<ResultDocument, ReportError> {
    let expected_header = split_cells(TABLE_HEADER);
    let mut document = ResultDocument::default();
    let mut heading = String::new();
    let mut pending: Option<PendingTable> = None;
    let mut skipping = false;

    let finish = |pending: Option<PendingTable>, document: &mut ResultDocument| {
        if let Some(table) = pending {
            if !table.seen_separator {
                return Err(ReportError::Malformed {
                    line: table.header_line,
                    reason: "table has no separator row".to_string(),
                });
            }
            document.push(ResultSet::new(table.title, table.rows));
        }
        Ok(())
    };

    for (idx, raw) in text.lines().enumerate() {
        let line = idx + 1;
        let trimmed = raw.trim();

        if !trimmed.starts_with('|') {
            finish(pending.take(), &mut document)?;
            skipping = false;
            if let Some(rest) = trimmed.strip_prefix('#') {
                let level = 1 + rest.chars().take_while(|&c| c == '#').count();
                let text = rest.trim_start_matches('#').trim().to_string();
                if level == 1 && document.title.is_empty() && document.sets.is_empty() {
                    document.title = text.clone();
                }
                heading = text;
            }
            continue;
        }

        if skipping {
            continue;
        }
        let cells = split_cells(trimmed);
        if pending.is_none() {
            if cells != expected_header {
                skipping = true;
                continue;
            }
            pending = Some(PendingTable {
                title: heading.clone(),
                header_line: line,
                seen_separator: false,
                rows: Vec::new(),
            });
            continue;
        }
        let Some(table) = pending.as_mut() else {
            continue;
        };

        if !table.seen_separator {
            if !is_separator(&cells) {
                return Err(ReportError::Malformed {
                    line,
                    reason: "expected a separator row of dashes".to_string(),
                });
            }
            table.seen_separator = true;
            continue;
        }

        let [factor, premium, t_stat] = cells.as_slice() else {
            return Err(ReportError::Malformed {
                line,
                reason: format!("expected 3 cells, found {}", cells.len()),
            });
        };
        table.rows.push(PremiumRow {
            factor: strip_bold(factor).to_string(),
            risk_premium: parse_number(premium, line, "risk premium")?,
            t_stat_newey_west: parse_number(t_stat, line, "t-statistic")?,
            source: Some([factor.to_string(), premium.to_string(), t_stat.to_string()]),
        });
    }
    finish(pending, &mut document)?;

    Ok(document)
}

/// Whether `cell` is written with exactly three decimals, e.g. `-0.125`.
fn is_three_decimals(cell: &str) -> bool {
    let digits = cell.strip_prefix('-').unwrap_or(cell);
    match digits.split_once('.') {
        Some((int, frac)) => {
            !int.is_empty()
                && int.chars().all(|c| c.is_ascii_digit())
                && frac.len() == 3
                && frac.chars().all(|c| c.is_ascii_digit())
        }
        None => false,
    }
}

/// Check a table: eight rows, the expected factor labels once each, finite
/// numbers, and three-decimal cells for tables read from text.
pub fn validate(set: &ResultSet) -> Result<(), ReportError> {
    let invalid = |reason: String| Err(ReportError::Invalid(format!("{}: {}", set.title, reason)));

    if set.rows.len() != EXPECTED_FACTORS.len() {
        return invalid(format!(
            "expected {} rows, found {}",
            EXPECTED_FACTORS.len(),
            set.rows.len()
        ));
    }

    let mut seen = HashSet::new();
    for row in &set.rows {
        if !EXPECTED_FACTORS.contains(&row.factor.as_str()) {
            return invalid(format!("unexpected factor {:?}", row.factor));
        }
        if !seen.insert(row.factor.as_str()) {
            return invalid(format!("duplicate factor {:?}", row.factor));
        }
        if !(row.risk_premium.is_finite() && row.t_stat_newey_west.is_finite()) {
            return invalid(format!("non-finite value for {}", row.factor));
        }
        if let Some([_, premium, t_stat]) = &row.source {
            if !(is_three_decimals(premium) && is_three_decimals(t_stat)) {
                return invalid(format!(
                    "{} values must have three decimals, found {} and {}",
                    row.factor, premium, t_stat
                ));
            }
        }
    }
    Ok(())
}

/// Whether two tables render to identical text.
pub fn tables_match(a: &ResultSet, b: &ResultSet) -> bool {
    a.table_markdown() == b.table_markdown()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn sample_set(title: &str) -> ResultSet {
        let rows = EXPECTED_FACTORS
            .iter()
            .enumerate()
            .map(|(i, f)| PremiumRow::new(*f, i as f64 * 0.25 - 0.5, 1.5 - i as f64 * 0.25))
            .collect();
        ResultSet::new(title, rows)
    }

    #[test]
    fn test_row_rendering() {
        let row = PremiumRow::new("log_bm", 0.12345, -2.0);
        assert_eq!(row.to_markdown(), "| **log_bm** | 0.123 | -2.000 |");
    }

    #[test]
    fn test_set_rendering() {
        let markdown = sample_set("All Data").to_markdown();
        let lines: Vec<&str> = markdown.lines().collect();
        assert_eq!(lines[0], "## All Data");
        assert_eq!(lines[1], "");
        assert_eq!(lines[2], TABLE_HEADER);
        assert_eq!(lines[3], TABLE_SEPARATOR);
        assert_eq!(lines[4], "| **Intercept** | -0.500 | 1.500 |");
        assert_eq!(lines.len(), 12);
    }

    #[test]
    fn test_parse_rendered_document() {
        let mut doc = ResultDocument::new("Risk Premia");
        for title in ["All Data", "Micro Caps", "Small Caps", "Large Caps"] {
            doc.push(sample_set(title));
        }
        let parsed = parse_document(&doc.to_markdown()).unwrap();

        assert_eq!(parsed.title, "Risk Premia");
        assert_eq!(parsed.sets.len(), 4);
        assert_eq!(parsed, doc);
        assert!(parsed.validate().is_ok());
        assert_eq!(parsed.to_markdown(), doc.to_markdown());
        assert!(tables_match(parsed.require("Small Caps").unwrap(), &doc.sets[2]));
    }

    #[test]
    fn test_parse_reports_line_numbers() {
        let text = "## All Data\n\n| Factor | Risk Premium | t-stat (Newey-West) |\n|---|---|---|\n| **op** | abc | 1.000 |\n";
        match parse_document(text) {
            Err(ReportError::Malformed { line, .. }) => assert_eq!(line, 5),
            other => panic!("expected malformed error, got {:?}", other),
        }
    }

    #[rstest]
    #[case("| Factor | Risk Premium | t-stat (Newey-West) |\n| x | y | z |\n")]
    #[case("| Factor | Risk Premium | t-stat (Newey-West) |\n")]
    #[case("| Factor | Risk Premium | t-stat (Newey-West) |\n|---|---|---|\n| **op** | 1.000 |\n")]
    fn test_malformed_tables(#[case] text: &str) {
        assert!(matches!(
            parse_document(text),
            Err(ReportError::Malformed { .. })
        ));
    }

    #[test]
    fn test_unrelated_tables_are_skipped() {
        let results = sample_set("All Data").table_markdown();
        let text = format!(
            "# premia\n\n## Commands\n\n| Command | Purpose |\n|---|---|\n| `run` | estimate |\n\n## All Data\n\n{}\n## Data\n\n| a | b | c |\n| x | y | z |\n",
            results
        );
        let parsed = parse_document(&text).unwrap();
        assert_eq!(parsed.sets.len(), 1);
        assert_eq!(parsed.sets[0].title, "All Data");
        assert!(tables_match(&parsed.sets[0], &sample_set("All Data")));

        let unrelated = parse_document("| a | b |\n|---|---|\n| 1 | 2 |\n").unwrap();
        assert!(unrelated.sets.is_empty());
    }

    #[test]
    fn test_validate_row_count() {
        let mut set = sample_set("Large Caps");
        set.rows.pop();
        assert!(validate(&set).is_err());
    }

    #[test]
    fn test_validate_labels() {
        let mut set = sample_set("Large Caps");
        set.rows[3].factor = "beta".to_string();
        assert!(validate(&set).is_err());

        let mut set = sample_set("Large Caps");
        set.rows[3].factor = "op".to_string();
        assert!(validate(&set).is_err());
    }

    #[test]
    fn test_validate_three_decimals() {
        let mut text = sample_set("All Data").to_markdown();
        text = text.replace("| -0.500 |", "| -0.5 |");
        let doc = parse_document(&text).unwrap();
        assert!(validate(&doc.sets[0]).is_err());
    }

    #[rstest]
    #[case("0.123", true)]
    #[case("-12.000", true)]
    #[case("1.23", false)]
    #[case("1.2345", false)]
    #[case(".123", false)]
    #[case("1e3", false)]
    fn test_is_three_decimals(#[case] cell: &str, #[case] expected: bool) {
        assert_eq!(is_three_decimals(cell), expected);
    }

    #[test]
    fn test_tables_match_is_textual() {
        let a = sample_set("All Data");
        let mut b = sample_set("README");
        assert!(tables_match(&a, &b));
        b.rows[0].risk_premium += 0.001;
        assert!(!tables_match(&a, &b));
    }

    #[test]
    fn test_missing_set() {
        let doc = ResultDocument::new("empty");
        assert!(matches!(doc.require("All Data"), Err(ReportError::MissingSet(_))));
        assert!(doc.validate().is_err());
    }
}
