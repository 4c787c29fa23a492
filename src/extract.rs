//! Key/value extraction from the HTML dump of a diagnostic report.
//!
//! The report has no ids or classes to anchor on; the values live in an
//! otherwise unlabeled table whose rows are exactly two `<td>` cells wide.

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

use crate::error::{Result, SyncError};
use crate::types::{ExtractedRecord, Field};

// Constant selectors; parse cannot fail on these.
static ROW_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("tr").unwrap());
static CELL_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("td").unwrap());

/// Device prefix used by the real report labels ("MCM VIN", "MCM version", ...).
pub const DEFAULT_LABEL_PREFIX: &str = "MCM";

#[derive(Debug, Clone, Default)]
pub struct FieldExtractor {
    label_prefix: Option<String>,
}

impl FieldExtractor {
    /// Matches bare canonical labels only ("VIN", "diagnosis version").
    pub fn new() -> Self {
        Self::default()
    }

    /// Also matches `"<prefix> <canonical label>"`. Blank prefixes are ignored.
    pub fn with_prefix(prefix: &str) -> Self {
        let prefix = prefix.trim();
        Self {
            label_prefix: (!prefix.is_empty()).then(|| prefix.to_string()),
        }
    }

    /// Map a report label to the field it names, if any.
    pub fn resolve_key(&self, key: &str) -> Option<Field> {
        let bare = match &self.label_prefix {
            Some(prefix) => key
                .strip_prefix(prefix.as_str())
                .and_then(|rest| rest.strip_prefix(' '))
                .unwrap_or(key),
            None => key,
        };
        Field::DOCUMENT
            .into_iter()
            .find(|f| f.canonical_name() == bare)
    }

    pub fn extract_file(&self, path: &Path) -> Result<ExtractedRecord> {
        let html = std::fs::read_to_string(path).map_err(|source| SyncError::DocumentRead {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("read report {} ({} bytes)", path.display(), html.len());
        Ok(self.extract_str(&html))
    }

    pub fn extract_str(&self, html: &str) -> ExtractedRecord {
        let document = Html::parse_document(html);
        let mut values: BTreeMap<Field, Option<String>> = BTreeMap::new();

        for row in document.select(&ROW_SELECTOR) {
            let cells: Vec<ElementRef> = row.select(&CELL_SELECTOR).collect();
            if cells.len() != 2 {
                continue;
            }
            let key = cell_text(&cells[0]);
            let Some(field) = self.resolve_key(&key) else {
                continue;
            };
            let mut value = cell_text(&cells[1]);
            if field == Field::DiagnosisVersion {
                value = strip_leading_zeros(&value).to_string();
            }
            // Later rows overwrite earlier ones.
            values.insert(field, Some(value));
        }

        let record = ExtractedRecord::from_values(values);
        for (field, value) in record.iter() {
            info!("{}: {}", field, value.unwrap_or("<absent>"));
        }
        record
    }
}

/// Extract with the bare canonical labels plus the stock `MCM` prefix.
pub fn extract_report(path: &Path) -> Result<ExtractedRecord> {
    FieldExtractor::with_prefix(DEFAULT_LABEL_PREFIX).extract_file(path)
}

/// Cell text with each text node trimmed and empty pieces dropped.
fn cell_text(cell: &ElementRef) -> String {
    cell.text().map(str::trim).filter(|s| !s.is_empty()).collect()
}

/// "007" -> "7"; an all-zero value becomes empty.
pub fn strip_leading_zeros(value: &str) -> &str {
    value.trim_start_matches('0')
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const REPORT: &str = r#"
        <html><body>
        <h1>Diagnostic report</h1>
        <table>
          <tr><th>Module</th><th>Info</th></tr>
          <tr><td>MCM hardware class</td><td> HW-42 </td></tr>
          <tr><td>MCM version</td><td>12.3</td></tr>
          <tr><td>MCM diagnosis version</td><td>0070</td></tr>
          <tr><td>MCM VIN</td><td>1FUJGLDR<b>12345</b></td></tr>
          <tr><td>MCM serial number</td><td>SN-9</td></tr>
          <tr><td>MCM hardware part number</td><td>A0004460535</td></tr>
          <tr><td>MCM certification</td><td>EPA10</td></tr>
          <tr><td>MCM hardware version</td><td>3</td></tr>
          <tr><td>ACM version</td><td>99</td></tr>
          <tr><td>one</td><td>two</td><td>three</td></tr>
        </table>
        </body></html>
    "#;

    #[test]
    fn test_extracts_prefixed_report() {
        let record = FieldExtractor::with_prefix("MCM").extract_str(REPORT);
        assert_eq!(record.get(Field::HardwareClass), Some("HW-42"));
        assert_eq!(record.get(Field::Version), Some("12.3"));
        assert_eq!(record.get(Field::DiagnosisVersion), Some("70"));
        assert_eq!(record.get(Field::Vin), Some("1FUJGLDR12345"));
        assert_eq!(record.get(Field::HardwarePartNumber), Some("A0004460535"));
        assert_eq!(record.get(Field::HardwareVersion), Some("3"));
    }

    #[test]
    fn test_bare_extractor_ignores_prefixed_labels() {
        let record = FieldExtractor::new().extract_str(REPORT);
        assert!(record.is_empty());
    }

    #[test]
    fn test_no_key_value_rows_means_all_absent() {
        let html = "<html><body><p>nothing here</p><table><tr><td>a</td></tr></table></body></html>";
        let record = FieldExtractor::with_prefix("MCM").extract_str(html);
        assert_eq!(record.iter().count(), 8);
        assert!(record.iter().all(|(_, v)| v.is_none()));
    }

    #[test]
    fn test_last_occurrence_wins() {
        let html = r#"<table>
            <tr><td>VIN</td><td>FIRST</td></tr>
            <tr><td>VIN</td><td>SECOND</td></tr>
        </table>"#;
        let record = FieldExtractor::new().extract_str(html);
        assert_eq!(record.get(Field::Vin), Some("SECOND"));
    }

    #[test]
    fn test_all_zero_diagnosis_version_becomes_empty() {
        let html = "<table><tr><td>diagnosis version</td><td>000</td></tr></table>";
        let record = FieldExtractor::new().extract_str(html);
        assert_eq!(record.get(Field::DiagnosisVersion), Some(""));
    }

    #[test]
    fn test_zero_stripping_only_applies_to_diagnosis_version() {
        let html = "<table><tr><td>version</td><td>007</td></tr></table>";
        let record = FieldExtractor::new().extract_str(html);
        assert_eq!(record.get(Field::Version), Some("007"));
    }

    #[test]
    fn test_strip_leading_zeros_is_idempotent() {
        let once = strip_leading_zeros("0007");
        assert_eq!(once, "7");
        assert_eq!(strip_leading_zeros(once), "7");
        assert_eq!(strip_leading_zeros("700"), "700");
    }

    #[test]
    fn test_resolve_key_requires_exact_label() {
        let extractor = FieldExtractor::with_prefix("MCM");
        assert_eq!(extractor.resolve_key("MCM VIN"), Some(Field::Vin));
        assert_eq!(extractor.resolve_key("VIN"), Some(Field::Vin));
        assert_eq!(extractor.resolve_key("MCMVIN"), None);
        assert_eq!(extractor.resolve_key("MCM vin"), None);
        assert_eq!(extractor.resolve_key("MCM job number"), None);
    }

    #[test]
    fn test_missing_file_is_document_read_error() {
        let err = extract_report(Path::new("/definitely/not/here.html")).unwrap_err();
        assert!(matches!(err, SyncError::DocumentRead { .. }));
    }

    #[test]
    fn test_non_utf8_report_is_document_read_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("report.html");
        std::fs::write(&path, [0xff, 0xfe, b'<']).unwrap();
        let err = extract_report(&path).unwrap_err();
        assert!(matches!(err, SyncError::DocumentRead { .. }), "{:?}", err);
    }
}
