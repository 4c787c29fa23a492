use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use crate::error::{Result, SyncError};
use crate::types::Field;

/// Field -> column header text. Fixed for the duration of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnMap {
    headers: BTreeMap<Field, String>,
}

impl Default for ColumnMap {
    fn default() -> Self {
        Self {
            headers: Field::ALL
                .into_iter()
                .map(|f| (f, f.default_header().to_string()))
                .collect(),
        }
    }
}

/// On-disk overrides: `{"vin": "VIN No."}` renames a header, `{"vin": null}`
/// drops the field from the map.
#[derive(Debug, Deserialize)]
#[serde(transparent)]
struct ColumnMapOverrides(BTreeMap<Field, Option<String>>);

impl ColumnMap {
    pub fn header_for(&self, field: Field) -> Option<&str> {
        self.headers.get(&field).map(String::as_str)
    }

    /// Every header a sheet must carry for its header row to be recognised.
    pub fn required_headers(&self) -> HashSet<&str> {
        self.headers.values().map(String::as_str).collect()
    }

    pub fn with_header(mut self, field: Field, header: &str) -> Self {
        self.headers.insert(field, header.to_string());
        self
    }

    pub fn without(mut self, field: Field) -> Self {
        self.headers.remove(&field);
        self
    }

    /// Default map with the overrides in `json` applied on top.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let overrides: ColumnMapOverrides = serde_json::from_str(json)
            .map_err(|e| SyncError::Config(format!("invalid column map: {}", e)))?;
        let mut map = Self::default();
        for (field, header) in overrides.0 {
            map = match header {
                Some(h) if !h.trim().is_empty() => map.with_header(field, h.trim()),
                _ => map.without(field),
            };
        }
        Ok(map)
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            SyncError::Config(format!("could not read column map {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&json)
    }
}
