//! Run settings: defaults, then `.env` / environment, then command-line flags.
//! Also remembers the last workbook used, one path per line file.

use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{Result, SyncError};
use crate::extract::{FieldExtractor, DEFAULT_LABEL_PREFIX};
use crate::models::ColumnMap;
use crate::services::reconciler::Reconciler;

pub const ENV_SHEET: &str = "MCM_SHEET";
pub const ENV_LABEL_PREFIX: &str = "MCM_LABEL_PREFIX";
pub const ENV_COLUMN_MAP: &str = "MCM_COLUMN_MAP";

const APP_DIR: &str = "mcm-sheet-sync";
const LAST_WORKBOOK_FILE: &str = "last_workbook.txt";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Worksheet to write; first sheet when unset.
    pub sheet: Option<String>,

    /// Device prefix in front of report labels ("MCM VIN").
    pub label_prefix: String,

    /// JSON file with column header overrides.
    pub column_map: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sheet: None,
            label_prefix: DEFAULT_LABEL_PREFIX.to_string(),
            column_map: None,
        }
    }
}

impl Settings {
    /// Defaults overlaid with `.env` and process environment.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        Self::default().with_lookup(|key| std::env::var(key).ok())
    }

    fn with_lookup(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_blank = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(sheet) = non_blank(ENV_SHEET) {
            self.sheet = Some(sheet.trim().to_string());
        }
        if let Some(prefix) = lookup(ENV_LABEL_PREFIX) {
            self.label_prefix = prefix.trim().to_string();
        }
        if let Some(map) = non_blank(ENV_COLUMN_MAP) {
            self.column_map = Some(PathBuf::from(map.trim()));
        }
        self
    }

    pub fn extractor(&self) -> FieldExtractor {
        FieldExtractor::with_prefix(&self.label_prefix)
    }

    pub fn reconciler(&self) -> Result<Reconciler> {
        let map = match &self.column_map {
            Some(path) => ColumnMap::from_json_file(path)?,
            None => ColumnMap::default(),
        };
        Ok(Reconciler::new(map).with_sheet(self.sheet.clone()))
    }
}

/// `<config dir>/mcm-sheet-sync/last_workbook.txt`
pub fn last_workbook_file() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_DIR).join(LAST_WORKBOOK_FILE))
}

/// First line of the remembered-path file, if any.
pub fn load_last_workbook(file: &Path) -> Option<PathBuf> {
    let text = std::fs::read_to_string(file).ok()?;
    let line = text.lines().next()?.trim();
    if line.is_empty() {
        None
    } else {
        Some(PathBuf::from(line))
    }
}

pub fn save_last_workbook(file: &Path, workbook: &Path) -> Result<()> {
    if let Some(dir) = file.parent() {
        std::fs::create_dir_all(dir)
            .map_err(|e| SyncError::Config(format!("create {}: {}", dir.display(), e)))?;
    }
    std::fs::write(file, workbook.to_string_lossy().as_bytes())
        .map_err(|e| SyncError::Config(format!("write {}: {}", file.display(), e)))?;
    debug!("remembered workbook {} in {}", workbook.display(), file.display());
    Ok(())
}

/// Explicit path wins; otherwise fall back to the remembered one.
pub fn resolve_workbook(explicit: Option<PathBuf>, remembered: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path);
    }
    remembered
        .and_then(load_last_workbook)
        .ok_or_else(|| SyncError::Config("no workbook given and none remembered; pass --workbook".to_string()))
}
