use calamine::{open_workbook_auto, DataType, Reader};
use edit_xlsx::{FormatAlignType, Write};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

use crate::error::{Result, SyncError};
use crate::models::SheetGrid;

/// Column index to Excel letter (0→A, 1→B, 25→Z, 26→AA).
pub fn col_index_to_letter(index: u32) -> String {
    let mut n = index;
    let mut s = String::new();
    loop {
        let r = (n % 26) as u8;
        s.insert(0, (b'A' + r) as char);
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }
    s
}

/// A1-style reference for a 1-based (row, column).
pub fn cell_ref(row: u32, col: u32) -> String {
    format!("{}{}", col_index_to_letter(col.saturating_sub(1)), row)
}

fn ensure_exists(path: &Path) -> Result<()> {
    if !path.is_file() {
        return Err(SyncError::SpreadsheetNotFound(path.to_path_buf()));
    }
    Ok(())
}

/// Load one worksheet as a grid of cell texts. Without a sheet name the first
/// sheet of the workbook is used. Returns the sheet name actually read.
pub fn read_sheet_grid(path: &Path, sheet_name: Option<&str>) -> Result<(String, SheetGrid)> {
    ensure_exists(path)?;
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| SyncError::Workbook(format!("Could not open Excel file: {}", e)))?;
    let name = match sheet_name {
        Some(name) => name.to_string(),
        None => workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| SyncError::Workbook("workbook has no worksheets".to_string()))?,
    };
    let range = workbook
        .worksheet_range(&name)
        .map_err(|e| SyncError::Workbook(format!("Sheet '{}' not found: {}", name, e)))?;

    // Positions are absolute so a used range that starts below/right of A1
    // still lines up with real row and column numbers.
    let (last_row_0, last_col_0) = match range.end() {
        Some(end) => end,
        None => return Ok((name, SheetGrid::default())),
    };
    let rows = (0..=last_row_0)
        .map(|r| {
            (0..=last_col_0)
                .map(|c| {
                    range.get_value((r, c)).and_then(|cell| {
                        if cell.is_empty() {
                            None
                        } else {
                            Some(cell.as_string().unwrap_or_else(|| cell.to_string()))
                        }
                    })
                })
                .collect()
        })
        .collect();
    debug!(
        "read sheet '{}' from {}: {} rows x {} columns",
        name,
        path.display(),
        last_row_0 + 1,
        last_col_0 + 1
    );
    Ok((name, SheetGrid::from_rows(rows)))
}

/// Drop characters XML cannot hold: control chars other than tab, newline
/// and CR, plus the U+FFFE / U+FFFF non-characters. Everything else is kept
/// as given; the writer escapes markup characters itself.
pub fn sanitize_cell(s: &str) -> String {
    s.chars()
        .filter(|&c| {
            let u = c as u32;
            matches!(c, '\t' | '\n' | '\r')
                || !(u < 0x20 || u == 0x7F || u == 0xFFFE || u == 0xFFFF)
        })
        .collect()
}

/// Centered both ways, as the job sheet expects for filled-in entries.
fn centered_cell_format() -> edit_xlsx::Format {
    edit_xlsx::Format::default()
        .set_align(FormatAlignType::Center)
        .set_align(FormatAlignType::VerticalCenter)
}

fn open_for_edit(path: &Path) -> Result<edit_xlsx::Workbook> {
    edit_xlsx::Workbook::from_path(path).map_err(|e| {
        let msg = e.to_string();
        if msg.contains("permission") || msg.contains("Permission") {
            SyncError::Workbook("Please close the file in Excel first.".to_string())
        } else {
            SyncError::Workbook(format!("Could not open Excel file: {}", msg))
        }
    })
}

/// Write string cells into one existing row and replace the file on disk.
/// `cells` holds (1-based column, value). Nothing on disk changes unless every
/// cell was written and the workbook saved.
pub fn write_row(path: &Path, sheet_name: &str, row: u32, cells: &[(u32, String)]) -> Result<()> {
    ensure_exists(path)?;
    let mut workbook = open_for_edit(path)?;
    let worksheet = workbook
        .get_worksheet_mut_by_name(sheet_name)
        .map_err(|e| SyncError::Workbook(format!("Sheet '{}' not found: {}", sheet_name, e)))?;

    let format = centered_cell_format();
    for (col, value) in cells {
        let reference = cell_ref(row, *col);
        debug!("write {} = {:?}", reference, value);
        worksheet
            .write_string_with_format(&reference, sanitize_cell(value), &format)
            .map_err(|e| SyncError::Workbook(format!("Cannot write {}: {}", reference, e)))?;
    }

    commit(path, &mut workbook)?;
    info!("saved {} ({} cells in row {})", path.display(), cells.len(), row);
    Ok(())
}

fn temp_sibling(path: &Path) -> Result<tempfile::NamedTempFile> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    tempfile::Builder::new()
        .prefix(".mcm-sheet-sync-")
        .suffix(".xlsx")
        .tempfile_in(dir)
        .map_err(|e| SyncError::Workbook(format!("Cannot create temporary file: {}", e)))
}

/// Save to a staging file next to `path`, give it the original's
/// permissions, then rename it over `path`.
fn commit(path: &Path, workbook: &mut edit_xlsx::Workbook) -> Result<()> {
    let staging = temp_sibling(path)?;
    workbook.save_as(staging.path()).map_err(|e| {
        let msg = e.to_string();
        if msg.contains("Permission denied") || msg.contains("being used") {
            SyncError::Workbook("Please close the file in Excel first.".to_string())
        } else {
            SyncError::Workbook(format!("Cannot write to file: {}", msg))
        }
    })?;

    let permissions = fs::metadata(path)
        .map_err(|e| SyncError::Workbook(format!("Cannot read file permissions: {}", e)))?
        .permissions();
    fs::set_permissions(staging.path(), permissions)
        .map_err(|e| SyncError::Workbook(format!("Cannot set file permissions: {}", e)))?;
    staging
        .persist(path)
        .map_err(|e| SyncError::Workbook(format!("Replace file: {}", e)))?;
    Ok(())
}
