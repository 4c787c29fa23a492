use serde::Serialize;
use std::collections::HashMap;

/// Read-only snapshot of a worksheet's cell texts, addressed 1-based like Excel.
/// Empty cells (no value, or an empty string) are stored as `None`.
#[derive(Debug, Clone, Default)]
pub struct SheetGrid {
    rows: Vec<Vec<Option<String>>>,
}

impl SheetGrid {
    /// Build from row-major cell texts where `rows[0][0]` is A1.
    pub fn from_rows(rows: Vec<Vec<Option<String>>>) -> Self {
        let rows = rows
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .map(|cell| cell.filter(|s| !s.is_empty()))
                    .collect()
            })
            .collect();
        Self { rows }
    }

    pub fn text(&self, row: u32, col: u32) -> Option<&str> {
        if row == 0 || col == 0 {
            return None;
        }
        self.rows
            .get(row as usize - 1)
            .and_then(|r| r.get(col as usize - 1))
            .and_then(|c| c.as_deref())
    }

    pub fn is_empty_cell(&self, row: u32, col: u32) -> bool {
        self.text(row, col).is_none()
    }

    /// Last row index that exists in the snapshot (0 when the sheet is empty).
    pub fn last_row(&self) -> u32 {
        self.rows.len() as u32
    }

    pub fn last_col(&self, row: u32) -> u32 {
        if row == 0 {
            return 0;
        }
        self.rows
            .get(row as usize - 1)
            .map(|r| r.len() as u32)
            .unwrap_or(0)
    }

    /// Non-empty cells of a row as (column, text).
    pub fn row_cells(&self, row: u32) -> impl Iterator<Item = (u32, &str)> + '_ {
        (1..=self.last_col(row)).filter_map(move |col| self.text(row, col).map(|t| (col, t)))
    }
}

/// The row holding the column headers, and where each header sits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeaderRow {
    pub row: u32,
    /// Header text -> 1-based column. On repeated text the right-most column wins.
    pub columns: HashMap<String, u32>,
}

impl HeaderRow {
    pub fn from_grid(grid: &SheetGrid, row: u32) -> Self {
        let columns = grid
            .row_cells(row)
            .map(|(col, text)| (text.to_string(), col))
            .collect();
        Self { row, columns }
    }

    pub fn column_of(&self, header: &str) -> Option<u32> {
        self.columns.get(header).copied()
    }
}
