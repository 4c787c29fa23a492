//! Places one extracted record into the job sheet: finds the header row,
//! checks the columns, picks the pre-numbered blank row and writes it.

use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info};

use crate::error::{Result, SyncError};
use crate::excel;
use crate::models::{ColumnMap, HeaderRow, SheetGrid};
use crate::types::{ExtractedRecord, Field, SyncOutcome};

/// Header row must sit within the first this-many rows (1-based, inclusive).
pub const HEADER_SCAN_ROWS: u32 = 10;

/// Where a record would land, without writing anything.
#[derive(Debug, Clone)]
pub struct SheetPlan {
    pub sheet_name: String,
    pub header: HeaderRow,
    pub target_row: u32,
}

#[derive(Debug, Clone, Default)]
pub struct Reconciler {
    column_map: ColumnMap,
    sheet_name: Option<String>,
}

impl Reconciler {
    pub fn new(column_map: ColumnMap) -> Self {
        Self {
            column_map,
            sheet_name: None,
        }
    }

    /// Use a named worksheet instead of the first one.
    pub fn with_sheet(mut self, sheet_name: Option<String>) -> Self {
        self.sheet_name = sheet_name;
        self
    }

    pub fn column_map(&self) -> &ColumnMap {
        &self.column_map
    }

    /// Write `record` plus the job number and vehicle type into the first
    /// blank pre-numbered row and save the workbook in place.
    pub fn reconcile(
        &self,
        record: &ExtractedRecord,
        job_number: &str,
        vehicle_type: &str,
        path: &Path,
    ) -> Result<SyncOutcome> {
        let (sheet_name, grid) = excel::read_sheet_grid(path, self.sheet_name.as_deref())?;

        let header = find_header_row(&grid, &self.column_map.required_headers())?;
        info!("header row {} in sheet '{}'", header.row, sheet_name);
        debug!("headers and their columns: {:?}", header.columns);

        check_coverage(record, &self.column_map, &header)?;

        let row_values = record.with_job(job_number, vehicle_type);

        let target_row = find_target_row(&grid, &header)?;
        info!("target row {}", target_row);

        let cells = resolve_cells(&row_values, &self.column_map, &header)?;
        excel::write_row(path, &sheet_name, target_row, &cells)?;

        Ok(SyncOutcome {
            sheet_name,
            header_row: header.row,
            target_row,
            cells_written: cells.len(),
        })
    }

    /// Header discovery and row selection only; the file is not touched.
    pub fn plan(&self, path: &Path) -> Result<SheetPlan> {
        let (sheet_name, grid) = excel::read_sheet_grid(path, self.sheet_name.as_deref())?;
        let header = find_header_row(&grid, &self.column_map.required_headers())?;
        let target_row = find_target_row(&grid, &header)?;
        Ok(SheetPlan {
            sheet_name,
            header,
            target_row,
        })
    }
}

/// First row in 1..=HEADER_SCAN_ROWS whose non-empty cells include every
/// required header.
pub fn find_header_row(grid: &SheetGrid, required: &HashSet<&str>) -> Result<HeaderRow> {
    for row in 1..=HEADER_SCAN_ROWS {
        let candidate = HeaderRow::from_grid(grid, row);
        debug!("headers found in row {}: {:?}", row, candidate.columns);
        let present: HashSet<&str> = candidate.columns.keys().map(String::as_str).collect();
        if required.is_subset(&present) {
            return Ok(candidate);
        }
    }
    Err(SyncError::HeaderNotFound {
        scanned: HEADER_SCAN_ROWS,
    })
}

/// Every document field must map to a header that the header row carries.
/// Job number and vehicle type are not checked here; they are resolved when
/// the row is written.
pub fn check_coverage(record: &ExtractedRecord, map: &ColumnMap, header: &HeaderRow) -> Result<()> {
    for (field, _) in record.iter() {
        let found = map
            .header_for(field)
            .is_some_and(|h| header.column_of(h).is_some());
        if !found {
            return Err(SyncError::MissingColumn {
                field: field.canonical_name().to_string(),
            });
        }
    }
    Ok(())
}

/// First row below the header whose column A is filled while every other
/// header column is blank.
pub fn find_target_row(grid: &SheetGrid, header: &HeaderRow) -> Result<u32> {
    let data_columns: Vec<u32> = header
        .columns
        .values()
        .copied()
        .filter(|&col| col != 1)
        .collect();
    for row in (header.row + 1)..=grid.last_row() {
        if grid.is_empty_cell(row, 1) {
            continue;
        }
        if data_columns.iter().all(|&col| grid.is_empty_cell(row, col)) {
            return Ok(row);
        }
    }
    Err(SyncError::NoTargetRow)
}

/// (column, value) pairs for the present values of the row.
fn resolve_cells(
    row_values: &[(Field, Option<String>)],
    map: &ColumnMap,
    header: &HeaderRow,
) -> Result<Vec<(u32, String)>> {
    let mut cells = Vec::with_capacity(row_values.len());
    for (field, value) in row_values {
        let col = map
            .header_for(*field)
            .and_then(|h| header.column_of(h))
            .ok_or_else(|| SyncError::MissingColumn {
                field: field.canonical_name().to_string(),
            })?;
        match value {
            Some(v) => cells.push((col, v.clone())),
            None => debug!("{} absent from report, leaving column {} empty", field, col),
        }
    }
    Ok(cells)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::FieldExtractor;
    use pretty_assertions::assert_eq;

    fn headers() -> Vec<Option<String>> {
        [
            "No.",
            "Fixably No.",
            "Vehicle Type",
            "Vin",
            "Hardware Class",
            "Version",
            "Diagnosis Version",
            "Serial Number",
            "Part Number",
            "Certification",
            "Hardware Version",
        ]
        .iter()
        .map(|s| Some(s.to_string()))
        .collect()
    }

    fn numbered(n: u32) -> Vec<Option<String>> {
        vec![Some(n.to_string())]
    }

    fn grid_with_header_at(row: usize) -> SheetGrid {
        let mut rows = vec![vec![Some("Job sheet".to_string())]; row - 1];
        rows.push(headers());
        rows.push(numbered(1));
        SheetGrid::from_rows(rows)
    }

    fn required() -> HashSet<&'static str> {
        Field::ALL.iter().map(|f| f.default_header()).collect()
    }

    #[test]
    fn header_found_at_lowest_qualifying_row() {
        let mut rows = vec![vec![None], headers(), headers()];
        rows.push(numbered(1));
        let grid = SheetGrid::from_rows(rows);
        let header = find_header_row(&grid, &required()).unwrap();
        assert_eq!(header.row, 2);
        assert_eq!(header.column_of("Vin"), Some(4));
    }

    #[test]
    fn header_at_row_ten_is_found() {
        let header = find_header_row(&grid_with_header_at(10), &required()).unwrap();
        assert_eq!(header.row, 10);
    }

    #[test]
    fn header_at_row_eleven_is_not_found() {
        let err = find_header_row(&grid_with_header_at(11), &required()).unwrap_err();
        assert!(matches!(err, SyncError::HeaderNotFound { scanned: 10 }));
    }

    #[test]
    fn partial_header_row_does_not_qualify() {
        let mut partial = headers();
        partial.retain(|h| h.as_deref() != Some("Vin"));
        let grid = SheetGrid::from_rows(vec![partial, numbered(1)]);
        assert!(matches!(
            find_header_row(&grid, &required()),
            Err(SyncError::HeaderNotFound { .. })
        ));
    }

    #[test]
    fn target_row_skips_filled_and_unnumbered_rows() {
        let mut filled = numbered(1);
        filled.push(Some("JOB-0".to_string()));
        let rows = vec![
            headers(),
            filled,
            vec![None, None],
            numbered(3),
            numbered(4),
        ];
        let grid = SheetGrid::from_rows(rows);
        let header = HeaderRow::from_grid(&grid, 1);
        assert_eq!(find_target_row(&grid, &header).unwrap(), 4);
    }

    #[test]
    fn target_row_ignores_cells_outside_header_columns() {
        let mut row = numbered(7);
        row.resize(12, None);
        row[11] = Some("note".to_string());
        let grid = SheetGrid::from_rows(vec![headers(), row]);
        let header = HeaderRow::from_grid(&grid, 1);
        assert_eq!(find_target_row(&grid, &header).unwrap(), 2);
    }

    #[test]
    fn no_blank_row_is_no_target_row() {
        let mut filled = numbered(1);
        filled.push(Some("JOB-0".to_string()));
        let grid = SheetGrid::from_rows(vec![headers(), filled]);
        let header = HeaderRow::from_grid(&grid, 1);
        assert!(matches!(
            find_target_row(&grid, &header),
            Err(SyncError::NoTargetRow)
        ));
    }

    #[test]
    fn coverage_names_the_unmapped_document_field() {
        let grid = SheetGrid::from_rows(vec![headers()]);
        let header = HeaderRow::from_grid(&grid, 1);
        let record = FieldExtractor::new().extract_str("");
        let map = ColumnMap::default().without(Field::Vin);
        match check_coverage(&record, &map, &header) {
            Err(SyncError::MissingColumn { field }) => assert_eq!(field, "VIN"),
            other => panic!("expected MissingColumn, got {:?}", other),
        }
    }

    #[test]
    fn coverage_does_not_check_caller_fields() {
        let grid = SheetGrid::from_rows(vec![headers()]);
        let header = HeaderRow::from_grid(&grid, 1);
        let record = FieldExtractor::new().extract_str("");
        let map = ColumnMap::default().with_header(Field::JobNumber, "Job No.");
        assert!(check_coverage(&record, &map, &header).is_ok());

        let row = record.with_job("JOB-1", "Bus");
        match resolve_cells(&row, &map, &header) {
            Err(SyncError::MissingColumn { field }) => assert_eq!(field, "job number"),
            other => panic!("expected MissingColumn, got {:?}", other),
        }
    }

    #[test]
    fn resolve_cells_skips_absent_values() {
        let grid = SheetGrid::from_rows(vec![headers()]);
        let header = HeaderRow::from_grid(&grid, 1);
        let record = FieldExtractor::new()
            .extract_str("<table><tr><td>VIN</td><td>1FUJ</td></tr></table>");
        let cells = resolve_cells(&record.with_job("JOB-1", "Bus"), &ColumnMap::default(), &header)
            .unwrap();
        assert_eq!(
            cells,
            vec![
                (4, "1FUJ".to_string()),
                (2, "JOB-1".to_string()),
                (3, "Bus".to_string()),
            ]
        );
    }
}
