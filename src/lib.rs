//! Copies the MCM fields of a diagnostic report (HTML table dump) into the
//! next pre-numbered blank row of an Excel job sheet.

pub mod config;
pub mod error;
pub mod excel;
pub mod extract;
pub mod models;
pub mod services;
pub mod types;

pub use error::{Result, SyncError};
pub use extract::{extract_report, FieldExtractor};
pub use models::ColumnMap;
pub use services::reconciler::Reconciler;
pub use types::{ExtractedRecord, Field, SyncOutcome, SyncRequest, VehicleType};

/// Extract the report and write it into the sheet. Nothing is retried; the
/// first failure is returned as is.
pub fn run_sync(
    request: &SyncRequest,
    extractor: &FieldExtractor,
    reconciler: &Reconciler,
) -> Result<SyncOutcome> {
    let record = extractor.extract_file(&request.document)?;
    reconciler.reconcile(
        &record,
        &request.job_number,
        &request.vehicle_type,
        &request.spreadsheet,
    )
}
