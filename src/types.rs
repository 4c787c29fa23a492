use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// A value the sync knows how to place in the job sheet: the 8 fields read
/// from the diagnostic report, plus the 2 supplied by the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    HardwareClass,
    Version,
    DiagnosisVersion,
    Vin,
    SerialNumber,
    HardwarePartNumber,
    Certification,
    HardwareVersion,
    JobNumber,
    VehicleType,
}

impl Field {
    /// Fields read from the report, in sheet order.
    pub const DOCUMENT: [Field; 8] = [
        Field::HardwareClass,
        Field::Version,
        Field::DiagnosisVersion,
        Field::Vin,
        Field::SerialNumber,
        Field::HardwarePartNumber,
        Field::Certification,
        Field::HardwareVersion,
    ];

    pub const ALL: [Field; 10] = [
        Field::HardwareClass,
        Field::Version,
        Field::DiagnosisVersion,
        Field::Vin,
        Field::SerialNumber,
        Field::HardwarePartNumber,
        Field::Certification,
        Field::HardwareVersion,
        Field::JobNumber,
        Field::VehicleType,
    ];

    /// Label of the field as it appears in the report (without device prefix).
    pub fn canonical_name(self) -> &'static str {
        match self {
            Field::HardwareClass => "hardware class",
            Field::Version => "version",
            Field::DiagnosisVersion => "diagnosis version",
            Field::Vin => "VIN",
            Field::SerialNumber => "serial number",
            Field::HardwarePartNumber => "hardware part number",
            Field::Certification => "certification",
            Field::HardwareVersion => "hardware version",
            Field::JobNumber => "job number",
            Field::VehicleType => "vehicle type",
        }
    }

    /// Column header used by the stock job sheet.
    pub fn default_header(self) -> &'static str {
        match self {
            Field::HardwareClass => "Hardware Class",
            Field::Version => "Version",
            Field::DiagnosisVersion => "Diagnosis Version",
            Field::Vin => "Vin",
            Field::SerialNumber => "Serial Number",
            Field::HardwarePartNumber => "Part Number",
            Field::Certification => "Certification",
            Field::HardwareVersion => "Hardware Version",
            Field::JobNumber => "Fixably No.",
            Field::VehicleType => "Vehicle Type",
        }
    }

    pub fn from_canonical_name(name: &str) -> Option<Field> {
        Field::ALL.into_iter().find(|f| f.canonical_name() == name)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical_name())
    }
}

/// Values pulled out of one diagnostic report. Every document field is always
/// present as a key; `None` means the report never mentioned it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractedRecord {
    fields: BTreeMap<Field, Option<String>>,
}

impl ExtractedRecord {
    pub(crate) fn from_values(mut fields: BTreeMap<Field, Option<String>>) -> Self {
        for field in Field::DOCUMENT {
            fields.entry(field).or_insert(None);
        }
        Self { fields }
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        self.fields.get(&field).and_then(|v| v.as_deref())
    }

    /// Document fields in sheet order, with their values.
    pub fn iter(&self) -> impl Iterator<Item = (Field, Option<&str>)> + '_ {
        self.fields.iter().map(|(k, v)| (*k, v.as_deref()))
    }

    pub fn is_empty(&self) -> bool {
        self.fields.values().all(Option::is_none)
    }

    /// Record plus the operator's job number and vehicle type, ready to write.
    pub fn with_job(&self, job_number: &str, vehicle_type: &str) -> Vec<(Field, Option<String>)> {
        let mut row: Vec<(Field, Option<String>)> = self
            .fields
            .iter()
            .map(|(k, v)| (*k, v.clone()))
            .collect();
        row.push((Field::JobNumber, Some(job_number.to_string())));
        row.push((Field::VehicleType, Some(vehicle_type.to_string())));
        row
    }
}

/// Vehicle categories offered to the operator. The engine itself stores
/// whatever label it is handed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VehicleType {
    Truck,
    Bus,
    OffHighway,
    International,
}

impl VehicleType {
    pub fn label(self) -> &'static str {
        match self {
            VehicleType::Truck => "Truck",
            VehicleType::Bus => "Bus",
            VehicleType::OffHighway => "Off-Highway",
            VehicleType::International => "International",
        }
    }
}

impl std::str::FromStr for VehicleType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "truck" => Ok(VehicleType::Truck),
            "bus" => Ok(VehicleType::Bus),
            "off-highway" | "offhighway" | "off_highway" => Ok(VehicleType::OffHighway),
            "international" => Ok(VehicleType::International),
            other => Err(format!(
                "unknown vehicle type '{}' (expected Truck, Bus, Off-Highway or International)",
                other
            )),
        }
    }
}

/// One sync job as handed over by the front end.
#[derive(Debug, Clone)]
pub struct SyncRequest {
    pub document: PathBuf,
    pub job_number: String,
    pub vehicle_type: String,
    pub spreadsheet: PathBuf,
}

/// What a successful reconciliation touched (1-based rows).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncOutcome {
    pub sheet_name: String,
    pub header_row: u32,
    pub target_row: u32,
    pub cells_written: usize,
}
