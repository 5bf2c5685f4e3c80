//! Spreadsheet ledger of recorded visits.
//!
//! The ledger is an `.xlsx` workbook whose first sheet holds one row per submission
//! under a fixed header row, with no key: submitting the same visit twice yields two
//! rows. It is always read in full and rewritten in full. Columns are looked up by
//! header name, so a sheet whose columns were reordered by hand still loads.

use std::ffi::OsString;
use std::io::{Cursor, ErrorKind};
use std::path::{Path, PathBuf};

use calamine::{Data, DataType, Reader, Xlsx};
use chrono::{NaiveDate, NaiveTime};
use fieldvisit_core::{AppError, VisitRecord};
use rust_xlsxwriter::{Format, Workbook, XlsxError};
use serde::Serialize;
use tokio::fs;

const DATE_FORMAT: &str = "%d/%m/%Y";
const TIME_FORMAT: &str = "%H:%M";

/// One ledger line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerRow {
    #[serde(serialize_with = "serialize_date")]
    pub visit_date: NaiveDate,
    #[serde(serialize_with = "serialize_time")]
    pub visit_time: NaiveTime,
    pub latitude: String,
    pub longitude: String,
    pub preservation: String,
    pub vehicle: String,
    pub companion: String,
    pub photographer: String,
    pub materials: String,
    pub notes: String,
    pub storage_path: String,
}

impl LedgerRow {
    /// Header row, in file order.
    pub const COLUMNS: [&'static str; 11] = [
        "Data",
        "Hora",
        "Latitude",
        "Longitude",
        "Preservação",
        "VTR",
        "Acompanhante",
        "Fotógrafo",
        "Materiais",
        "Observações",
        "Pasta_Fotos",
    ];

    pub fn new(visit: &VisitRecord, storage_path: impl Into<String>) -> Self {
        Self {
            visit_date: visit.visit_date,
            visit_time: visit.visit_time,
            latitude: visit.latitude.clone(),
            longitude: visit.longitude.clone(),
            preservation: visit.preservation.clone(),
            vehicle: visit.vehicle.clone(),
            companion: visit.companion.clone(),
            photographer: visit.photographer.clone(),
            materials: visit.materials.clone(),
            notes: visit.notes.clone(),
            storage_path: storage_path.into(),
        }
    }

    /// Cell values in [`LedgerRow::COLUMNS`] order. Dates are `DD/MM/YYYY`, times `HH:MM`.
    fn cells(&self) -> [String; 11] {
        [
            self.visit_date.format(DATE_FORMAT).to_string(),
            self.visit_time.format(TIME_FORMAT).to_string(),
            self.latitude.clone(),
            self.longitude.clone(),
            self.preservation.clone(),
            self.vehicle.clone(),
            self.companion.clone(),
            self.photographer.clone(),
            self.materials.clone(),
            self.notes.clone(),
            self.storage_path.clone(),
        ]
    }

    /// Read a sheet row, `positions[i]` being the sheet column of `COLUMNS[i]`.
    fn from_cells(cells: &[Data], positions: &[usize; 11]) -> Result<Self, String> {
        let cell = |i: usize| cells.get(positions[i]);
        let text = |i: usize| cell(i).map(cell_text).unwrap_or_default();

        Ok(Self {
            visit_date: parse_date(cell(0))?,
            visit_time: parse_time(cell(1))?,
            latitude: text(2),
            longitude: text(3),
            preservation: text(4),
            vehicle: text(5),
            companion: text(6),
            photographer: text(7),
            materials: text(8),
            notes: text(9),
            storage_path: text(10),
        })
    }
}

fn serialize_date<S: serde::Serializer>(date: &NaiveDate, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&date.format(DATE_FORMAT).to_string())
}

fn serialize_time<S: serde::Serializer>(time: &NaiveTime, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&time.format(TIME_FORMAT).to_string())
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn is_blank(cell: &Data) -> bool {
    match cell {
        Data::Empty => true,
        Data::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// Dates written by the recorder are text; a spreadsheet app may turn them into date cells.
fn parse_date(cell: Option<&Data>) -> Result<NaiveDate, String> {
    match cell {
        Some(Data::String(s)) => NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
            .map_err(|e| format!("invalid date '{}': {}", s, e)),
        Some(other) => other
            .as_date()
            .ok_or_else(|| format!("invalid date '{}'", cell_text(other))),
        None => Err("missing date".to_string()),
    }
}

fn parse_time(cell: Option<&Data>) -> Result<NaiveTime, String> {
    match cell {
        Some(Data::String(s)) => NaiveTime::parse_from_str(s.trim(), TIME_FORMAT)
            .map_err(|e| format!("invalid time '{}': {}", s, e)),
        Some(other) => other
            .as_time()
            .ok_or_else(|| format!("invalid time '{}'", cell_text(other))),
        None => Err("missing time".to_string()),
    }
}

/// Map every known column to its position in the header row.
fn column_positions(header: &[Data]) -> Result<[usize; 11], String> {
    let names: Vec<String> = header.iter().map(|c| cell_text(c).trim().to_string()).collect();

    if let Some(unknown) = names
        .iter()
        .find(|n| !n.is_empty() && !LedgerRow::COLUMNS.iter().any(|c| *c == n.as_str()))
    {
        return Err(format!("unexpected column '{}'", unknown));
    }

    let mut positions = [0usize; 11];
    for (slot, column) in positions.iter_mut().zip(LedgerRow::COLUMNS) {
        *slot = names
            .iter()
            .position(|n| n == column)
            .ok_or_else(|| format!("missing column '{}'", column))?;
    }
    Ok(positions)
}

fn parse_workbook(bytes: Vec<u8>) -> Result<Vec<LedgerRow>, String> {
    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes)).map_err(|e| e.to_string())?;
    let range = match workbook.worksheet_range_at(0) {
        Some(range) => range.map_err(|e| e.to_string())?,
        None => return Err("workbook has no sheet".to_string()),
    };

    let mut sheet_rows = range.rows();
    let Some(header) = sheet_rows.next() else {
        return Ok(Vec::new());
    };
    let positions = column_positions(header)?;

    let mut rows = Vec::new();
    for (index, cells) in sheet_rows.enumerate() {
        if cells.iter().all(is_blank) {
            continue;
        }
        // +2: one-based, after the header row
        let row = LedgerRow::from_cells(cells, &positions)
            .map_err(|e| format!("row {}: {}", index + 2, e))?;
        rows.push(row);
    }
    Ok(rows)
}

fn build_workbook(rows: &[LedgerRow]) -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();
    let sheet = workbook.add_worksheet();

    for (col, name) in LedgerRow::COLUMNS.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *name, &header_format)?;
    }
    for (index, row) in rows.iter().enumerate() {
        let sheet_row = index as u32 + 1;
        for (col, value) in row.cells().iter().enumerate() {
            if !value.is_empty() {
                sheet.write_string(sheet_row, col as u16, value.as_str())?;
            }
        }
    }

    workbook.save_to_buffer()
}

/// Handle on the ledger file. Holds no rows: every call goes back to disk.
#[derive(Debug, Clone)]
pub struct Ledger {
    path: PathBuf,
}

impl Ledger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parse every row. A missing file is an empty ledger; anything unparsable is an error.
    pub async fn load(&self) -> Result<Vec<LedgerRow>, AppError> {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(AppError::Ledger(format!(
                    "Failed to read ledger {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };

        parse_workbook(bytes).map_err(|e| {
            AppError::Ledger(format!("Malformed ledger {}: {}", self.path.display(), e))
        })
    }

    /// Load, add `row` at the end and rewrite the whole file. Returns the new row count.
    pub async fn append(&self, row: LedgerRow) -> Result<usize, AppError> {
        let mut rows = self.load().await?;
        rows.push(row);
        self.rewrite(&rows).await?;
        Ok(rows.len())
    }

    /// Replace the file with `rows`, going through a sibling temporary file.
    async fn rewrite(&self, rows: &[LedgerRow]) -> Result<(), AppError> {
        let bytes = build_workbook(rows)
            .map_err(|e| AppError::Ledger(format!("Failed to serialize ledger: {}", e)))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }

        let tmp_path = self.tmp_path();
        fs::write(&tmp_path, &bytes).await.map_err(|e| {
            AppError::Ledger(format!(
                "Failed to write ledger {}: {}",
                tmp_path.display(),
                e
            ))
        })?;
        fs::rename(&tmp_path, &self.path).await.map_err(|e| {
            AppError::Ledger(format!(
                "Failed to replace ledger {}: {}",
                self.path.display(),
                e
            ))
        })?;

        tracing::debug!(
            path = %self.path.display(),
            rows = rows.len(),
            size_bytes = bytes.len(),
            "Ledger rewritten"
        );

        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name: OsString = self.path.as_os_str().to_owned();
        name.push(".tmp");
        PathBuf::from(name)
    }
}
