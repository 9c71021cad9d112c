// importer/src/decode.rs

use std::io::Cursor;

use calamine::{Data, Reader, Xlsx};

use models::{DomainError, DomainResult};

/// Uploaded file format, decided from the filename extension at the HTTP
/// boundary. Anything unrecognized is treated as xlsx.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetFormat {
    Xlsx,
    Csv,
}

impl SheetFormat {
    pub fn from_filename(name: &str) -> Self {
        if name.to_lowercase().ends_with(".csv") {
            SheetFormat::Csv
        } else {
            SheetFormat::Xlsx
        }
    }
}

/// Decodes the upload into rows of trimmed strings, header row included.
/// Codec failures surface as a single `Decode` error; no partial rows.
pub fn decode_rows(bytes: &[u8], format: SheetFormat) -> DomainResult<Vec<Vec<String>>> {
    match format {
        SheetFormat::Xlsx => decode_xlsx(bytes),
        SheetFormat::Csv => decode_csv(bytes),
    }
}

fn decode_xlsx(bytes: &[u8]) -> DomainResult<Vec<Vec<String>>> {
    let cursor = Cursor::new(bytes.to_vec());
    let mut workbook: Xlsx<_> = calamine::open_workbook_from_rs(cursor)
        .map_err(|e| DomainError::Decode(format!("could not parse spreadsheet: {}", e)))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| DomainError::MalformedInput("workbook has no worksheets".to_string()))?
        .map_err(|e| DomainError::Decode(format!("could not read first worksheet: {}", e)))?;

    Ok(range
        .rows()
        .map(|row| row.iter().map(cell_to_string).collect())
        .collect())
}

fn decode_csv(bytes: &[u8]) -> DomainResult<Vec<Vec<String>>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);
    let mut rows = Vec::new();
    for record in reader.records() {
        let record =
            record.map_err(|e| DomainError::Decode(format!("could not parse csv: {}", e)))?;
        rows.push(record.iter().map(|cell| cell.trim().to_string()).collect());
    }
    Ok(rows)
}

/// String coercion only: numbers render without a trailing `.0`, date
/// cells fall back to their serial value, error cells become empty.
fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => {
            if f.fract() == 0.0 && f.abs() < 1e15 {
                format!("{}", *f as i64)
            } else {
                format!("{}", f)
            }
        }
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => format!("{}", dt.as_f64()),
        Data::DateTimeIso(s) => s.trim().to_string(),
        Data::DurationIso(s) => s.trim().to_string(),
        Data::Error(_) => String::new(),
    }
}
