// importer/src/lib.rs
//
// Bulk-import pipeline: decode an uploaded spreadsheet into rows of
// trimmed strings, then map header + data rows into candidate student
// records. The mapper is pure; all I/O and codec concerns stay in
// `decode`.

pub mod decode;
pub mod mapper;

pub use decode::{decode_rows, SheetFormat};
pub use mapper::{expected_headers, map_rows, MappedStudent};

use models::DomainResult;

/// Decodes and maps an uploaded sheet in one step.
pub fn import_sheet(bytes: &[u8], format: SheetFormat) -> DomainResult<Vec<MappedStudent>> {
    let rows = decode_rows(bytes, format)?;
    map_rows(&rows)
}
