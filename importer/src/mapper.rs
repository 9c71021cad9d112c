// importer/src/mapper.rs

use models::{DomainError, DomainResult, NewStudent};

/// A candidate record plus the 1-based sheet row it came from (the header
/// row counts as row 1), for per-row error reporting.
#[derive(Debug, Clone, PartialEq)]
pub struct MappedStudent {
    pub row: usize,
    pub record: NewStudent,
}

type Setter = fn(&mut NewStudent, String);

/// Fixed header-text to field table. Matching is exact string equality;
/// anything else in the header row is ignored.
const HEADER_MAP: &[(&str, Setter)] = &[
    ("Student No", |s, v| s.student_no = v),
    ("Trip ID", |s, v| s.trip_id = v),
    ("Flight Number", |s, v| s.flight_number = v),
    ("Arrival Time", |s, v| s.arrival_time = v),
    ("Pickup Time", |s, v| s.pickup_time = v),
    ("Date", |s, v| s.date = v),
    ("Student Given Name", |s, v| s.given_name = v),
    ("Student Family Name", |s, v| s.family_name = v),
    ("Arrival Type", |s, v| s.arrival_type = v),
    ("Sex", |s, v| s.sex = v),
    ("Host Given Name", |s, v| s.host_given_name = v),
    ("Host Family Name", |s, v| s.host_family_name = v),
    ("Host Phone", |s, v| s.host_phone = v),
    ("Host Address", |s, v| s.host_address = v),
    ("Host City", |s, v| s.host_city = v),
    ("School", |s, v| s.school = v),
    ("Client", |s, v| s.client = v),
    ("Staff Assigned", |s, v| s.staff_assigned = v),
    ("Study Permit", |s, v| s.study_permit = v),
    ("Special Instructions", |s, v| s.special_instructions = v),
];

/// The header row the import template ships with.
pub fn expected_headers() -> Vec<&'static str> {
    HEADER_MAP.iter().map(|(name, _)| *name).collect()
}

fn setter_for(header: &str) -> Option<Setter> {
    HEADER_MAP
        .iter()
        .find(|(name, _)| *name == header)
        .map(|(_, set)| *set)
}

/// Maps a decoded sheet (header row first) into candidate records, in
/// original row order. Rows that are entirely empty are skipped, as are
/// rows that carry neither name after mapping. Recognized headers missing
/// from the sheet simply leave their fields at `""`.
pub fn map_rows(rows: &[Vec<String>]) -> DomainResult<Vec<MappedStudent>> {
    if rows.len() < 2 {
        return Err(DomainError::MalformedInput(
            "sheet must contain a header row and at least one data row".to_string(),
        ));
    }

    let header = &rows[0];
    let columns: Vec<Option<Setter>> = header.iter().map(|h| setter_for(h.trim())).collect();

    let mut mapped = Vec::new();
    for (index, row) in rows[1..].iter().enumerate() {
        if row.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        let mut record = NewStudent::default();
        for (cell, setter) in row.iter().zip(columns.iter()) {
            if let Some(set) = setter {
                set(&mut record, cell.trim().to_string());
            }
        }
        if !record.has_name() {
            continue;
        }
        // Header is sheet row 1, so the first data row is row 2.
        mapped.push(MappedStudent {
            row: index + 2,
            record,
        });
    }
    Ok(mapped)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(raw: &[&[&str]]) -> Vec<Vec<String>> {
        raw.iter()
            .map(|row| row.iter().map(|c| c.to_string()).collect())
            .collect()
    }

    #[test]
    fn maps_exactly_one_record_per_name_bearing_row() {
        let sheet = rows(&[
            &["Student Given Name", "Student Family Name", "School", "Client"],
            &["Ann", "Lee", "ILSC", "ILSC"],
            &["", "", "ILSC", "ILSC"],
        ]);
        let mapped = map_rows(&sheet).unwrap();
        assert_eq!(mapped.len(), 1);
        assert_eq!(mapped[0].row, 2);
        assert_eq!(mapped[0].record.given_name, "Ann");
        assert_eq!(mapped[0].record.family_name, "Lee");
        assert_eq!(mapped[0].record.school, "ILSC");
        assert_eq!(mapped[0].record.client, "ILSC");
    }

    #[test]
    fn preserves_order_and_row_numbers_across_skips() {
        let sheet = rows(&[
            &["Student Given Name", "Flight Number"],
            &["Ann", "AC 8"],
            &["", ""],
            &["Bo", "AC 9"],
        ]);
        let mapped = map_rows(&sheet).unwrap();
        assert_eq!(mapped.len(), 2);
        assert_eq!(mapped[0].row, 2);
        assert_eq!(mapped[1].row, 4);
        assert_eq!(mapped[1].record.flight_number, "AC 9");
    }

    #[test]
    fn unrecognized_headers_are_ignored() {
        let sheet = rows(&[
            &["Student Given Name", "Shoe Size"],
            &["Ann", "38"],
        ]);
        let mapped = map_rows(&sheet).unwrap();
        assert_eq!(mapped.len(), 1);
        assert_eq!(mapped[0].record.given_name, "Ann");
        // The unmatched column contributes nothing.
        assert_eq!(mapped[0].record, {
            let mut expected = NewStudent::default();
            expected.given_name = "Ann".to_string();
            expected
        });
    }

    #[test]
    fn missing_headers_leave_fields_empty() {
        let sheet = rows(&[
            &["Student Family Name"],
            &["Lee"],
        ]);
        let mapped = map_rows(&sheet).unwrap();
        assert_eq!(mapped[0].record.family_name, "Lee");
        assert_eq!(mapped[0].record.given_name, "");
        assert_eq!(mapped[0].record.school, "");
    }

    #[test]
    fn header_only_sheet_is_malformed() {
        let sheet = rows(&[&["Student Given Name"]]);
        assert!(matches!(
            map_rows(&sheet).unwrap_err(),
            DomainError::MalformedInput(_)
        ));
        assert!(matches!(
            map_rows(&[]).unwrap_err(),
            DomainError::MalformedInput(_)
        ));
    }

    #[test]
    fn ragged_rows_are_tolerated() {
        // Row shorter than the header: trailing columns stay default.
        let sheet = rows(&[
            &["Student Given Name", "Student Family Name", "School"],
            &["Ann"],
        ]);
        let mapped = map_rows(&sheet).unwrap();
        assert_eq!(mapped[0].record.given_name, "Ann");
        assert_eq!(mapped[0].record.school, "");
    }

    #[test]
    fn template_headers_cover_all_mapped_fields() {
        let headers = expected_headers();
        assert!(headers.contains(&"Student Given Name"));
        assert!(headers.contains(&"Special Instructions"));
        assert_eq!(headers.len(), 20);
    }
}
