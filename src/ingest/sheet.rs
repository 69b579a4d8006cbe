//! Spreadsheet (.xlsx / .xls) upload parsing.
//!
//! Only the first sheet is read. The first row is the header; data rows
//! are matched to semantic columns with the same policy as CSV. Numeric
//! time cells are Excel fractional-day serials and are formatted to a
//! zero-padded `HH:MM` label; string time cells pass through unchanged.

use super::columns::ColumnMap;
use super::{IngestError, RawSeries};
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use std::io::Cursor;

/// Decode the first sheet of a workbook into a raw series.
pub(crate) fn parse_sheet(file_name: &str, bytes: &[u8]) -> Result<RawSeries, IngestError> {
    let cursor = Cursor::new(bytes);
    let mut workbook = open_workbook_auto_from_rs(cursor).map_err(|e| IngestError::Parse {
        file: file_name.to_string(),
        message: e.to_string(),
    })?;

    let Some(range) = workbook.worksheet_range_at(0) else {
        // A workbook without sheets carries zero data rows.
        return Ok(RawSeries::default());
    };
    let range = range.map_err(|e| IngestError::Parse {
        file: file_name.to_string(),
        message: e.to_string(),
    })?;

    let mut rows = range.rows();

    let Some(header_row) = rows.next() else {
        return Ok(RawSeries::default());
    };
    let headers: Vec<String> = header_row.iter().map(cell_label).collect();
    let map = ColumnMap::from_headers(&headers);

    let mut out = RawSeries::default();

    for row in rows {
        let Some(value) = map.value.and_then(|i| row.get(i)).and_then(cell_number) else {
            continue;
        };

        let timestamp = map
            .time
            .and_then(|i| row.get(i))
            .map(cell_timestamp)
            .unwrap_or_default();

        out.timestamps.push(timestamp);
        out.values.push(value);

        if let Some(p) = map.predicted.and_then(|i| row.get(i)).and_then(cell_number) {
            out.predicted.push(p);
        }

        if out.threshold.is_none() {
            out.threshold = map.threshold.and_then(|i| row.get(i)).and_then(cell_number);
        }
    }

    Ok(out)
}

/// Header cell to a matchable label.
fn cell_label(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Numeric extraction: native numbers, datetime serials, and numeric
/// strings all count (the legacy surface ran everything through
/// `parseFloat`).
fn cell_number(cell: &Data) -> Option<f64> {
    match cell {
        Data::Float(f) => Some(*f),
        Data::Int(i) => Some(*i as f64),
        Data::DateTime(dt) => Some(dt.as_f64()),
        Data::String(s) => s.trim().parse::<f64>().ok(),
        Data::Bool(_) | Data::Empty | Data::Error(_) => None,
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.trim().parse::<f64>().ok(),
    }
}

/// Time cell to a display label: serials become `HH:MM`, strings pass
/// through unchanged.
fn cell_timestamp(cell: &Data) -> String {
    match cell {
        Data::Float(f) => serial_to_clock(*f),
        Data::Int(i) => serial_to_clock(*i as f64),
        Data::DateTime(dt) => serial_to_clock(dt.as_f64()),
        Data::String(s) => s.clone(),
        Data::Empty => String::new(),
        other => other.to_string(),
    }
}

/// Convert the fractional part of an Excel day serial to `HH:MM`.
///
/// Minutes are rounded, not truncated, and hours are deliberately not
/// wrapped at 24 (a 0.9999 fraction formats as `24:00`), matching the
/// converter the stored documents were produced with.
fn serial_to_clock(serial: f64) -> String {
    let fractional_day = serial - serial.floor();
    let total_minutes = (fractional_day * 24.0 * 60.0).round() as i64;
    let hours = total_minutes / 60;
    let minutes = total_minutes % 60;
    format!("{:02}:{:02}", hours, minutes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serial_fraction_formats_as_clock_time() {
        // 0.5 of a day is noon.
        assert_eq!(serial_to_clock(0.5), "12:00");
        // Whole days contribute nothing.
        assert_eq!(serial_to_clock(45_777.25), "06:00");
        assert_eq!(serial_to_clock(0.0), "00:00");
    }

    #[test]
    fn serial_minutes_round_rather_than_truncate() {
        // 00:59:40 rounds up to the next minute.
        let serial = (59.0 * 60.0 + 40.0) / 86_400.0;
        assert_eq!(serial_to_clock(serial), "01:00");
    }

    #[test]
    fn late_day_fraction_is_not_wrapped() {
        assert_eq!(serial_to_clock(0.9999), "24:00");
    }

    #[test]
    fn numeric_strings_count_as_numbers() {
        assert_eq!(cell_number(&Data::String("  41.5 ".into())), Some(41.5));
        assert_eq!(cell_number(&Data::String("n/a".into())), None);
        assert_eq!(cell_number(&Data::Empty), None);
        assert_eq!(cell_number(&Data::Int(40)), Some(40.0));
    }

    #[test]
    fn string_time_cells_pass_through() {
        assert_eq!(cell_timestamp(&Data::String("08:15".into())), "08:15");
        assert_eq!(cell_timestamp(&Data::Float(0.25)), "06:00");
    }

    #[test]
    fn garbage_bytes_are_a_parse_error() {
        let err = parse_sheet("bad.xlsx", b"definitely not a workbook").unwrap_err();
        assert!(matches!(err, IngestError::Parse { .. }));
    }
}
