//! CSV upload parsing.

use super::columns::ColumnMap;
use super::RawSeries;

/// Split a CSV line respecting quoted fields (handles commas inside quotes).
/// Returns owned strings because quoted fields need unquoting.
pub(crate) fn csv_split(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' => {
                if in_quotes {
                    // Check for escaped quote ("")
                    if chars.peek() == Some(&'"') {
                        current.push('"');
                        chars.next();
                    } else {
                        in_quotes = false;
                    }
                } else {
                    in_quotes = true;
                }
            }
            ',' if !in_quotes => {
                fields.push(current.clone());
                current.clear();
            }
            _ => current.push(ch),
        }
    }
    fields.push(current);
    fields
}

/// Parse CSV text into a raw series.
///
/// The first line is the header; data rows whose value column fails to
/// parse as a float are dropped from timestamps and values in lockstep.
/// A file with a header but no parseable rows yields an empty series.
pub(crate) fn parse_csv(text: &str) -> RawSeries {
    let mut lines = text.trim().lines();

    let Some(header) = lines.next() else {
        return RawSeries::default();
    };
    let headers = csv_split(header);
    let map = ColumnMap::from_headers(&headers);

    let mut out = RawSeries::default();

    for line in lines {
        if line.trim().is_empty() {
            continue;
        }
        let fields = csv_split(line);

        let value = map
            .value
            .and_then(|i| fields.get(i))
            .and_then(|f| f.trim().parse::<f64>().ok());
        let Some(value) = value else {
            continue;
        };

        let timestamp = map
            .time
            .and_then(|i| fields.get(i))
            .map(|f| f.trim().to_string())
            .unwrap_or_default();

        out.timestamps.push(timestamp);
        out.values.push(value);

        if let Some(p) = map
            .predicted
            .and_then(|i| fields.get(i))
            .and_then(|f| f.trim().parse::<f64>().ok())
        {
            out.predicted.push(p);
        }

        if out.threshold.is_none() {
            out.threshold = map
                .threshold
                .and_then(|i| fields.get(i))
                .and_then(|f| f.trim().parse::<f64>().ok());
        }
    }

    out
}
