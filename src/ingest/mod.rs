//! File-upload ingestion: raw bytes in, normalized [`Series`] out.
//!
//! Pure transforms — reading the file into bytes is the caller's job.
//! The format gate runs before any parsing: an unsupported extension is
//! rejected without touching the payload.

mod columns;
mod csv;
mod sheet;

pub use columns::{
    ColumnMap, PREDICTED_CANDIDATES, THRESHOLD_CANDIDATES, TIME_CANDIDATES, VALUE_CANDIDATES,
};

use crate::stats::SeriesStats;
use crate::types::{Series, DEFAULT_THRESHOLD};
use serde::Serialize;
use thiserror::Error;

/// Upload parsing errors.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Extension outside the accepted set — raised before parsing.
    #[error("unsupported file format: {0} (expected .csv, .xlsx, or .xls)")]
    UnsupportedFormat(String),

    /// Recognized extension whose content could not be decoded.
    #[error("failed to parse {file}: {message}")]
    Parse { file: String, message: String },
}

/// Declared upload format, derived from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadFormat {
    Csv,
    Spreadsheet,
}

impl UploadFormat {
    /// Classify a file name by extension, case-insensitively.
    pub fn from_file_name(name: &str) -> Option<Self> {
        let lower = name.to_lowercase();
        if lower.ends_with(".csv") {
            Some(UploadFormat::Csv)
        } else if lower.ends_with(".xlsx") || lower.ends_with(".xls") {
            Some(UploadFormat::Spreadsheet)
        } else {
            None
        }
    }
}

/// Intermediate parse output shared by both format paths.
#[derive(Debug, Default, Clone)]
pub(crate) struct RawSeries {
    pub timestamps: Vec<String>,
    pub values: Vec<f64>,
    pub predicted: Vec<f64>,
    pub threshold: Option<f64>,
}

/// Result of ingesting one upload.
#[derive(Debug, Clone)]
pub struct ParsedUpload {
    pub file_name: String,
    pub series: Series,
    /// Optional secondary forecast sequence; independent of the
    /// timestamps/values lockstep.
    pub predicted: Vec<f64>,
    pub preview: UploadPreview,
}

/// Summary shown to the user before an upload is applied.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadPreview {
    pub file_name: String,
    pub data_points: usize,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub average: Option<f64>,
    pub threshold: f64,
    /// `"first - last"` timestamp span, absent for an empty series.
    pub time_range: Option<String>,
}

impl UploadPreview {
    fn of(file_name: &str, series: &Series) -> Self {
        let stats = SeriesStats::compute(&series.values, series.threshold);
        let time_range = match (series.timestamps.first(), series.timestamps.last()) {
            (Some(first), Some(last)) => Some(format!("{} - {}", first, last)),
            _ => None,
        };

        Self {
            file_name: file_name.to_string(),
            data_points: series.values.len(),
            min: stats.map(|s| s.min),
            max: stats.map(|s| s.max),
            average: stats.map(|s| s.average),
            threshold: series.threshold,
            time_range,
        }
    }
}

/// Parse raw upload bytes into a normalized series.
///
/// Zero valid data rows is an empty series, not an error. CSV payloads
/// must be UTF-8; anything else is a parse error for that file.
pub fn ingest(file_name: &str, bytes: &[u8]) -> Result<ParsedUpload, IngestError> {
    let format = UploadFormat::from_file_name(file_name)
        .ok_or_else(|| IngestError::UnsupportedFormat(file_name.to_string()))?;

    let raw = match format {
        UploadFormat::Csv => {
            let text = std::str::from_utf8(bytes).map_err(|e| IngestError::Parse {
                file: file_name.to_string(),
                message: format!("not valid UTF-8: {}", e),
            })?;
            csv::parse_csv(text)
        }
        UploadFormat::Spreadsheet => sheet::parse_sheet(file_name, bytes)?,
    };

    let series = Series {
        timestamps: raw.timestamps,
        values: raw.values,
        threshold: raw.threshold.unwrap_or(DEFAULT_THRESHOLD),
    };
    debug_assert_eq!(series.timestamps.len(), series.values.len());

    tracing::debug!(
        file = file_name,
        rows = series.values.len(),
        threshold = series.threshold,
        "upload parsed"
    );

    Ok(ParsedUpload {
        file_name: file_name.to_string(),
        preview: UploadPreview::of(file_name, &series),
        predicted: raw.predicted,
        series,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_gate_runs_before_parsing() {
        let err = ingest("readings.pdf", b"%PDF-1.4").unwrap_err();
        assert!(matches!(err, IngestError::UnsupportedFormat(_)));
    }

    #[test]
    fn extension_matching_is_case_insensitive() {
        assert_eq!(UploadFormat::from_file_name("A.CSV"), Some(UploadFormat::Csv));
        assert_eq!(UploadFormat::from_file_name("b.XlSx"), Some(UploadFormat::Spreadsheet));
        assert_eq!(UploadFormat::from_file_name("c.xls"), Some(UploadFormat::Spreadsheet));
        assert_eq!(UploadFormat::from_file_name("d.txt"), None);
    }

    #[test]
    fn csv_upload_produces_series_and_preview() {
        let parsed = ingest(
            "cooldown.csv",
            b"Timestamp,Current\n00:00,40.0\n00:01,38.0\n00:02,36.0\n",
        )
        .unwrap();
        assert_eq!(parsed.series.values, vec![40.0, 38.0, 36.0]);
        assert_eq!(parsed.series.threshold, DEFAULT_THRESHOLD);
        assert_eq!(parsed.preview.data_points, 3);
        assert_eq!(parsed.preview.min, Some(36.0));
        assert_eq!(parsed.preview.max, Some(40.0));
        assert_eq!(parsed.preview.average, Some(38.0));
        assert_eq!(parsed.preview.time_range.as_deref(), Some("00:00 - 00:02"));
    }

    #[test]
    fn empty_upload_previews_without_numbers() {
        let parsed = ingest("empty.csv", b"Timestamp,Current\n").unwrap();
        assert!(parsed.series.is_empty());
        assert_eq!(parsed.preview.data_points, 0);
        assert_eq!(parsed.preview.min, None);
        assert_eq!(parsed.preview.time_range, None);
    }

    #[test]
    fn non_utf8_csv_is_a_parse_error() {
        let err = ingest("latin.csv", &[0x54, 0xFF, 0xFE, 0x00]).unwrap_err();
        assert!(matches!(err, IngestError::Parse { .. }));
    }

    #[test]
    fn lockstep_invariant_holds_for_all_inputs() {
        let parsed = ingest(
            "mixed.csv",
            b"Time,Value\n08:00,1.5\nbroken,\n08:02,2.5\n08:03,oops\n",
        )
        .unwrap();
        assert_eq!(parsed.series.timestamps.len(), parsed.series.values.len());
        assert_eq!(parsed.series.values, vec![1.5, 2.5]);
    }
}
