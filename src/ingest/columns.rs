//! Header-to-semantic-column matching policy.
//!
//! Uploads name their columns inconsistently ("Timestamp", "Date/Time",
//! "Temp (°C)", "current"), so matching is a documented policy rather than
//! exact lookup: per semantic column an ordered list of candidate
//! substrings, compared case-insensitively, earlier candidates preferred.
//! The policy is data so it can be tested on its own.

/// Candidate substrings for the time axis, in preference order.
pub const TIME_CANDIDATES: &[&str] = &["timestamp", "date", "time"];

/// Candidate substrings for the value axis, in preference order.
pub const VALUE_CANDIDATES: &[&str] = &["current", "value", "temp"];

/// Candidate substrings for the optional predicted sequence.
pub const PREDICTED_CANDIDATES: &[&str] = &["predicted"];

/// Candidate substrings for the optional threshold override column.
pub const THRESHOLD_CANDIDATES: &[&str] = &["threshold"];

/// Resolved column indices for one upload's header row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ColumnMap {
    pub time: Option<usize>,
    pub value: Option<usize>,
    pub predicted: Option<usize>,
    pub threshold: Option<usize>,
}

impl ColumnMap {
    /// Resolve semantic columns from a header row.
    ///
    /// Columns are claimed in order (time, value, predicted, threshold);
    /// a header index claimed by an earlier semantic column is skipped so
    /// e.g. a lone "temp time" header cannot serve as both axes.
    pub fn from_headers<S: AsRef<str>>(headers: &[S]) -> Self {
        let lowered: Vec<String> = headers
            .iter()
            .map(|h| h.as_ref().trim().to_lowercase())
            .collect();

        let mut claimed = vec![false; lowered.len()];
        let mut claim = |candidates: &[&str]| -> Option<usize> {
            for candidate in candidates {
                for (idx, header) in lowered.iter().enumerate() {
                    if !claimed[idx] && header.contains(candidate) {
                        claimed[idx] = true;
                        return Some(idx);
                    }
                }
            }
            None
        };

        Self {
            time: claim(TIME_CANDIDATES),
            value: claim(VALUE_CANDIDATES),
            predicted: claim(PREDICTED_CANDIDATES),
            threshold: claim(THRESHOLD_CANDIDATES),
        }
    }
}
