//! Persisted report snapshots and their duplicate-detection identity.

use super::series::{Parameter, Series, DEFAULT_THRESHOLD};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Last id handed out by [`next_report_id`].
static LAST_ID: AtomicU64 = AtomicU64::new(0);

/// Allocate a creation-time-derived report id.
///
/// Ids are millisecond timestamps bumped past the previous allocation, so
/// two reports created within the same millisecond still get distinct,
/// strictly increasing ids. Stored ids stay numeric for compatibility with
/// documents written by the legacy surface (which used raw epoch millis).
pub fn next_report_id() -> u64 {
    let now = Utc::now().timestamp_millis().max(0) as u64;
    let prev = LAST_ID
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
            Some(now.max(last + 1))
        })
        .unwrap_or(0);
    now.max(prev + 1)
}

/// Derived identity for an uploaded dataset.
///
/// Built from the file name, the first three values, and the value count:
/// `"{fileName}_{v0}_{v1}_{v2}_{count}"`. Two reports are duplicates iff
/// their fingerprints are equal.
///
/// Known-weak on purpose: two different datasets sharing a file name,
/// length, and leading three values collide. The dedup behavior is
/// user-observable, so the scheme is kept as-is rather than upgraded to a
/// content digest.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn of(file_name: &str, values: &[f64]) -> Self {
        let mut key = String::from(file_name);
        for v in values.iter().take(3) {
            key.push('_');
            key.push_str(&fmt_value(*v));
        }
        key.push('_');
        key.push_str(&values.len().to_string());
        Fingerprint(key)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Shortest-form float rendering (`40` not `40.0`), matching how the
/// legacy surface stringified values inside stored fingerprints.
fn fmt_value(v: f64) -> String {
    format!("{}", v)
}

/// A persisted, named snapshot of a [`Series`] plus provenance metadata.
///
/// Immutable once stored — reports are only ever appended or removed
/// wholesale. Field names serialize in camelCase so documents written by
/// the legacy dashboard load unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: u64,
    pub name: String,
    pub parameter: Parameter,
    pub file_name: String,
    /// RFC 3339 upload instant.
    pub upload_date: String,
    /// Cached `values.len()`.
    #[serde(default)]
    pub data_points: usize,
    #[serde(default)]
    pub times: Vec<String>,
    #[serde(default)]
    pub values: Vec<f64>,
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

fn default_threshold() -> f64 {
    DEFAULT_THRESHOLD
}

impl Report {
    /// Create a report from a parsed series.
    ///
    /// When `name` is `None` a label is generated the way the dashboard
    /// did: `"Temperature Report - Jun 4, 02:45 PM"`.
    pub fn new(parameter: Parameter, file_name: &str, name: Option<String>, series: &Series) -> Self {
        let now = Utc::now();
        let name = name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| format!("{} Report - {}", parameter, now.format("%b %-d, %I:%M %p")));

        Self {
            id: next_report_id(),
            name,
            parameter,
            file_name: file_name.to_string(),
            upload_date: now.to_rfc3339(),
            data_points: series.values.len(),
            times: series.timestamps.clone(),
            values: series.values.clone(),
            threshold: series.threshold,
        }
    }

    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::of(&self.file_name, &self.values)
    }

    /// Rebuild the embedded series (e.g. to hand to the playback driver).
    pub fn series(&self) -> Series {
        Series {
            timestamps: self.times.clone(),
            values: self.values.clone(),
            threshold: self.threshold,
        }
    }
}
