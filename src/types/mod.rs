//! Core domain types shared across the crate.

mod report;
mod series;

pub use report::{next_report_id, Fingerprint, Report};
pub use series::{Parameter, Series, UnknownParameter, DEFAULT_THRESHOLD};
