//! Sentra: Predictive Maintenance Telemetry Core
//!
//! Client-uploaded sensor exports in, dashboard-ready state out.
//!
//! ## Architecture
//!
//! - **Ingest**: CSV / spreadsheet uploads → normalized reading series
//! - **Stats**: descriptive statistics and a two-window trend signal
//! - **Store**: per-parameter report collections over a key-value substrate
//! - **Playback**: looping 1 Hz replay of the active series for the live display
//! - **API**: Axum surface tying the pieces together, session-gated

pub mod api;
pub mod auth;
pub mod config;
pub mod ingest;
pub mod insight;
pub mod playback;
pub mod stats;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use api::{create_app, DashboardState};
pub use auth::{Session, SessionProvider, StaticSessionProvider};
pub use config::Config;
pub use ingest::{ingest, IngestError, ParsedUpload, UploadPreview};
pub use insight::{InsightClient, InsightError};
pub use playback::{PlaybackDriver, PlaybackPhase};
pub use stats::{SeriesStats, Trend, TrendDirection};
pub use store::{AddOutcome, KvStore, MemoryKv, ReportStore, SledKv, StoreError};
pub use types::{Fingerprint, Parameter, Report, Series, DEFAULT_THRESHOLD};
