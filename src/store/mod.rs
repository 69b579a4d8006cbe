//! Report persistence: a pluggable key-value substrate plus the
//! category-keyed report collection layered on top.

mod kv;
mod reports;

pub use kv::{KvStore, MemoryKv, SledKv, StoreError};
pub use reports::{AddOutcome, ReportStore, STORE_KEY};
