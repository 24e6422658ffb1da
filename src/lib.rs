//! # nayade-harvest
//!
//! Concurrent harvester for the bathing-water quality data published by the
//! Náyade portal. Every bathing zone has a numeric code; for each code the
//! harvester fetches the location page and the samples page, extracts the
//! fields, attaches crowd-sourced ownership and produces three payloads:
//!
//! - the latest measurement of every sample point,
//! - the full measurement history of every sample point,
//! - a log of the zone codes that could not be processed.
//!
//! ## Quick Start
//!
//! ```no_run
//! use nayade_harvest::{AttributionStore, HarvestConfig, Harvester};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = HarvestConfig {
//!         first_code: 1,
//!         last_code: 50,
//!         workers: 4,
//!         ..Default::default()
//!     };
//!     let attribution = AttributionStore::empty(config.default_owner.clone());
//!
//!     let result = Harvester::new(config, attribution)?.run().await?;
//!     print!("{}", result.latest_csv()?);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Merge of per-slice results into payloads
pub mod aggregate;
/// Crowd-sourced ownership lookup
pub mod attribution;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Label-anchored field extraction
pub mod extractor;
/// Page retrieval
pub mod fetcher;
/// Run orchestration
pub mod harvester;
/// Static partitioning of the code range
pub mod partition;
/// Per-zone worker pipeline
pub mod pipeline;
/// Progress reporting
pub mod progress;
/// Retry logic with bounded attempts
pub mod retry;
/// Core data model
pub mod types;
/// Text helpers
pub mod utils;

// Re-export commonly used types
pub use aggregate::AggregateResult;
pub use attribution::{AttributionKey, AttributionStore};
pub use config::{HarvestConfig, OutputConfig, RetryConfig};
pub use error::{Error, Result, ZoneError};
pub use fetcher::{HttpFetcher, PageSource};
pub use harvester::Harvester;
pub use progress::{ProgressSink, SilentProgress, TerminalProgress};
pub use types::{
    CSV_HEADER, LocationRecord, LogLine, Measurement, OutputRow, SamplePoint, SliceResult,
    ZoneCode, ZoneResult,
};
