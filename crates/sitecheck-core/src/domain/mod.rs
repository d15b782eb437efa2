//! Domain models for sitecheck.
//!
//! - `CheckResult`: outcome of one named check
//! - `CheckRun`: ordered results of a suite invocation and its exit code
//! - `EpisodeRecord`: metadata entry looked up by slug

pub mod check;
pub mod episode;
pub mod error;
pub mod run;

pub use check::{CheckCategory, CheckOutcome, CheckResult, Confidence, FailureKind};
pub use episode::{find_record_by_slug, EpisodeCatalog, EpisodeRecord};
pub use error::{Result, SiteCheckError};
pub use run::{CheckRun, RunCounts, EXIT_FAILED, EXIT_OK, EXIT_USAGE};
