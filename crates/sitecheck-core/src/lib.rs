//! sitecheck core library
//!
//! Building blocks for validating a static podcast site before a push and
//! after a deploy: the check/run model, configuration, local file and XML
//! validation, the git diff guard, and the HTTP prober with bounded polling.

pub mod config;
pub mod domain;
pub mod fakes;
pub mod files;
pub mod git;
pub mod guard;
pub mod poll;
pub mod probe;
pub mod report;
pub mod telemetry;
pub mod xml;

pub use config::{CriticalFileSet, Marker, SiteConfig};
pub use domain::{
    find_record_by_slug, CheckCategory, CheckOutcome, CheckResult, CheckRun, Confidence,
    EpisodeCatalog, EpisodeRecord, FailureKind, Result, RunCounts, SiteCheckError, EXIT_FAILED,
    EXIT_OK, EXIT_USAGE,
};
pub use files::DirectoryCoverage;
pub use guard::{protected_deletions, DiffGuard, GuardReport, ProtectedPaths};
pub use poll::{poll_until, PollOutcome, PollPolicy, PollTick};
pub use probe::{compare_size_with_tolerance, FetchedBody, Prober, SizeComparison, UNREACHABLE};
pub use report::{ConsoleSink, MemorySink, ReportSink};
pub use telemetry::init_tracing;
pub use xml::{XmlValidator, XmlVerdict};
