//! sitecheck suites
//!
//! Declarative check suites and the sequential runner that evaluates them:
//! - `check-local`: pre-push validation of the site tree
//! - `check-page`: one deployed episode page
//! - `check-deploy`: the live site after a deploy

pub mod context;
pub mod gate;
pub mod pipeline;
pub mod runner;
pub mod spec;
pub mod suites;

pub use context::CheckContext;
pub use gate::{ExitGate, GateVerdict};
pub use pipeline::CheckPipeline;
pub use runner::CheckRunner;
pub use spec::{Check, CheckSpec, Section, Step, Suite};
pub use suites::{deploy_suite, local_suite, page_suite, DEPLOY_SUITE, LOCAL_SUITE, PAGE_SUITE};
