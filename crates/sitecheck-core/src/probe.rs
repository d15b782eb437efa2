//! Remote site prober.
//!
//! Status and header probes never follow redirects, so a moved page shows
//! up as a 301 rather than as its target. Body fetches follow them. Every
//! request carries an explicit timeout independent of the poll ceiling.

use std::time::Duration;

use reqwest::header::{HeaderName, CONTENT_LENGTH};
use reqwest::{redirect, Client};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::domain::{Result, SiteCheckError};
use crate::poll::{poll_until, PollOutcome, PollPolicy};
use crate::report::ReportSink;

/// Status reported when no HTTP response was received.
pub const UNREACHABLE: u16 = 0;

const USER_AGENT: &str = concat!("sitecheck/", env!("CARGO_PKG_VERSION"));

/// Status and body of a fetched page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedBody {
    pub status: u16,
    pub body: String,
}

impl FetchedBody {
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// Result of comparing a local size with a remote one.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum SizeComparison {
    Within { local: u64, remote: u64, diff_pct: f64 },
    Beyond { local: u64, remote: u64, diff_pct: f64 },
    /// No remote size (e.g. chunked or compressed transfer).
    Unverifiable { local: u64 },
}

/// Whether `remote` is within `tolerance_pct` percent of `local`.
///
/// An empty local file only matches an empty remote one.
pub fn compare_size_with_tolerance(local: u64, remote: Option<u64>, tolerance_pct: f64) -> SizeComparison {
    let Some(remote) = remote else {
        return SizeComparison::Unverifiable { local };
    };
    let diff_pct = if local == 0 {
        if remote == 0 {
            0.0
        } else {
            100.0
        }
    } else {
        (local.abs_diff(remote) as f64) * 100.0 / local as f64
    };
    if diff_pct <= tolerance_pct {
        SizeComparison::Within {
            local,
            remote,
            diff_pct,
        }
    } else {
        SizeComparison::Beyond {
            local,
            remote,
            diff_pct,
        }
    }
}

/// HTTP(S) prober for a deployed site.
#[derive(Debug, Clone)]
pub struct Prober {
    direct: Client,
    follow: Client,
}

impl Prober {
    pub fn new(request_timeout: Duration) -> Result<Self> {
        let direct = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(request_timeout)
            .redirect(redirect::Policy::none())
            .build()?;
        let follow = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(request_timeout)
            .redirect(redirect::Policy::limited(10))
            .build()?;
        Ok(Self { direct, follow })
    }

    /// HTTP status of `url`, or [`UNREACHABLE`] on any transport error.
    pub async fn status_code(&self, url: &str) -> u16 {
        match self.direct.get(url).send().await {
            Ok(response) => {
                let status = response.status().as_u16();
                debug!(url, status, "Probed");
                status
            }
            Err(e) => {
                warn!(url, error = %e, "Request failed");
                UNREACHABLE
            }
        }
    }

    /// Body of `url` after redirects.
    pub async fn fetch_body(&self, url: &str) -> Result<FetchedBody> {
        let response = self.follow.get(url).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        debug!(url, status, bytes = body.len(), "Fetched body");
        Ok(FetchedBody { status, body })
    }

    /// Value of header `name` on a response from `url`.
    ///
    /// `Err` when the request itself failed. `Ok(None)` when the server
    /// answered without the header or with a non-UTF-8 value.
    pub async fn header(&self, url: &str, name: &str) -> Result<Option<String>> {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| SiteCheckError::InvalidConfig(format!("bad header name {name}: {e}")))?;
        let response = self.direct.get(url).send().await?;
        Ok(response
            .headers()
            .get(&name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string))
    }

    /// Value of header `name`, absent on error, missing header or non-UTF-8 value.
    pub async fn header_value(&self, url: &str, name: &str) -> Option<String> {
        match self.header(url, name).await {
            Ok(value) => value,
            Err(e) => {
                warn!(url, error = %e, "Request failed");
                None
            }
        }
    }

    /// Declared `Content-Length` of `url`.
    pub async fn content_length(&self, url: &str) -> Option<u64> {
        self.header_value(url, CONTENT_LENGTH.as_str())
            .await
            .and_then(|v| v.trim().parse().ok())
    }

    /// Poll `url` until it answers 200, reporting each miss to `sink`.
    pub async fn poll_until_ready(
        &self,
        url: &str,
        policy: PollPolicy,
        sink: &mut dyn ReportSink,
    ) -> PollOutcome<u16> {
        poll_until(
            policy,
            || self.status_code(url),
            |status| *status == 200,
            |tick| {
                let status = if *tick.last == UNREACHABLE {
                    "unreachable".to_string()
                } else {
                    format!("HTTP {}", tick.last)
                };
                sink.progress(&format!(
                    "{url} not ready ({status}), attempt {} at {}s of {}s",
                    tick.attempt,
                    tick.elapsed.as_secs(),
                    tick.ceiling.as_secs()
                ));
            },
        )
        .await
    }
}
