//! Evaluation of a single check.

use std::collections::HashSet;

use sitecheck_core::files::{
    all_subdirectories_have_file, contains_marker, file_exists, file_size, read_trimmed,
};
use sitecheck_core::{
    compare_size_with_tolerance, CheckCategory, CheckResult, Confidence, EpisodeCatalog,
    FailureKind, GuardReport, Marker, PollPolicy, ReportSink, Result, SizeComparison,
    UNREACHABLE,
};
use tracing::debug;

use crate::context::CheckContext;
use crate::spec::{Check, CheckSpec};

/// Interprets [`CheckSpec`]s.
pub struct CheckRunner;

impl CheckRunner {
    /// Evaluate one check. The advisory flag is applied by the caller.
    ///
    /// Errors mean the check could not run (unreadable file, git failure);
    /// ordinary negative findings are returned as failed results.
    pub async fn evaluate(
        check: &Check,
        ctx: &mut CheckContext,
        sink: &mut dyn ReportSink,
    ) -> Result<CheckResult> {
        let name = check.name.as_str();
        let category = check.spec.category();
        debug!(check = %name, "Evaluating");

        match &check.spec {
            CheckSpec::FileExists { path } => Ok(CheckResult::from_bool(
                name,
                category,
                file_exists(&ctx.local_path(path)),
                FailureKind::MissingArtifact,
            )),

            CheckSpec::FileSizeAbove { path, min_bytes } => {
                let size = file_size(&ctx.local_path(path))?;
                Ok(CheckResult::from_bool(
                    name,
                    category,
                    size > *min_bytes,
                    FailureKind::SizeAnomaly,
                )
                .with_expected(format!("more than {min_bytes} bytes"))
                .with_actual(format!("{size} bytes")))
            }

            CheckSpec::ContainsMarker { path, marker } => {
                let found = contains_marker(&ctx.local_path(path), marker)?;
                Ok(marker_result(name, category, found, marker))
            }

            CheckSpec::FileEquals { path, expected } => {
                let actual = read_trimmed(&ctx.local_path(path))?;
                let result = CheckResult::from_bool(
                    name,
                    category,
                    actual == *expected,
                    FailureKind::MalformedArtifact,
                );
                Ok(if result.is_fail() {
                    result.with_expected(expected.clone()).with_actual(actual)
                } else {
                    result
                })
            }

            CheckSpec::WellFormedXml { path } => {
                let verdict = ctx.xml.validate_file(&ctx.local_path(path))?;
                Ok(xml_result(name, category, verdict))
            }

            CheckSpec::DirectoryCoverage { dir, required } => {
                let parent = ctx.local_path(dir);
                if !parent.is_dir() {
                    return Ok(CheckResult::warn(name, category)
                        .with_detail(format!("{dir}/ does not exist; no pages to check")));
                }
                let coverage = all_subdirectories_have_file(&parent, required)?;
                let result = CheckResult::from_bool(
                    name,
                    category,
                    coverage.is_complete(),
                    FailureKind::MissingArtifact,
                )
                .with_actual(format!("{} have {required}", coverage.ratio()));
                Ok(result.with_details(
                    coverage
                        .missing
                        .iter()
                        .map(|slug| format!("{dir}/{slug}/{required} is missing")),
                ))
            }

            CheckSpec::MetadataConsistent { path } => metadata_consistent(name, category, path, ctx),

            CheckSpec::DiffGuard => {
                let report = ctx.guard.detect_deletions(&ctx.repo_dir)?;
                Ok(match report {
                    GuardReport::NotARepository => {
                        CheckResult::skip(name, category, "not a git repository")
                    }
                    GuardReport::Inspected { deleted } if deleted.is_empty() => {
                        CheckResult::pass(name, category)
                            .with_actual("no protected deletions pending")
                    }
                    GuardReport::Inspected { deleted } => {
                        CheckResult::fail(name, category, FailureKind::DestructiveChange)
                            .with_actual(format!("{} protected path(s) deleted", deleted.len()))
                            .with_details(deleted.iter().map(|p| format!("deleted: {p}")))
                    }
                })
            }

            CheckSpec::ReachableWithin { path, policy } => {
                reachable_within(name, category, path, *policy, ctx, sink).await
            }

            CheckSpec::HttpStatus { path, expected } => {
                let status = ctx.prober()?.status_code(&ctx.config.url(path)).await;
                Ok(status_result(name, category, status, *expected))
            }

            CheckSpec::HeaderContains {
                path,
                header,
                needle,
            } => {
                let url = ctx.config.url(path);
                let value = match ctx.prober()?.header(&url, header).await {
                    Ok(value) => value,
                    Err(e) => {
                        return Ok(CheckResult::fail(
                            name,
                            category,
                            FailureKind::UnreachableEndpoint,
                        )
                        .with_expected(needle.clone())
                        .with_actual("unreachable")
                        .with_detail(e.to_string()))
                    }
                };
                Ok(match value {
                    Some(value) if value.to_lowercase().contains(&needle.to_lowercase()) => {
                        CheckResult::pass(name, category).with_actual(value)
                    }
                    Some(value) => {
                        CheckResult::fail(name, category, FailureKind::MalformedArtifact)
                            .with_expected(needle.clone())
                            .with_actual(value)
                    }
                    None => CheckResult::fail(name, category, FailureKind::MalformedArtifact)
                        .with_expected(needle.clone())
                        .with_actual(format!("no {header} header")),
                })
            }

            CheckSpec::BodyContains { path, marker } => {
                let url = ctx.config.url(path);
                let body = match fetched_ok(name, category, &url, ctx).await {
                    Ok(body) => body,
                    Err(result) => return Ok(result),
                };
                Ok(marker_result(name, category, marker.matches(&body)?, marker))
            }

            CheckSpec::RemoteXml { path } => {
                let url = ctx.config.url(path);
                let body = match fetched_ok(name, category, &url, ctx).await {
                    Ok(body) => body,
                    Err(result) => return Ok(result),
                };
                let verdict = ctx.xml.validate_str(&body);
                Ok(xml_result(name, category, verdict))
            }

            CheckSpec::SizeMatchesLocal {
                path,
                tolerance_pct,
            } => {
                let local = file_size(&ctx.local_path(path))?;
                let remote = ctx.prober()?.content_length(&ctx.config.url(path)).await;
                Ok(size_result(
                    name,
                    category,
                    compare_size_with_tolerance(local, remote, *tolerance_pct),
                    *tolerance_pct,
                ))
            }

            CheckSpec::DomainMatchesBaseUrl { path } => {
                let declared = read_trimmed(&ctx.local_path(path))?;
                let host = ctx.config.base_host().unwrap_or_default();
                Ok(CheckResult::from_bool(
                    name,
                    category,
                    declared.eq_ignore_ascii_case(&host),
                    FailureKind::MalformedArtifact,
                )
                .with_expected(host)
                .with_actual(declared))
            }

            CheckSpec::EpisodesReachable { metadata } => {
                episodes_reachable(name, category, metadata, ctx).await
            }

            CheckSpec::EmbedMatches { slug } => embed_matches(name, category, slug, ctx).await,

            CheckSpec::SitemapListsSlug { sitemap, slug } => {
                let url = ctx.config.url(sitemap);
                let body = match fetched_ok(name, category, &url, ctx).await {
                    Ok(body) => body,
                    Err(result) => return Ok(result),
                };
                let needle = format!("/{}/{}", ctx.config.content_dir, slug);
                Ok(CheckResult::from_bool(
                    name,
                    category,
                    body.contains(&needle),
                    FailureKind::MalformedArtifact,
                )
                .with_expected(needle))
            }
        }
    }
}

fn marker_result(name: &str, category: CheckCategory, found: bool, marker: &Marker) -> CheckResult {
    let result = CheckResult::from_bool(name, category, found, FailureKind::MalformedArtifact);
    if found {
        result
    } else {
        result.with_expected(marker.to_string()).with_actual("not found")
    }
}

fn xml_result(name: &str, category: CheckCategory, verdict: sitecheck_core::XmlVerdict) -> CheckResult {
    let result = CheckResult::from_bool(
        name,
        category,
        verdict.well_formed,
        FailureKind::MalformedArtifact,
    )
    .with_confidence(verdict.confidence);
    match verdict.reason {
        Some(reason) => result.with_detail(reason),
        None => result,
    }
}

fn status_result(name: &str, category: CheckCategory, status: u16, expected: u16) -> CheckResult {
    if status == expected {
        return CheckResult::pass(name, category).with_actual(format!("HTTP {status}"));
    }
    let (kind, actual) = if status == UNREACHABLE {
        (FailureKind::UnreachableEndpoint, "unreachable".to_string())
    } else {
        (FailureKind::UnexpectedStatus, format!("HTTP {status}"))
    };
    CheckResult::fail(name, category, kind)
        .with_expected(format!("HTTP {expected}"))
        .with_actual(actual)
}

fn size_result(
    name: &str,
    category: CheckCategory,
    comparison: SizeComparison,
    tolerance_pct: f64,
) -> CheckResult {
    match comparison {
        SizeComparison::Within {
            local,
            remote,
            diff_pct,
        } => CheckResult::pass(name, category)
            .with_actual(format!("local {local} bytes, remote {remote} bytes ({diff_pct:.1}% apart)")),
        SizeComparison::Beyond {
            local,
            remote,
            diff_pct,
        } => CheckResult::fail(name, category, FailureKind::SizeAnomaly)
            .with_expected(format!("within {tolerance_pct}% of {local} bytes"))
            .with_actual(format!("{remote} bytes ({diff_pct:.1}% apart)")),
        SizeComparison::Unverifiable { local } => CheckResult::pass(name, category)
            .with_confidence(Confidence::Heuristic)
            .with_actual(format!("local {local} bytes, remote size unknown"))
            .with_detail("no Content-Length (compressed or chunked response); size not compared"),
    }
}

/// Body of a 200 response, or the failed result to record instead.
async fn fetched_ok(
    name: &str,
    category: CheckCategory,
    url: &str,
    ctx: &mut CheckContext,
) -> std::result::Result<String, CheckResult> {
    match ctx.body(url).await {
        Ok(fetched) if fetched.is_ok() => Ok(fetched.body),
        Ok(fetched) => Err(status_result(name, category, fetched.status, 200)),
        Err(e) => Err(
            CheckResult::fail(name, category, FailureKind::UnreachableEndpoint)
                .with_actual("unreachable")
                .with_detail(e),
        ),
    }
}

fn metadata_consistent(
    name: &str,
    category: CheckCategory,
    path: &str,
    ctx: &CheckContext,
) -> Result<CheckResult> {
    let catalog = match EpisodeCatalog::load(&ctx.local_path(path)) {
        Ok(catalog) => catalog,
        Err(e) => {
            return Ok(CheckResult::fail(name, category, FailureKind::MalformedArtifact)
                .with_actual("unparseable")
                .with_detail(e.to_string()))
        }
    };

    let mut notes = Vec::new();
    let mut seen = HashSet::new();
    for record in &catalog.records {
        if !seen.insert(record.slug.as_str()) {
            notes.push(format!("{}: listed more than once", record.slug));
        }
        let dir = ctx.local_path(&ctx.config.content_dir).join(&record.slug);
        if !dir.is_dir() {
            notes.push(format!(
                "{}: no {}/{}/ directory",
                record.slug, ctx.config.content_dir, record.slug
            ));
        }
    }

    let actual = format!("{} record(s)", catalog.len());
    Ok(if notes.is_empty() {
        CheckResult::pass(name, category).with_actual(actual)
    } else {
        CheckResult::warn(name, category)
            .with_actual(actual)
            .with_details(notes)
    })
}

async fn reachable_within(
    name: &str,
    category: CheckCategory,
    path: &str,
    policy: PollPolicy,
    ctx: &CheckContext,
    sink: &mut dyn ReportSink,
) -> Result<CheckResult> {
    let url = ctx.config.url(path);
    let outcome = ctx.prober()?.poll_until_ready(&url, policy, sink).await;
    let secs = outcome.elapsed.as_secs();
    Ok(if outcome.ready {
        CheckResult::pass(name, category).with_actual(format!(
            "ready after {secs}s ({} attempt(s))",
            outcome.attempts
        ))
    } else {
        let last = match outcome.last {
            Some(UNREACHABLE) | None => "unreachable".to_string(),
            Some(status) => format!("HTTP {status}"),
        };
        CheckResult::fail(name, category, FailureKind::UnreachableEndpoint)
            .with_expected(format!("HTTP 200 within {}s", policy.ceiling.as_secs()))
            .with_actual(format!("{last} after {secs}s"))
    })
}

async fn episodes_reachable(
    name: &str,
    category: CheckCategory,
    metadata: &str,
    ctx: &CheckContext,
) -> Result<CheckResult> {
    let catalog = match EpisodeCatalog::load(&ctx.local_path(metadata)) {
        Ok(catalog) => catalog,
        Err(e) => {
            return Ok(CheckResult::skip(
                name,
                category,
                format!("{metadata} unreadable: {e}"),
            ))
        }
    };
    let prober = ctx.prober()?;

    let mut misses = Vec::new();
    let mut any_unreachable = false;
    for record in &catalog.records {
        let status = prober.status_code(&ctx.config.episode_url(&record.slug)).await;
        if status != 200 {
            any_unreachable |= status == UNREACHABLE;
            let shown = if status == UNREACHABLE {
                "unreachable".to_string()
            } else {
                format!("HTTP {status}")
            };
            misses.push(format!("{} ({shown})", record.slug));
        }
    }

    let reachable = catalog.len() - misses.len();
    let actual = format!("{reachable}/{} episode pages reachable", catalog.len());
    Ok(if misses.is_empty() {
        CheckResult::pass(name, category).with_actual(actual)
    } else {
        let kind = if any_unreachable {
            FailureKind::UnreachableEndpoint
        } else {
            FailureKind::UnexpectedStatus
        };
        CheckResult::fail(name, category, kind)
            .with_actual(actual)
            .with_details(misses)
    })
}

async fn embed_matches(
    name: &str,
    category: CheckCategory,
    slug: &str,
    ctx: &mut CheckContext,
) -> Result<CheckResult> {
    let metadata = ctx.config.metadata_file.clone();
    let catalog = match EpisodeCatalog::load(&ctx.local_path(&metadata)) {
        Ok(catalog) => catalog,
        Err(e) => {
            return Ok(CheckResult::skip(
                name,
                category,
                format!("{metadata} unavailable: {e}"),
            ))
        }
    };
    let Some(record) = catalog.find(slug) else {
        return Ok(CheckResult::skip(
            name,
            category,
            format!("no record for {slug} in {metadata}"),
        ));
    };
    let Some(video_id) = record.video_id.clone() else {
        return Ok(CheckResult::skip(
            name,
            category,
            format!("episode {} declares no embedded video", record.number),
        ));
    };

    let url = ctx.config.episode_url(slug);
    let body = match fetched_ok(name, category, &url, ctx).await {
        Ok(body) => body,
        Err(result) => return Ok(result),
    };
    let found = body.contains(&video_id);
    let result = CheckResult::from_bool(name, category, found, FailureKind::MalformedArtifact)
        .with_expected(video_id);
    Ok(if found {
        result
    } else {
        result.with_actual("not embedded")
    })
}
