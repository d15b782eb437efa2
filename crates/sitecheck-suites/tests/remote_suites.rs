//! `check-page` and `check-deploy` against an in-process site.

mod support;

use std::fs;
use std::path::Path;

use sitecheck_core::fakes::{FakeRoute, FakeSite};
use sitecheck_core::{
    CheckOutcome, CheckRun, Confidence, FailureKind, MemorySink, SiteConfig, XmlValidator,
};
use sitecheck_suites::{deploy_suite, page_suite, CheckContext, CheckPipeline, Suite};
use support::{stylesheet, valid_site, FEED_XML, INDEX_HTML, SITEMAP_XML};

fn config_for(site: &FakeSite) -> SiteConfig {
    let mut config = SiteConfig::default().with_base_url(&site.base_url());
    config.poll_interval_secs = 1;
    config.max_wait_secs = 1;
    config.request_timeout_secs = 5;
    config
}

async fn run(suite: &Suite, root: &Path, config: SiteConfig) -> (CheckRun, MemorySink) {
    let mut ctx = CheckContext::remote(root, config)
        .unwrap()
        .with_xml_validator(XmlValidator::heuristic_only());
    let mut sink = MemorySink::new();
    let run = CheckPipeline::run(suite, &mut ctx, &mut sink).await;
    (run, sink)
}

fn find<'a>(run: &'a CheckRun, name: &str) -> &'a sitecheck_core::CheckResult {
    run.results
        .iter()
        .find(|r| r.name == name)
        .unwrap_or_else(|| panic!("no result named {name}"))
}

fn episode_page(slug: &str, video_id: &str) -> String {
    format!(
        "<html><head><title>{slug}</title><link href=\"/style.css\"></head>\
         <body><iframe src=\"https://www.youtube.com/embed/{video_id}\"></iframe></body></html>"
    )
}

/// Serve the fixture tree the way Pages would.
fn publish(site: &FakeSite, root: &Path, slugs: &[String]) {
    site.route("/", FakeRoute::ok(INDEX_HTML));
    site.route(
        "/style.css",
        FakeRoute::ok(stylesheet()).with_header("Content-Type", "text/css; charset=utf-8"),
    );
    site.route("/robots.txt", FakeRoute::ok("User-agent: *\n"));
    site.route("/sitemap.xml", FakeRoute::ok(SITEMAP_XML));
    site.route("/feed.xml", FakeRoute::ok(FEED_XML));
    for llms in ["llms.txt", "llms-full.txt"] {
        let body = fs::read(root.join(llms)).unwrap();
        site.route(&format!("/{llms}"), FakeRoute::ok(body));
    }
    for (i, slug) in slugs.iter().enumerate() {
        site.route(
            &format!("/episodes/{slug}/"),
            FakeRoute::ok(episode_page(slug, &format!("vid{:03}", i + 1))),
        );
    }
}

#[tokio::test]
async fn page_check_passes_for_published_episode() {
    let tree = valid_site(1);
    let site = FakeSite::start().await.unwrap();
    let slug = "001-episode";
    site.route(&format!("/episodes/{slug}/"), FakeRoute::ok(episode_page(slug, "vid001")));
    site.route(
        "/sitemap.xml",
        FakeRoute::ok(SITEMAP_XML.replace("001-pilot", slug)),
    );

    let config = config_for(&site);
    let (run, _) = run(&page_suite(&config, slug), tree.path(), config).await;

    let failures: Vec<_> = run.failures().map(|r| r.name.clone()).collect();
    assert!(failures.is_empty(), "unexpected failures: {failures:?}");
    assert_eq!(run.warned(), 0);
    let embed = find(&run, "/episodes/001-episode/ embeds its video");
    assert_eq!(embed.outcome, CheckOutcome::Pass);
    // Body checks share a single fetch of the page.
    assert_eq!(site.hits("/episodes/001-episode/"), 2);
}

#[tokio::test]
async fn page_check_fails_when_embed_differs() {
    let tree = valid_site(1);
    let site = FakeSite::start().await.unwrap();
    site.route(
        "/episodes/001-episode/",
        FakeRoute::ok(episode_page("001-episode", "somethingElse")),
    );
    site.route("/sitemap.xml", FakeRoute::ok(SITEMAP_XML));

    let config = config_for(&site);
    let (run, sink) = run(&page_suite(&config, "001-episode"), tree.path(), config).await;

    let embed = find(&run, "/episodes/001-episode/ embeds its video");
    assert_eq!(embed.failure, Some(FailureKind::MalformedArtifact));
    assert_eq!(embed.expected.as_deref(), Some("vid001"));
    // The sitemap omission is advisory.
    assert_eq!(find(&run, "sitemap.xml lists 001-episode").outcome, CheckOutcome::Warn);
    assert_eq!(run.exit_code(), 1);
    assert!(sink.contains("1 check(s) failed"));
}

#[tokio::test]
async fn page_check_for_unknown_slug_skips_cross_reference() {
    let tree = valid_site(1);
    let site = FakeSite::start().await.unwrap();
    site.route("/episodes/999-unknown/", FakeRoute::ok(episode_page("999-unknown", "x")));
    site.route("/sitemap.xml", FakeRoute::ok(SITEMAP_XML));

    let config = config_for(&site);
    let (run, _) = run(&page_suite(&config, "999-unknown"), tree.path(), config).await;

    let embed = find(&run, "/episodes/999-unknown/ embeds its video");
    assert_eq!(embed.outcome, CheckOutcome::Skip);
    assert!(embed.details[0].contains("no record for 999-unknown"));
    // Local entry file is missing, which is advisory.
    assert_eq!(
        find(&run, "episodes/999-unknown/index.html exists").outcome,
        CheckOutcome::Warn
    );
    assert_eq!(run.failed(), 0);
}

#[tokio::test]
async fn page_check_reports_missing_page() {
    let tree = valid_site(1);
    let site = FakeSite::start().await.unwrap();

    let config = config_for(&site);
    let (run, _) = run(&page_suite(&config, "001-episode"), tree.path(), config).await;

    let status = find(&run, "/episodes/001-episode/ returns 200");
    assert_eq!(status.failure, Some(FailureKind::UnexpectedStatus));
    assert_eq!(status.actual.as_deref(), Some("HTTP 404"));
    assert_eq!(run.exit_code(), 1);
}

#[tokio::test]
async fn deploy_check_passes_for_healthy_site() {
    let tree = valid_site(3);
    let site = FakeSite::start().await.unwrap();
    publish(&site, tree.path(), &support::slugs(3));

    let config = config_for(&site);
    let (run, _) = run(&deploy_suite(&config), tree.path(), config).await;

    let failures: Vec<_> = run.failures().map(|r| r.name.clone()).collect();
    assert!(failures.is_empty(), "unexpected failures: {failures:?}");
    // The local CNAME names the production host, not the loopback site.
    assert_eq!(find(&run, "CNAME matches the deployed host").outcome, CheckOutcome::Warn);
    assert_eq!(
        find(&run, "every listed episode is reachable").actual.as_deref(),
        Some("3/3 episode pages reachable")
    );
    assert_eq!(run.exit_code(), 0);
}

#[tokio::test]
async fn deploy_check_flags_truncated_stylesheet() {
    let tree = valid_site(1);
    let site = FakeSite::start().await.unwrap();
    publish(&site, tree.path(), &support::slugs(1));
    site.route(
        "/style.css",
        FakeRoute::ok(".container {}").with_header("Content-Type", "text/css"),
    );

    let config = config_for(&site);
    let (run, _) = run(&deploy_suite(&config), tree.path(), config).await;

    let size = find(&run, "/style.css size within 10% of local");
    assert_eq!(size.failure, Some(FailureKind::SizeAnomaly));
    assert_eq!(run.failed(), 1);
}

#[tokio::test]
async fn deploy_check_without_content_length_is_caveated() {
    let tree = valid_site(1);
    let site = FakeSite::start().await.unwrap();
    publish(&site, tree.path(), &support::slugs(1));
    site.route(
        "/style.css",
        FakeRoute::ok(stylesheet())
            .with_header("Content-Type", "text/css")
            .without_content_length(),
    );

    let config = config_for(&site);
    let (run, _) = run(&deploy_suite(&config), tree.path(), config).await;

    let size = find(&run, "/style.css size within 10% of local");
    assert_eq!(size.outcome, CheckOutcome::Pass);
    assert_eq!(size.confidence, Confidence::Heuristic);
}

#[tokio::test]
async fn deploy_check_lists_unreachable_episodes() {
    let tree = valid_site(3);
    let site = FakeSite::start().await.unwrap();
    publish(&site, tree.path(), &support::slugs(3));
    site.remove("/episodes/002-episode/");

    let config = config_for(&site);
    let (run, _) = run(&deploy_suite(&config), tree.path(), config).await;

    let episodes = find(&run, "every listed episode is reachable");
    assert_eq!(episodes.failure, Some(FailureKind::UnexpectedStatus));
    assert_eq!(episodes.actual.as_deref(), Some("2/3 episode pages reachable"));
    assert_eq!(episodes.details, vec!["002-episode (HTTP 404)".to_string()]);
}

#[tokio::test]
async fn deploy_check_against_down_site_fails_every_remote_check() {
    let tree = valid_site(1);
    let site = FakeSite::start().await.unwrap();
    let config = config_for(&site);
    drop(site);
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    let (run, sink) = run(&deploy_suite(&config), tree.path(), config).await;

    let up = &run.results[0];
    assert_eq!(up.failure, Some(FailureKind::UnreachableEndpoint));
    assert!(sink.contains("not ready (unreachable)"));
    assert!(run
        .failures()
        .filter(|r| r.name.ends_with("returns 200"))
        .all(|r| r.failure == Some(FailureKind::UnreachableEndpoint)));
    assert_eq!(run.exit_code(), 1);
}

#[tokio::test]
async fn deploy_check_missing_content_type_is_malformed() {
    let tree = valid_site(1);
    let site = FakeSite::start().await.unwrap();
    publish(&site, tree.path(), &support::slugs(1));
    site.route("/style.css", FakeRoute::ok(stylesheet()));

    let config = config_for(&site);
    let (run, _) = run(&deploy_suite(&config), tree.path(), config).await;

    let header = find(&run, "/style.css is served as text/css");
    assert_eq!(header.failure, Some(FailureKind::MalformedArtifact));
    assert_eq!(header.actual.as_deref(), Some("no content-type header"));
}
