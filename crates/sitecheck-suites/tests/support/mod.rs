//! Fixture site trees shared by the suite tests.

#![allow(dead_code)]

use std::fs;
use std::path::Path;

use sitecheck_core::{SiteConfig, XmlValidator};
use sitecheck_suites::CheckContext;

pub const STYLE_HEAD: &str = ".container { max-width: 960px; }\n.episode { margin: 1rem; }\n";
pub const INDEX_HTML: &str = "<!doctype html>\n<html><head><title>The Podcast</title>\n\
<link rel=\"stylesheet\" href=\"style.css\"></head><body></body></html>\n";
pub const SITEMAP_XML: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
<urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n\
<url><loc>https://podcast.example.com/episodes/001-pilot/</loc></url>\n</urlset>\n";
pub const FEED_XML: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
<rss version=\"2.0\"><channel><title>The Podcast</title></channel></rss>\n";

pub fn stylesheet() -> String {
    let mut css = STYLE_HEAD.to_string();
    while css.len() <= 2000 {
        css.push_str(".episode p { line-height: 1.5; }\n");
    }
    css
}

pub fn slugs(count: usize) -> Vec<String> {
    (1..=count).map(|n| format!("{n:03}-episode")).collect()
}

/// A tree that passes every local check.
pub fn valid_site(episodes: usize) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(root, "style.css", &stylesheet());
    write(root, "index.html", INDEX_HTML);
    write(
        root,
        "robots.txt",
        "User-agent: *\nAllow: /\nSitemap: https://podcast.example.com/sitemap.xml\n",
    );
    write(root, "sitemap.xml", SITEMAP_XML);
    write(root, "feed.xml", FEED_XML);
    write(root, "CNAME", "podcast.example.com\n");
    let summary = "# The Podcast\n\nA show about building static sites, one episode at a time.\n".repeat(3);
    write(root, "llms.txt", &summary);
    write(root, "llms-full.txt", &summary.repeat(4));

    let mut records = Vec::new();
    for (i, slug) in slugs(episodes).iter().enumerate() {
        write(
            root,
            &format!("episodes/{slug}/index.html"),
            &format!("<html><head><title>{slug}</title><link href=\"../../style.css\"></head></html>"),
        );
        records.push(format!(
            r#"{{"slug":"{slug}","number":{},"video_id":"vid{:03}"}}"#,
            i + 1,
            i + 1
        ));
    }
    write(root, "episodes.json", &format!("[{}]", records.join(",")));
    dir
}

pub fn write(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

pub fn local_context(root: &Path) -> CheckContext {
    CheckContext::local(root, SiteConfig::default()).with_xml_validator(XmlValidator::heuristic_only())
}
