//! The three suites: pre-push, single page, and post-deploy.

use sitecheck_core::{Marker, PollPolicy, SiteConfig};

use crate::spec::{Check, CheckSpec, Section, Suite};

pub const LOCAL_SUITE: &str = "check-local";
pub const PAGE_SUITE: &str = "check-page";
pub const DEPLOY_SUITE: &str = "check-deploy";

fn exists(path: &str) -> Check {
    Check::new(
        format!("{path} exists"),
        CheckSpec::FileExists {
            path: path.to_string(),
        },
    )
}

fn size_above(path: &str, min_bytes: u64) -> Check {
    Check::new(
        format!("{path} is larger than {min_bytes} bytes"),
        CheckSpec::FileSizeAbove {
            path: path.to_string(),
            min_bytes,
        },
    )
}

fn contains(path: &str, marker: &Marker) -> Check {
    Check::new(
        format!("{path} contains {marker}"),
        CheckSpec::ContainsMarker {
            path: path.to_string(),
            marker: marker.clone(),
        },
    )
}

fn well_formed(path: &str) -> Check {
    Check::new(
        format!("{path} is well-formed XML"),
        CheckSpec::WellFormedXml {
            path: path.to_string(),
        },
    )
}

fn returns_200(label: &str, path: &str) -> Check {
    Check::new(
        format!("{label} returns 200"),
        CheckSpec::HttpStatus {
            path: path.to_string(),
            expected: 200,
        },
    )
}

fn body_contains(label: &str, path: &str, marker: &Marker) -> Check {
    Check::new(
        format!("{label} contains {marker}"),
        CheckSpec::BodyContains {
            path: path.to_string(),
            marker: marker.clone(),
        },
    )
}

/// Pre-push validation of the working tree.
pub fn local_suite(config: &SiteConfig) -> Suite {
    let critical = config
        .critical_files
        .iter()
        .fold(Section::new("Critical files"), |section, file| {
            section.check(exists(file))
        });

    let stylesheet = Section::new("Stylesheet").gated(&config.stylesheet, {
        let mut checks = vec![size_above(&config.stylesheet, config.min_stylesheet_bytes)];
        checks.extend(
            config
                .stylesheet_markers
                .iter()
                .map(|m| contains(&config.stylesheet, m)),
        );
        checks
    });

    let homepage = Section::new("Homepage").gated(
        &config.homepage,
        config
            .homepage_markers
            .iter()
            .map(|m| contains(&config.homepage, m))
            .collect(),
    );

    let domain = Section::new("Custom domain").gated(
        &config.domain_file,
        vec![Check::new(
            format!("{} matches {}", config.domain_file, config.expected_domain),
            CheckSpec::FileEquals {
                path: config.domain_file.clone(),
                expected: config.expected_domain.clone(),
            },
        )],
    );

    let seo = Section::new("SEO and feeds")
        .gated(
            &config.robots,
            vec![Check::new(
                format!("{} declares a Sitemap", config.robots),
                CheckSpec::ContainsMarker {
                    path: config.robots.clone(),
                    marker: Marker::pattern(r"(?im)^\s*sitemap:"),
                },
            )
            .advisory()],
        )
        .gated(
            &config.sitemap,
            vec![
                well_formed(&config.sitemap),
                contains(&config.sitemap, &Marker::literal("<urlset")),
            ],
        )
        .gated(
            &config.feed,
            vec![
                well_formed(&config.feed),
                contains(&config.feed, &Marker::literal("<rss")),
                contains(&config.feed, &Marker::literal("<channel>")),
            ],
        );

    let llms = config
        .llms_files
        .iter()
        .fold(Section::new("LLM summaries"), |section, file| {
            section.gated(
                file,
                vec![size_above(file, config.min_llms_bytes).advisory()],
            )
        });

    let episodes = Section::new("Episode pages")
        .check(Check::new(
            format!(
                "every {}/ subdirectory has {}",
                config.content_dir, config.index_file
            ),
            CheckSpec::DirectoryCoverage {
                dir: config.content_dir.clone(),
                required: config.index_file.clone(),
            },
        ))
        .gated(
            &config.metadata_file,
            vec![Check::new(
                format!("{} is consistent with {}/", config.metadata_file, config.content_dir),
                CheckSpec::MetadataConsistent {
                    path: config.metadata_file.clone(),
                },
            )],
        );

    let pending = Section::new("Pending changes").check(Check::new(
        "no protected files deleted",
        CheckSpec::DiffGuard,
    ));

    Suite::new(LOCAL_SUITE)
        .section(critical)
        .section(stylesheet)
        .section(homepage)
        .section(domain)
        .section(seo)
        .section(llms)
        .section(episodes)
        .section(pending)
}

/// Checks for one deployed episode page.
pub fn page_suite(config: &SiteConfig, slug: &str) -> Suite {
    let entry = config.episode_entry(slug).to_string_lossy().replace('\\', "/");
    let page_path = format!("{}/{}/", config.content_dir, slug);
    let label = format!("/{page_path}");

    let mut section = Section::new(format!("Episode {slug}"))
        .check(exists(&entry).advisory())
        .check(returns_200(&label, &page_path));
    for marker in &config.homepage_markers {
        section = section.check(body_contains(&label, &page_path, marker));
    }
    section = section
        .check(Check::new(
            format!("{label} embeds its video"),
            CheckSpec::EmbedMatches {
                slug: slug.to_string(),
            },
        ))
        .check(
            Check::new(
                format!("{} lists {slug}", config.sitemap),
                CheckSpec::SitemapListsSlug {
                    sitemap: config.sitemap.clone(),
                    slug: slug.to_string(),
                },
            )
            .advisory(),
        );

    Suite::new(PAGE_SUITE).section(section)
}

/// Post-deploy checks against the live site.
pub fn deploy_suite(config: &SiteConfig) -> Suite {
    let policy = PollPolicy::new(config.poll_interval(), config.max_wait());

    let reachability = Section::new("Reachability").check(Check::new(
        format!("{} is up", config.base_url),
        CheckSpec::ReachableWithin {
            path: "/".to_string(),
            policy,
        },
    ));

    let mut files = Section::new("Deployed files").check(returns_200("/", "/"));
    for path in [&config.stylesheet, &config.robots, &config.sitemap, &config.feed]
        .into_iter()
        .chain(config.llms_files.iter())
    {
        files = files.check(returns_200(&format!("/{path}"), path));
    }

    let stylesheet = Section::new("Stylesheet")
        .check(Check::new(
            format!("/{} is served as text/css", config.stylesheet),
            CheckSpec::HeaderContains {
                path: config.stylesheet.clone(),
                header: "content-type".to_string(),
                needle: "text/css".to_string(),
            },
        ))
        .gated(
            &config.stylesheet,
            vec![Check::new(
                format!(
                    "/{} size within {}% of local",
                    config.stylesheet, config.size_tolerance_pct
                ),
                CheckSpec::SizeMatchesLocal {
                    path: config.stylesheet.clone(),
                    tolerance_pct: config.size_tolerance_pct,
                },
            )],
        );

    let homepage = config
        .homepage_markers
        .iter()
        .fold(Section::new("Homepage"), |section, marker| {
            section.check(body_contains("/", "/", marker))
        });

    let xml = Section::new("Sitemap and feed")
        .check(Check::new(
            format!("/{} is well-formed XML", config.sitemap),
            CheckSpec::RemoteXml {
                path: config.sitemap.clone(),
            },
        ))
        .check(Check::new(
            format!("/{} is well-formed XML", config.feed),
            CheckSpec::RemoteXml {
                path: config.feed.clone(),
            },
        ));

    let domain = Section::new("Custom domain").gated(
        &config.domain_file,
        vec![Check::new(
            format!("{} matches the deployed host", config.domain_file),
            CheckSpec::DomainMatchesBaseUrl {
                path: config.domain_file.clone(),
            },
        )
        .advisory()],
    );

    let episodes = Section::new("Episodes").gated(
        &config.metadata_file,
        vec![Check::new(
            "every listed episode is reachable",
            CheckSpec::EpisodesReachable {
                metadata: config.metadata_file.clone(),
            },
        )],
    );

    Suite::new(DEPLOY_SUITE)
        .section(reachability)
        .section(files)
        .section(stylesheet)
        .section(homepage)
        .section(xml)
        .section(domain)
        .section(episodes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_suite_has_one_existence_check_per_critical_file() {
        let config = SiteConfig::default();
        let suite = local_suite(&config);
        let existence = suite
            .checks()
            .filter(|c| matches!(c.spec, CheckSpec::FileExists { .. }))
            .count();
        assert_eq!(existence, config.critical_files.len());
        assert!(!suite.is_remote());
    }

    #[test]
    fn test_local_suite_ends_with_diff_guard() {
        let suite = local_suite(&SiteConfig::default());
        let last = suite.checks().last().unwrap();
        assert_eq!(last.spec, CheckSpec::DiffGuard);
    }

    #[test]
    fn test_page_suite_targets_trailing_slash_url() {
        let suite = page_suite(&SiteConfig::default(), "042-rust");
        assert!(suite.is_remote());
        assert!(suite.checks().any(|c| c.spec
            == CheckSpec::HttpStatus {
                path: "episodes/042-rust/".to_string(),
                expected: 200,
            }));
        let first = suite.checks().next().unwrap();
        assert_eq!(first.name, "episodes/042-rust/index.html exists");
        assert!(first.advisory);
    }

    #[test]
    fn test_deploy_suite_starts_with_reachability() {
        let config = SiteConfig::default();
        let suite = deploy_suite(&config);
        let first = suite.checks().next().unwrap();
        assert_eq!(
            first.spec,
            CheckSpec::ReachableWithin {
                path: "/".to_string(),
                policy: PollPolicy::from_secs(5, 90),
            }
        );
    }

    #[test]
    fn test_deploy_suite_checks_every_llms_file() {
        let config = SiteConfig::default();
        let suite = deploy_suite(&config);
        for file in &config.llms_files {
            assert!(suite.checks().any(|c| c.name == format!("/{file} returns 200")));
        }
    }
}
