use anyhow::Result;
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::time::Instant;
use tracing::{debug, info};

use crate::loader::Dataset;
use crate::records::{BlogUrlTable, KeywordRow};
use crate::stats::{AnalysisResult, BlogCoverage, SideStats};

/// Split a domain's keyword rows into blog and non-blog sides and summarize each.
///
/// `year` only narrows the blog URL set when the blog table carries
/// last-modified dates; otherwise every blog URL counts.
pub fn analyze(
    domain: &str,
    keywords: &[KeywordRow],
    blog_urls: &BlogUrlTable,
    year: Option<i32>,
) -> AnalysisResult {
    let domain_keywords: Vec<&KeywordRow> =
        keywords.iter().filter(|row| row.domain == domain).collect();
    analyze_domain_rows(domain, &domain_keywords, blog_urls, year)
}

fn analyze_domain_rows(
    domain: &str,
    domain_keywords: &[&KeywordRow],
    blog_urls: &BlogUrlTable,
    year: Option<i32>,
) -> AnalysisResult {
    let start_time = Instant::now();
    let blog_url_set = blog_url_set(domain, blog_urls, year);

    let (blog_rows, non_blog_rows): (Vec<&KeywordRow>, Vec<&KeywordRow>) = domain_keywords
        .iter()
        .copied()
        .partition(|row| blog_url_set.contains(row.url.as_str()));

    let ranking_blog_urls = blog_rows
        .iter()
        .map(|row| row.url.as_str())
        .collect::<HashSet<_>>()
        .len();

    let result = AnalysisResult {
        domain: domain.to_string(),
        year,
        blog: SideStats::from_rows(blog_rows.iter().copied()),
        non_blog: SideStats::from_rows(non_blog_rows.iter().copied()),
        coverage: BlogCoverage {
            total_blog_urls: blog_url_set.len(),
            ranking_blog_urls,
        },
    };

    debug!(
        action = "complete",
        component = "domain_analysis",
        domain = domain,
        year = ?year,
        blog_keywords = result.blog.keyword_count,
        non_blog_keywords = result.non_blog.keyword_count,
        blog_urls = result.coverage.total_blog_urls,
        duration_us = start_time.elapsed().as_micros(),
        "Domain analysis completed"
    );
    result
}

/// Distinct blog URLs for `domain`, restricted to `year` when dates are available.
pub fn blog_url_set<'a>(
    domain: &str,
    blog_urls: &'a BlogUrlTable,
    year: Option<i32>,
) -> HashSet<&'a str> {
    let year = year.filter(|_| blog_urls.has_last_modified);

    blog_urls
        .rows
        .iter()
        .filter(|row| row.domain == domain)
        .filter(|row| year.map_or(true, |y| row.publication_year() == Some(y)))
        .map(|row| row.url.as_str())
        .collect()
}

/// Distinct keyword-table domains in first-seen order.
pub fn domains(keywords: &[KeywordRow]) -> Vec<String> {
    let mut seen = HashSet::new();
    keywords
        .iter()
        .filter(|row| seen.insert(row.domain.as_str()))
        .map(|row| row.domain.clone())
        .collect()
}

/// Sorted publication years among a domain's blog URLs.
pub fn publication_years(domain: &str, blog_urls: &BlogUrlTable) -> Vec<i32> {
    blog_urls
        .for_domain(domain)
        .filter_map(|row| row.publication_year())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Blog URL rows per publication year for a domain. Undated rows are left out.
pub fn urls_by_year(domain: &str, blog_urls: &BlogUrlTable) -> BTreeMap<i32, usize> {
    let mut counts = BTreeMap::new();
    for year in blog_urls.for_domain(domain).filter_map(|row| row.publication_year()) {
        *counts.entry(year).or_insert(0) += 1;
    }
    counts
}

/// Analyze every keyword domain on a bounded worker pool.
pub fn analyze_all(
    dataset: &Dataset,
    year: Option<i32>,
    max_workers: Option<usize>,
) -> Result<Vec<AnalysisResult>> {
    let start_time = Instant::now();
    info!(action = "start", component = "batch_analysis", "Analyzing all domains");

    let max_workers = max_workers.unwrap_or_else(|| {
        let cpu_count = num_cpus::get();
        std::cmp::min(cpu_count, 8)
    });
    info!(action = "configure", component = "batch_analysis", worker_count = max_workers, "Using workers for processing");

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(max_workers)
        .build()?;

    let mut by_domain: HashMap<&str, Vec<&KeywordRow>> = HashMap::new();
    for row in &dataset.keywords {
        by_domain.entry(row.domain.as_str()).or_default().push(row);
    }
    let domain_list = domains(&dataset.keywords);

    let results: Vec<AnalysisResult> = pool.install(|| {
        domain_list
            .par_iter()
            .map(|domain| {
                let rows = by_domain.get(domain.as_str()).map(Vec::as_slice).unwrap_or(&[]);
                analyze_domain_rows(domain, rows, &dataset.blog_urls, year)
            })
            .collect()
    });

    let total_time = start_time.elapsed();
    info!(
        action = "complete",
        component = "batch_analysis",
        domain_count = results.len(),
        duration_ms = total_time.as_millis(),
        "Batch analysis completed"
    );
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{BlogUrlRow, PositionBucket};
    use chrono::NaiveDate;

    fn kw(domain: &str, url: &str, position: u32, search_volume: u64) -> KeywordRow {
        KeywordRow {
            domain: domain.to_string(),
            url: url.to_string(),
            position,
            search_volume,
        }
    }

    fn blog(domain: &str, url: &str, year: Option<i32>) -> BlogUrlRow {
        BlogUrlRow {
            domain: domain.to_string(),
            url: url.to_string(),
            last_modified: year.map(|y| {
                NaiveDate::from_ymd_opt(y, 5, 17)
                    .unwrap()
                    .and_hms_opt(12, 0, 0)
                    .unwrap()
            }),
        }
    }

    #[test]
    fn all_blog_scenario() {
        let urls = ["/p2", "/p5", "/p12", "/p25", "/p40"];
        let positions = [2, 5, 12, 25, 40];
        let volumes = [100, 200, 50, 10, 5];

        let keywords: Vec<KeywordRow> = (0..5)
            .map(|i| kw("example.com", urls[i], positions[i], volumes[i]))
            .collect();
        let blog_urls = BlogUrlTable::new(
            urls.iter().map(|u| blog("example.com", u, Some(2023))).collect(),
            true,
        );

        let result = analyze("example.com", &keywords, &blog_urls, None);

        for bucket in PositionBucket::ALL {
            assert_eq!(result.blog.distribution.get(bucket), 1, "{bucket}");
        }
        assert_eq!(result.blog.keyword_count, 5);
        assert_eq!(result.blog.total_volume, 365);
        assert_eq!(result.blog.top10_volume, 300);
        assert!((result.blog.pct_top10 - 82.191_780_8).abs() < 1e-6);

        assert_eq!(result.non_blog.keyword_count, 0);
        assert_eq!(result.non_blog.pct_top10, 0.0);
        assert_eq!(result.coverage.total_blog_urls, 5);
        assert_eq!(result.coverage.ranking_blog_urls, 5);
    }

    #[test]
    fn empty_domain_yields_zeroes() {
        let keywords = vec![kw("other.com", "/a", 1, 100)];
        let blog_urls = BlogUrlTable::new(vec![blog("other.com", "/a", None)], false);

        let result = analyze("example.com", &keywords, &blog_urls, None);

        assert_eq!(result.blog, SideStats::default());
        assert_eq!(result.non_blog, SideStats::default());
        assert_eq!(result.coverage, BlogCoverage::default());
    }

    #[test]
    fn rows_from_other_domains_are_ignored() {
        let keywords = vec![
            kw("example.com", "/blog/a", 1, 10),
            kw("example.com", "/shop", 4, 20),
            kw("Example.com", "/blog/a", 1, 1000),
            kw("other.com", "/blog/a", 1, 1000),
        ];
        let blog_urls = BlogUrlTable::new(
            vec![blog("example.com", "/blog/a", None), blog("other.com", "/shop", None)],
            false,
        );

        let result = analyze("example.com", &keywords, &blog_urls, None);

        assert_eq!(result.blog.keyword_count, 1);
        assert_eq!(result.blog.total_volume, 10);
        assert_eq!(result.non_blog.keyword_count, 1);
        assert_eq!(result.non_blog.total_volume, 20);
        assert_eq!(result.coverage.total_blog_urls, 1);
    }

    #[test]
    fn duplicate_blog_urls_count_once() {
        let keywords = vec![
            kw("example.com", "/blog/a", 3, 10),
            kw("example.com", "/blog/a", 8, 10),
        ];
        let blog_urls = BlogUrlTable::new(
            vec![
                blog("example.com", "/blog/a", Some(2022)),
                blog("example.com", "/blog/a", Some(2023)),
                blog("example.com", "/blog/b", Some(2023)),
            ],
            true,
        );

        let result = analyze("example.com", &keywords, &blog_urls, None);

        assert_eq!(result.coverage.total_blog_urls, 2);
        assert_eq!(result.coverage.ranking_blog_urls, 1);
        assert_eq!(result.blog.keyword_count, 2);
    }

    #[test]
    fn huge_volumes_do_not_overflow() {
        let volume = crate::loader::parse_search_volume("10000000000000000000").unwrap();
        let keywords = vec![
            kw("example.com", "/blog/a", 1, volume),
            kw("example.com", "/blog/b", 5, volume),
            kw("example.com", "/shop", 2, volume),
        ];
        let blog_urls = BlogUrlTable::new(
            vec![blog("example.com", "/blog/a", None), blog("example.com", "/blog/b", None)],
            false,
        );

        let result = analyze("example.com", &keywords, &blog_urls, None);

        assert_eq!(result.blog.total_volume, u64::MAX);
        assert_eq!(result.non_blog.total_volume, volume);
        assert!(result.blog.pct_top10.is_finite());
    }

    #[test]
    fn year_filter_restricts_blog_set() {
        let keywords = vec![
            kw("example.com", "/blog/old", 2, 100),
            kw("example.com", "/blog/new", 15, 50),
            kw("example.com", "/blog/undated", 40, 5),
        ];
        let blog_urls = BlogUrlTable::new(
            vec![
                blog("example.com", "/blog/old", Some(2021)),
                blog("example.com", "/blog/new", Some(2023)),
                blog("example.com", "/blog/undated", None),
            ],
            true,
        );

        let result = analyze("example.com", &keywords, &blog_urls, Some(2023));

        assert_eq!(result.year, Some(2023));
        assert_eq!(result.blog.keyword_count, 1);
        assert_eq!(result.blog.total_volume, 50);
        assert_eq!(result.blog.pct_top10, 0.0);
        assert_eq!(result.non_blog.keyword_count, 2);
        assert_eq!(result.coverage.total_blog_urls, 1);
    }

    #[test]
    fn year_filter_without_dates_is_noop() {
        let keywords = vec![kw("example.com", "/blog/a", 2, 100)];
        let blog_urls = BlogUrlTable::new(vec![blog("example.com", "/blog/a", None)], false);

        let filtered = analyze("example.com", &keywords, &blog_urls, Some(1999));
        let unfiltered = analyze("example.com", &keywords, &blog_urls, None);

        assert_eq!(filtered.blog, unfiltered.blog);
        assert_eq!(filtered.coverage, unfiltered.coverage);
        assert_eq!(filtered.blog.keyword_count, 1);
    }

    #[test]
    fn no_year_keeps_full_blog_set() {
        let blog_urls = BlogUrlTable::new(
            vec![
                blog("example.com", "/a", Some(2020)),
                blog("example.com", "/b", None),
                blog("example.com", "/c", Some(2024)),
            ],
            true,
        );

        let all: HashSet<&str> = blog_urls.rows.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(blog_url_set("example.com", &blog_urls, None), all);
        assert_eq!(blog_url_set("example.com", &blog_urls, Some(2020)).len(), 1);
    }

    #[test]
    fn selection_helpers() {
        let keywords = vec![
            kw("b.com", "/", 1, 1),
            kw("a.com", "/", 1, 1),
            kw("b.com", "/x", 1, 1),
        ];
        assert_eq!(domains(&keywords), vec!["b.com", "a.com"]);

        let blog_urls = BlogUrlTable::new(
            vec![
                blog("a.com", "/1", Some(2023)),
                blog("a.com", "/2", Some(2021)),
                blog("a.com", "/3", Some(2023)),
                blog("a.com", "/4", None),
                blog("b.com", "/5", Some(2019)),
            ],
            true,
        );
        assert_eq!(publication_years("a.com", &blog_urls), vec![2021, 2023]);

        let counts: Vec<(i32, usize)> = urls_by_year("a.com", &blog_urls).into_iter().collect();
        assert_eq!(counts, vec![(2021, 1), (2023, 2)]);
    }

    #[test]
    fn batch_matches_single_analysis() {
        let keywords = vec![
            kw("a.com", "/blog/1", 1, 10),
            kw("b.com", "/blog/2", 12, 20),
            kw("a.com", "/shop", 35, 30),
        ];
        let blog_urls = BlogUrlTable::new(
            vec![blog("a.com", "/blog/1", None), blog("b.com", "/blog/2", None)],
            false,
        );
        let expected_a = analyze("a.com", &keywords, &blog_urls, None);
        let expected_b = analyze("b.com", &keywords, &blog_urls, None);

        let dataset = Dataset::new(keywords, blog_urls);
        let results = analyze_all(&dataset, None, Some(2)).unwrap();

        assert_eq!(results, vec![expected_a, expected_b]);
    }
}
