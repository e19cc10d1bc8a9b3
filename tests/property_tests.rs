//! Property-based tests for the blog/non-blog aggregation
//!
//! Random keyword and blog tables over a small pool of domains and URLs, so
//! that overlaps between the two tables are frequent.

use blogrank::analysis::blog_url_set;
use blogrank::{analyze, BlogUrlRow, BlogUrlTable, KeywordRow, PositionBucket};
use chrono::NaiveDate;
use proptest::prelude::*;
use std::collections::HashSet;

const DOMAINS: [&str; 3] = ["example.com", "other.org", "Example.com"];

fn keyword_strategy() -> impl Strategy<Value = KeywordRow> {
    (0..DOMAINS.len(), 0..8u32, 1..120u32, 0..5_000u64).prop_map(
        |(domain, page, position, search_volume)| KeywordRow {
            domain: DOMAINS[domain].to_string(),
            url: format!("/page/{page}"),
            position,
            search_volume,
        },
    )
}

fn blog_url_strategy() -> impl Strategy<Value = BlogUrlRow> {
    (
        0..DOMAINS.len(),
        0..8u32,
        prop::option::of(2018..2025i32),
    )
        .prop_map(|(domain, page, year)| BlogUrlRow {
            domain: DOMAINS[domain].to_string(),
            url: format!("/page/{page}"),
            last_modified: year.and_then(|y| {
                NaiveDate::from_ymd_opt(y, 3, 14).and_then(|d| d.and_hms_opt(0, 0, 0))
            }),
        })
}

fn tables() -> impl Strategy<Value = (Vec<KeywordRow>, BlogUrlTable)> {
    (
        prop::collection::vec(keyword_strategy(), 0..60),
        prop::collection::vec(blog_url_strategy(), 0..20),
        any::<bool>(),
    )
        .prop_map(|(keywords, rows, has_last_modified)| {
            let rows = if has_last_modified {
                rows
            } else {
                rows.into_iter()
                    .map(|row| BlogUrlRow {
                        last_modified: None,
                        ..row
                    })
                    .collect()
            };
            (keywords, BlogUrlTable::new(rows, has_last_modified))
        })
}

proptest! {
    #[test]
    fn partition_is_complete((keywords, blog_urls) in tables(), year in prop::option::of(2018..2025i32)) {
        for domain in DOMAINS {
            let domain_rows = keywords.iter().filter(|row| row.domain == domain).count();
            let result = analyze(domain, &keywords, &blog_urls, year);

            prop_assert_eq!(result.blog.keyword_count + result.non_blog.keyword_count, domain_rows);

            let domain_volume: u64 = keywords
                .iter()
                .filter(|row| row.domain == domain)
                .map(|row| row.search_volume)
                .sum();
            prop_assert_eq!(result.blog.total_volume + result.non_blog.total_volume, domain_volume);
        }
    }

    #[test]
    fn buckets_conserve_rows((keywords, blog_urls) in tables()) {
        let result = analyze("example.com", &keywords, &blog_urls, None);

        prop_assert_eq!(result.blog.distribution.total(), result.blog.keyword_count);
        prop_assert_eq!(result.non_blog.distribution.total(), result.non_blog.keyword_count);
        prop_assert_eq!(result.blog.distribution.iter().count(), PositionBucket::ALL.len());
    }

    #[test]
    fn top10_share_is_a_percentage((keywords, blog_urls) in tables()) {
        let result = analyze("example.com", &keywords, &blog_urls, None);

        for side in [&result.blog, &result.non_blog] {
            prop_assert!(side.pct_top10.is_finite());
            prop_assert!((0.0..=100.0).contains(&side.pct_top10));
            prop_assert!(side.top10_volume <= side.total_volume);
            if side.total_volume == 0 {
                prop_assert_eq!(side.pct_top10, 0.0);
            }
        }
    }

    #[test]
    fn coverage_counts_distinct_urls((keywords, blog_urls) in tables(), year in prop::option::of(2018..2025i32)) {
        let result = analyze("example.com", &keywords, &blog_urls, year);
        let set = blog_url_set("example.com", &blog_urls, year);

        prop_assert_eq!(result.coverage.total_blog_urls, set.len());
        prop_assert!(result.coverage.ranking_blog_urls <= result.coverage.total_blog_urls);

        let ranking: HashSet<&str> = keywords
            .iter()
            .filter(|row| row.domain == "example.com" && set.contains(row.url.as_str()))
            .map(|row| row.url.as_str())
            .collect();
        prop_assert_eq!(result.coverage.ranking_blog_urls, ranking.len());
    }

    #[test]
    fn year_filter_only_narrows((keywords, blog_urls) in tables(), year in 2018..2025i32) {
        let unfiltered = blog_url_set("example.com", &blog_urls, None);
        let filtered = blog_url_set("example.com", &blog_urls, Some(year));

        prop_assert!(filtered.is_subset(&unfiltered));
        if !blog_urls.has_last_modified {
            prop_assert_eq!(&filtered, &unfiltered);
        }

        let all = analyze("example.com", &keywords, &blog_urls, None);
        let by_year = analyze("example.com", &keywords, &blog_urls, Some(year));
        prop_assert!(by_year.blog.keyword_count <= all.blog.keyword_count);
    }
}
