use anyhow::Result;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::analysis;
use crate::config::DisplayConfig;
use crate::records::{BlogUrlTable, PositionBucket};
use crate::stats::AnalysisResult;
use crate::utils::{format_number, format_percent, redact_domain};

const BAR: char = '█';

/// Everything a rendered report needs for one domain/year selection.
#[derive(Debug, Serialize)]
pub struct Report<'a> {
    pub domain: String,
    pub year: Option<i32>,
    pub result: &'a AnalysisResult,
    /// `None` when the blog table has no last-modified column.
    pub urls_by_year: Option<BTreeMap<i32, usize>>,
}

impl<'a> Report<'a> {
    pub fn new(result: &'a AnalysisResult, blog_urls: &BlogUrlTable, redact: bool) -> Self {
        let urls_by_year = blog_urls
            .has_last_modified
            .then(|| analysis::urls_by_year(&result.domain, blog_urls));

        Self {
            domain: display_domain(&result.domain, redact),
            year: result.year,
            result,
            urls_by_year,
        }
    }
}

pub fn render_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

pub fn render_text(report: &Report<'_>, display: &DisplayConfig) -> String {
    let result = report.result;
    let sep = display.thousands_separator.as_str();
    let mut out = String::new();

    let title = match report.year {
        Some(year) => format!("Search volume analysis - {} ({})", report.domain, year),
        None => format!("Search volume analysis - {}", report.domain),
    };
    out.push_str(&format!("\n--- {} ---\n\n", title));

    out.push_str(&format!("{:<26}{:>16}{:>16}\n", "", "Blog", "Outside blog"));
    out.push_str(&format!(
        "{:<26}{:>16}{:>16}\n",
        "Estimated search volume",
        format_number(result.blog.total_volume, sep),
        format_number(result.non_blog.total_volume, sep)
    ));
    out.push_str(&format!(
        "{:<26}{:>16}{:>16}\n",
        "Ranking keywords",
        format_number(result.blog.keyword_count as u64, sep),
        format_number(result.non_blog.keyword_count as u64, sep)
    ));
    out.push_str(&format!(
        "{:<26}{:>16}{:>16}\n",
        "Volume share in top 10",
        format_percent(result.blog.pct_top10),
        format_percent(result.non_blog.pct_top10)
    ));

    out.push_str(&format!(
        "\nBlog URLs ranking: {} | Total blog URLs: {}\n",
        format_number(result.coverage.ranking_blog_urls as u64, sep),
        format_number(result.coverage.total_blog_urls as u64, sep)
    ));

    out.push_str("\nPosition distribution (each side scaled to its own maximum)\n");
    let blog_max = result.blog.distribution.max();
    let other_max = result.non_blog.distribution.max();
    for bucket in PositionBucket::ALL {
        let blog_count = result.blog.distribution.get(bucket);
        let other_count = result.non_blog.distribution.get(bucket);
        out.push_str(&format!(
            "{:<6} Blog  {} {}\n",
            bucket.label(),
            bar(blog_count, blog_max, display.bar_width),
            blog_count
        ));
        out.push_str(&format!(
            "{:<6} Other {} {}\n",
            "",
            bar(other_count, other_max, display.bar_width),
            other_count
        ));
    }

    if let Some(urls_by_year) = &report.urls_by_year {
        out.push_str("\nBlog URLs by publication year\n");
        if urls_by_year.is_empty() {
            out.push_str("No dated blog URLs\n");
        }
        let max = urls_by_year.values().copied().max().unwrap_or(0);
        for (year, count) in urls_by_year {
            out.push_str(&format!(
                "{:<6} {} {}\n",
                year,
                bar(*count, max, display.bar_width),
                count
            ));
        }
    }

    out
}

/// One line per domain, for `--all`.
pub fn render_summary(results: &[AnalysisResult], display: &DisplayConfig, redact: bool) -> String {
    let sep = display.thousands_separator.as_str();
    let mut out = String::new();

    out.push_str(&format!(
        "{:<30}{:>14}{:>14}{:>10}{:>10}{:>11}{:>11}{:>14}\n",
        "Domain", "Blog vol", "Other vol", "Blog kw", "Other kw", "Blog top10", "Other top10", "Blog URLs"
    ));
    for result in results {
        out.push_str(&format!(
            "{:<30}{:>14}{:>14}{:>10}{:>10}{:>11}{:>11}{:>14}\n",
            display_domain(&result.domain, redact),
            format_number(result.blog.total_volume, sep),
            format_number(result.non_blog.total_volume, sep),
            format_number(result.blog.keyword_count as u64, sep),
            format_number(result.non_blog.keyword_count as u64, sep),
            format_percent(result.blog.pct_top10),
            format_percent(result.non_blog.pct_top10),
            format!(
                "{}/{}",
                result.coverage.ranking_blog_urls, result.coverage.total_blog_urls
            )
        ));
    }
    out
}

pub fn display_domain(domain: &str, redact: bool) -> String {
    if redact {
        redact_domain(domain)
    } else {
        domain.to_string()
    }
}

fn bar(count: usize, max: usize, width: usize) -> String {
    if count == 0 || max == 0 {
        return String::new();
    }
    let len = ((count as f64 / max as f64) * width as f64).round() as usize;
    BAR.to_string().repeat(len.max(1))
}
