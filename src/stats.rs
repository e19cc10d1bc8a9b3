use serde::Serialize;

use crate::records::{KeywordRow, PositionDistribution};

/// Summary of one side of the blog / non-blog partition.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SideStats {
    pub keyword_count: usize,
    pub total_volume: u64,
    pub top10_volume: u64,
    pub pct_top10: f64,
    pub distribution: PositionDistribution,
}

impl SideStats {
    pub fn from_rows<'a>(rows: impl IntoIterator<Item = &'a KeywordRow>) -> Self {
        let mut stats = SideStats::default();

        for row in rows {
            stats.keyword_count += 1;
            // Volumes are loaded up to u64::MAX; sums pin there instead of wrapping.
            stats.total_volume = stats.total_volume.saturating_add(row.search_volume);
            if row.position <= 10 {
                stats.top10_volume = stats.top10_volume.saturating_add(row.search_volume);
            }
            stats.distribution.record(row.position);
        }

        stats.pct_top10 = if stats.total_volume > 0 {
            stats.top10_volume as f64 / stats.total_volume as f64 * 100.0
        } else {
            0.0
        };
        stats
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BlogCoverage {
    pub total_blog_urls: usize,
    pub ranking_blog_urls: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    // Reports carry these at the top level, redacted if asked.
    #[serde(skip)]
    pub domain: String,
    #[serde(skip)]
    pub year: Option<i32>,
    pub blog: SideStats,
    pub non_blog: SideStats,
    pub coverage: BlogCoverage,
}
