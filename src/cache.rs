//! Memoized analysis results.
//!
//! Entries are keyed by `(domain, year)` and bound to the version of the
//! dataset they were computed from. Looking up against a dataset with another
//! version drops every entry first, so a reload never serves stale results.

use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use crate::analysis;
use crate::loader::Dataset;
use crate::stats::AnalysisResult;

type CacheKey = (String, Option<i32>);

#[derive(Debug, Default)]
pub struct AnalysisCache {
    version: Option<u64>,
    entries: HashMap<CacheKey, Arc<AnalysisResult>>,
    hits: u64,
    misses: u64,
}

impl AnalysisCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_compute(
        &mut self,
        dataset: &Dataset,
        domain: &str,
        year: Option<i32>,
    ) -> Arc<AnalysisResult> {
        if self.version != Some(dataset.version()) {
            self.invalidate();
            self.version = Some(dataset.version());
        }

        let key = (domain.to_string(), year);
        if let Some(result) = self.entries.get(&key) {
            self.hits += 1;
            debug!(action = "hit", component = "analysis_cache", domain = domain, year = ?year, "Cache hit");
            return Arc::clone(result);
        }

        self.misses += 1;
        debug!(action = "miss", component = "analysis_cache", domain = domain, year = ?year, "Cache miss");
        let result = Arc::new(analysis::analyze(
            domain,
            &dataset.keywords,
            &dataset.blog_urls,
            year,
        ));
        self.entries.insert(key, Arc::clone(&result));
        result
    }

    pub fn invalidate(&mut self) {
        if !self.entries.is_empty() {
            debug!(
                action = "invalidate",
                component = "analysis_cache",
                dropped_entries = self.entries.len(),
                "Cache invalidated"
            );
        }
        self.entries.clear();
        self.version = None;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{BlogUrlRow, BlogUrlTable, KeywordRow};

    fn dataset(volume: u64) -> Dataset {
        Dataset::new(
            vec![KeywordRow {
                domain: "example.com".to_string(),
                url: "/blog/a".to_string(),
                position: 1,
                search_volume: volume,
            }],
            BlogUrlTable::new(
                vec![BlogUrlRow {
                    domain: "example.com".to_string(),
                    url: "/blog/a".to_string(),
                    last_modified: None,
                }],
                false,
            ),
        )
    }

    #[test]
    fn repeated_lookup_is_a_hit() {
        let data = dataset(100);
        let mut cache = AnalysisCache::new();

        let first = cache.get_or_compute(&data, "example.com", None);
        let second = cache.get_or_compute(&data, "example.com", None);

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.hits(), 1);
        assert_eq!(cache.misses(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn year_is_part_of_the_key() {
        let data = dataset(100);
        let mut cache = AnalysisCache::new();

        cache.get_or_compute(&data, "example.com", None);
        cache.get_or_compute(&data, "example.com", Some(2023));

        assert_eq!(cache.misses(), 2);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn reloaded_dataset_invalidates() {
        let mut cache = AnalysisCache::new();

        let before = cache.get_or_compute(&dataset(100), "example.com", None);
        let after = cache.get_or_compute(&dataset(250), "example.com", None);

        assert_eq!(before.blog.total_volume, 100);
        assert_eq!(after.blog.total_volume, 250);
        assert_eq!(cache.hits(), 0);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn explicit_invalidate_clears_entries() {
        let data = dataset(100);
        let mut cache = AnalysisCache::new();
        cache.get_or_compute(&data, "example.com", None);

        cache.invalidate();

        assert!(cache.is_empty());
        cache.get_or_compute(&data, "example.com", None);
        assert_eq!(cache.misses(), 2);
    }
}
