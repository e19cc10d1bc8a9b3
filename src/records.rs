use chrono::{Datelike, NaiveDateTime};
use serde::Serialize;
use std::fmt;

/// One ranking fact from the keyword table.
#[derive(Debug, Clone, PartialEq)]
pub struct KeywordRow {
    pub domain: String,
    pub url: String,
    pub position: u32,
    pub search_volume: u64,
}

/// One URL from a domain's blog inventory.
#[derive(Debug, Clone, PartialEq)]
pub struct BlogUrlRow {
    pub domain: String,
    pub url: String,
    pub last_modified: Option<NaiveDateTime>,
}

impl BlogUrlRow {
    pub fn publication_year(&self) -> Option<i32> {
        self.last_modified.map(|ts| ts.year())
    }
}

/// Blog inventory rows plus whether the source carried a `LastModified` column.
///
/// Without that column every row has a null timestamp and year filtering is
/// turned off entirely rather than excluding everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlogUrlTable {
    pub rows: Vec<BlogUrlRow>,
    pub has_last_modified: bool,
}

impl BlogUrlTable {
    pub fn new(rows: Vec<BlogUrlRow>, has_last_modified: bool) -> Self {
        Self {
            rows,
            has_last_modified,
        }
    }

    pub fn for_domain<'a>(&'a self, domain: &'a str) -> impl Iterator<Item = &'a BlogUrlRow> {
        self.rows.iter().filter(move |row| row.domain == domain)
    }
}

/// Ranking position range. Variants are declared in report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PositionBucket {
    Top3,
    Top10,
    Top20,
    Top30,
    Beyond30,
}

impl PositionBucket {
    pub const ALL: [PositionBucket; 5] = [
        PositionBucket::Top3,
        PositionBucket::Top10,
        PositionBucket::Top20,
        PositionBucket::Top30,
        PositionBucket::Beyond30,
    ];

    pub fn from_position(position: u32) -> Self {
        match position {
            0..=3 => PositionBucket::Top3,
            4..=10 => PositionBucket::Top10,
            11..=20 => PositionBucket::Top20,
            21..=30 => PositionBucket::Top30,
            _ => PositionBucket::Beyond30,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PositionBucket::Top3 => "1-3",
            PositionBucket::Top10 => "4-10",
            PositionBucket::Top20 => "11-20",
            PositionBucket::Top30 => "21-30",
            PositionBucket::Beyond30 => "30+",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for PositionBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Row counts per position bucket, always holding all five buckets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PositionDistribution {
    counts: [usize; 5],
}

impl PositionDistribution {
    pub fn record(&mut self, position: u32) {
        self.counts[PositionBucket::from_position(position).index()] += 1;
    }

    pub fn get(&self, bucket: PositionBucket) -> usize {
        self.counts[bucket.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (PositionBucket, usize)> + '_ {
        PositionBucket::ALL
            .iter()
            .map(move |bucket| (*bucket, self.get(*bucket)))
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    pub fn max(&self) -> usize {
        self.counts.iter().copied().max().unwrap_or(0)
    }
}

impl Serialize for PositionDistribution {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;

        let mut map = serializer.serialize_map(Some(PositionBucket::ALL.len()))?;
        for (bucket, count) in self.iter() {
            map.serialize_entry(bucket.label(), &count)?;
        }
        map.end()
    }
}
