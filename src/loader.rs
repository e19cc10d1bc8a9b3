use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use csv::StringRecord;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::{info, warn};

use crate::config::{BlogUrlColumns, ColumnsConfig, KeywordColumns};
use crate::error::{LoadError, SchemaError};
use crate::records::{BlogUrlRow, BlogUrlTable, KeywordRow};

const KEYWORDS_TABLE: &str = "keywords";
const BLOG_URLS_TABLE: &str = "blog_urls";

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];
// W3C datetime with minute precision, as found in sitemap <lastmod>
const OFFSET_MINUTE_FORMAT: &str = "%Y-%m-%dT%H:%M%:z";

static NEXT_VERSION: AtomicU64 = AtomicU64::new(1);

/// Both input tables as loaded together. Every construction gets a fresh
/// version so cached results from an earlier load are never reused.
#[derive(Debug)]
pub struct Dataset {
    pub keywords: Vec<KeywordRow>,
    pub blog_urls: BlogUrlTable,
    pub skipped_keyword_rows: usize,
    pub skipped_blog_url_rows: usize,
    version: u64,
}

impl Dataset {
    pub fn new(keywords: Vec<KeywordRow>, blog_urls: BlogUrlTable) -> Self {
        Self {
            keywords,
            blog_urls,
            skipped_keyword_rows: 0,
            skipped_blog_url_rows: 0,
            version: NEXT_VERSION.fetch_add(1, Ordering::Relaxed),
        }
    }

    pub fn load(
        keywords_path: &Path,
        blog_urls_path: &Path,
        columns: &ColumnsConfig,
        strict: bool,
    ) -> Result<Self> {
        let start_time = Instant::now();
        info!(action = "start", component = "dataset_load", "Loading input tables");

        let keywords = load_keywords(keywords_path, &columns.keywords, strict)
            .with_context(|| format!("Failed to load keyword rankings from {:?}", keywords_path))?;
        let blog_urls = load_blog_urls(blog_urls_path, &columns.blog_urls, strict)
            .with_context(|| format!("Failed to load blog URLs from {:?}", blog_urls_path))?;

        let mut dataset = Dataset::new(keywords.rows, blog_urls.table);
        dataset.skipped_keyword_rows = keywords.skipped;
        dataset.skipped_blog_url_rows = blog_urls.skipped;

        let load_time = start_time.elapsed();
        info!(
            action = "complete",
            component = "dataset_load",
            keyword_rows = dataset.keywords.len(),
            skipped_keyword_rows = dataset.skipped_keyword_rows,
            blog_url_rows = dataset.blog_urls.rows.len(),
            skipped_blog_url_rows = dataset.skipped_blog_url_rows,
            has_last_modified = dataset.blog_urls.has_last_modified,
            version = dataset.version,
            duration_ms = load_time.as_millis(),
            "Input tables loaded"
        );
        Ok(dataset)
    }

    pub fn version(&self) -> u64 {
        self.version
    }
}

/// Where the two tables come from, kept so a session can reload them.
#[derive(Debug, Clone)]
pub struct DataSource {
    pub keywords: PathBuf,
    pub blog_urls: PathBuf,
    pub columns: ColumnsConfig,
    pub strict: bool,
}

impl DataSource {
    pub fn load(&self) -> Result<Dataset> {
        Dataset::load(&self.keywords, &self.blog_urls, &self.columns, self.strict)
    }
}

/// Keyword rows that parsed, plus how many were dropped for bad or missing cells.
#[derive(Debug)]
pub struct KeywordLoad {
    pub rows: Vec<KeywordRow>,
    pub skipped: usize,
}

pub fn load_keywords(
    path: &Path,
    columns: &KeywordColumns,
    strict: bool,
) -> Result<KeywordLoad, LoadError> {
    let reader = reader_builder()
        .from_path(path)
        .map_err(|source| LoadError::Open {
            path: path.to_path_buf(),
            source,
        })?;
    read_keywords(reader, columns, strict)
}

/// Blog rows that had both a domain and a URL, plus how many did not.
#[derive(Debug)]
pub struct BlogUrlLoad {
    pub table: BlogUrlTable,
    pub skipped: usize,
}

pub fn load_blog_urls(
    path: &Path,
    columns: &BlogUrlColumns,
    strict: bool,
) -> Result<BlogUrlLoad, LoadError> {
    let reader = reader_builder()
        .from_path(path)
        .map_err(|source| LoadError::Open {
            path: path.to_path_buf(),
            source,
        })?;
    read_blog_urls(reader, columns, strict)
}

pub fn read_keywords<R: Read>(
    mut reader: csv::Reader<R>,
    columns: &KeywordColumns,
    strict: bool,
) -> Result<KeywordLoad, LoadError> {
    let headers = reader.headers().map_err(csv_error(KEYWORDS_TABLE))?.clone();
    let domain_idx = require_column(&headers, KEYWORDS_TABLE, &columns.domain)?;
    let url_idx = require_column(&headers, KEYWORDS_TABLE, &columns.url)?;
    let position_idx = require_column(&headers, KEYWORDS_TABLE, &columns.position)?;
    let volume_idx = require_column(&headers, KEYWORDS_TABLE, &columns.search_volume)?;

    let mut rows = Vec::new();
    let mut skipped = 0;

    for record in reader.records() {
        let record = record.map_err(csv_error(KEYWORDS_TABLE))?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);

        let domain = required_cell(&record, domain_idx);
        let url = required_cell(&record, url_idx);
        let raw_position = record.get(position_idx).unwrap_or("");
        let raw_volume = record.get(volume_idx).unwrap_or("");

        let (Some(domain), Some(url)) = (domain, url) else {
            let column = if domain.is_none() { &columns.domain } else { &columns.url };
            reject_value(strict, KEYWORDS_TABLE, line, column, "")?;
            skipped += 1;
            continue;
        };

        let parsed = match (parse_position(raw_position), parse_search_volume(raw_volume)) {
            (Some(position), Some(volume)) => Some((position, volume)),
            (None, _) => {
                reject_value(strict, KEYWORDS_TABLE, line, &columns.position, raw_position)?;
                None
            }
            (_, None) => {
                reject_value(strict, KEYWORDS_TABLE, line, &columns.search_volume, raw_volume)?;
                None
            }
        };

        match parsed {
            Some((position, search_volume)) => rows.push(KeywordRow {
                domain: domain.to_string(),
                url: url.to_string(),
                position,
                search_volume,
            }),
            None => skipped += 1,
        }
    }

    if skipped > 0 {
        warn!(
            action = "skip",
            component = "keyword_rows",
            skipped_rows = skipped,
            "Dropped keyword rows with missing domain/URL or non-numeric position/volume"
        );
    }

    Ok(KeywordLoad { rows, skipped })
}

pub fn read_blog_urls<R: Read>(
    mut reader: csv::Reader<R>,
    columns: &BlogUrlColumns,
    strict: bool,
) -> Result<BlogUrlLoad, LoadError> {
    let headers = reader.headers().map_err(csv_error(BLOG_URLS_TABLE))?.clone();
    let domain_idx = require_column(&headers, BLOG_URLS_TABLE, &columns.domain)?;
    let url_idx = require_column(&headers, BLOG_URLS_TABLE, &columns.url)?;
    let last_modified_idx = find_column(&headers, &columns.last_modified);

    if last_modified_idx.is_none() {
        info!(
            action = "detect",
            component = "blog_url_columns",
            column = %columns.last_modified,
            "No last-modified column; year filtering disabled"
        );
    }

    let mut rows = Vec::new();
    let mut unparsed_dates = 0usize;
    let mut skipped = 0usize;

    for record in reader.records() {
        let record = record.map_err(csv_error(BLOG_URLS_TABLE))?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);

        let domain = required_cell(&record, domain_idx);
        let url = required_cell(&record, url_idx);
        let (Some(domain), Some(url)) = (domain, url) else {
            let column = if domain.is_none() { &columns.domain } else { &columns.url };
            reject_value(strict, BLOG_URLS_TABLE, line, column, "")?;
            skipped += 1;
            continue;
        };

        let last_modified = last_modified_idx.and_then(|idx| {
            let raw = record.get(idx).unwrap_or("");
            let parsed = parse_last_modified(raw);
            if parsed.is_none() && !raw.is_empty() {
                unparsed_dates += 1;
            }
            parsed
        });

        rows.push(BlogUrlRow {
            domain: domain.to_string(),
            url: url.to_string(),
            last_modified,
        });
    }

    if skipped > 0 {
        warn!(
            action = "skip",
            component = "blog_url_rows",
            skipped_rows = skipped,
            "Dropped blog URL rows with missing domain/URL"
        );
    }

    if unparsed_dates > 0 {
        warn!(
            action = "parse",
            component = "last_modified",
            unparsed_dates,
            "Unrecognized last-modified values treated as missing"
        );
    }

    Ok(BlogUrlLoad {
        table: BlogUrlTable::new(rows, last_modified_idx.is_some()),
        skipped,
    })
}

pub fn reader_builder() -> csv::ReaderBuilder {
    let mut builder = csv::ReaderBuilder::new();
    builder.trim(csv::Trim::All).flexible(true);
    builder
}

/// Parse a `LastModified` cell. Anything unrecognized becomes `None`.
pub fn parse_last_modified(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.naive_local());
    }
    if let Ok(ts) = DateTime::parse_from_str(raw, OFFSET_MINUTE_FORMAT) {
        return Some(ts.naive_local());
    }

    for format in DATETIME_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(ts);
        }
    }

    let date = DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
        .or_else(|| parse_partial_date(raw))?;
    date.and_hms_opt(0, 0, 0)
}

/// `YYYY-MM` and `YYYY`, pinned to the first day of the period.
fn parse_partial_date(raw: &str) -> Option<NaiveDate> {
    let bytes = raw.as_bytes();
    let all_digits = |part: &[u8]| part.iter().all(u8::is_ascii_digit);

    match bytes.len() {
        7 if bytes[4] == b'-' && all_digits(&bytes[..4]) && all_digits(&bytes[5..]) => {
            NaiveDate::parse_from_str(&format!("{raw}-01"), "%Y-%m-%d").ok()
        }
        4 if all_digits(bytes) => {
            NaiveDate::parse_from_str(&format!("{raw}-01-01"), "%Y-%m-%d").ok()
        }
        _ => None,
    }
}

/// Positive integer, or a float with no fractional part ("3.0").
pub fn parse_position(raw: &str) -> Option<u32> {
    if let Ok(position) = raw.parse::<u32>() {
        return (position > 0).then_some(position);
    }

    let value = raw.parse::<f64>().ok()?;
    if value.is_finite() && value.fract() == 0.0 && value >= 1.0 && value <= u32::MAX as f64 {
        Some(value as u32)
    } else {
        None
    }
}

/// Non-negative integer, or a non-negative float rounded to the nearest unit.
pub fn parse_search_volume(raw: &str) -> Option<u64> {
    if let Ok(volume) = raw.parse::<u64>() {
        return Some(volume);
    }

    let value = raw.parse::<f64>().ok()?;
    if value.is_finite() && value >= 0.0 && value <= u64::MAX as f64 {
        Some(value.round() as u64)
    } else {
        None
    }
}

fn find_column(headers: &StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|header| header == name)
}

fn require_column(
    headers: &StringRecord,
    table: &'static str,
    name: &str,
) -> Result<usize, SchemaError> {
    find_column(headers, name).ok_or_else(|| SchemaError::MissingColumn {
        table,
        column: name.to_string(),
    })
}

/// A cell that is present and non-empty. Short rows yield `None`.
fn required_cell(record: &StringRecord, idx: usize) -> Option<&str> {
    record.get(idx).filter(|cell| !cell.is_empty())
}

fn reject_value(
    strict: bool,
    table: &'static str,
    line: u64,
    column: &str,
    value: &str,
) -> Result<(), SchemaError> {
    if strict {
        return Err(SchemaError::InvalidValue {
            table,
            line,
            column: column.to_string(),
            value: value.to_string(),
        });
    }
    Ok(())
}

fn csv_error(table: &'static str) -> impl Fn(csv::Error) -> LoadError {
    move |source| LoadError::Csv { table, source }
}
