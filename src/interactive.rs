use anyhow::Result;
use dialoguer::theme::ColorfulTheme;
use dialoguer::Select;
use std::sync::Arc;
use tracing::info;

use crate::analysis;
use crate::cache::AnalysisCache;
use crate::config::DisplayConfig;
use crate::loader::{DataSource, Dataset};
use crate::report::{display_domain, render_text, Report};
use crate::stats::AnalysisResult;

const ACTIONS: [&str; 4] = ["Change domain", "Change year", "Reload data", "Quit"];

/// Loaded data plus the current domain/year selection.
#[derive(Debug)]
pub struct Session {
    source: DataSource,
    dataset: Dataset,
    cache: AnalysisCache,
    domain: String,
    year: Option<i32>,
}

impl Session {
    pub fn new(source: DataSource, dataset: Dataset) -> Result<Self> {
        let domain = first_domain(&dataset)?;
        Ok(Self {
            source,
            dataset,
            cache: AnalysisCache::new(),
            domain,
            year: None,
        })
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn year(&self) -> Option<i32> {
        self.year
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn cache(&self) -> &AnalysisCache {
        &self.cache
    }

    pub fn domains(&self) -> Vec<String> {
        analysis::domains(&self.dataset.keywords)
    }

    pub fn years(&self) -> Vec<i32> {
        analysis::publication_years(&self.domain, &self.dataset.blog_urls)
    }

    /// Switch domain. A year the new domain never published in is cleared.
    pub fn select_domain(&mut self, domain: &str) -> Result<()> {
        if !self.domains().iter().any(|d| d == domain) {
            anyhow::bail!("Domain '{}' not found in keyword rankings", domain);
        }
        self.domain = domain.to_string();
        if let Some(year) = self.year {
            if !self.years().contains(&year) {
                self.year = None;
            }
        }
        Ok(())
    }

    pub fn select_year(&mut self, year: Option<i32>) {
        self.year = year;
    }

    pub fn current(&mut self) -> Arc<AnalysisResult> {
        self.cache
            .get_or_compute(&self.dataset, &self.domain, self.year)
    }

    /// Re-read both files. Keeps the selection when the domain still exists.
    pub fn reload(&mut self) -> Result<()> {
        let dataset = self.source.load()?;
        self.dataset = dataset;
        self.cache.invalidate();

        if !self.domains().contains(&self.domain) {
            self.domain = first_domain(&self.dataset)?;
            self.year = None;
        }
        info!(action = "reload", component = "session", version = self.dataset.version(), "Data reloaded");
        Ok(())
    }
}

pub fn first_domain(dataset: &Dataset) -> Result<String> {
    match analysis::domains(&dataset.keywords).into_iter().next() {
        Some(domain) => Ok(domain),
        None => anyhow::bail!("Keyword rankings contain no domains"),
    }
}

pub fn run_session(mut session: Session, display: &DisplayConfig, redact: bool) -> Result<()> {
    let theme = ColorfulTheme::default();

    if !prompt_domain(&mut session, &theme, redact)? || !prompt_year(&mut session, &theme)? {
        return Ok(());
    }

    loop {
        let result = session.current();
        let report = Report::new(&result, &session.dataset().blog_urls, redact);
        println!("{}", render_text(&report, display));

        let action = Select::with_theme(&theme)
            .with_prompt("Next")
            .items(&ACTIONS)
            .default(0)
            .interact_opt()?;

        match action {
            Some(0) => {
                if !prompt_domain(&mut session, &theme, redact)? {
                    break;
                }
            }
            Some(1) => {
                if !prompt_year(&mut session, &theme)? {
                    break;
                }
            }
            Some(2) => session.reload()?,
            _ => break,
        }
    }

    info!(
        action = "complete",
        component = "session",
        cache_hits = session.cache().hits(),
        cache_misses = session.cache().misses(),
        "Session ended"
    );
    Ok(())
}

/// Returns false when the prompt was cancelled.
fn prompt_domain(session: &mut Session, theme: &ColorfulTheme, redact: bool) -> Result<bool> {
    let domains = session.domains();
    let labels: Vec<String> = domains.iter().map(|d| display_domain(d, redact)).collect();
    let current = domains.iter().position(|d| d == session.domain()).unwrap_or(0);

    let selection = Select::with_theme(theme)
        .with_prompt("Domain")
        .items(&labels)
        .default(current)
        .interact_opt()?;

    match selection {
        Some(idx) => {
            session.select_domain(&domains[idx])?;
            Ok(true)
        }
        None => Ok(false),
    }
}

fn prompt_year(session: &mut Session, theme: &ColorfulTheme) -> Result<bool> {
    let years = session.years();
    if years.is_empty() {
        session.select_year(None);
        return Ok(true);
    }

    let mut labels = vec!["All years".to_string()];
    labels.extend(years.iter().map(|y| y.to_string()));
    let current = session
        .year()
        .and_then(|y| years.iter().position(|&candidate| candidate == y))
        .map_or(0, |idx| idx + 1);

    let selection = Select::with_theme(theme)
        .with_prompt("Publication year of blog URLs")
        .items(&labels)
        .default(current)
        .interact_opt()?;

    match selection {
        Some(0) => session.select_year(None),
        Some(idx) => session.select_year(Some(years[idx - 1])),
        None => return Ok(false),
    }
    Ok(true)
}
