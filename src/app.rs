use anyhow::Result;
use std::time::Instant;
use tracing::{info, warn};

use crate::analysis;
use crate::args::{Args, OutputFormat};
use crate::config::{self, Config};
use crate::interactive::{self, Session};
use crate::loader::{DataSource, Dataset};
use crate::report::{self, display_domain, Report};

pub fn run(args: &Args) -> Result<()> {
    if args.init {
        return config::init_default_config();
    }

    let total_start_time = Instant::now();
    info!(action = "start", component = "blogrank", "Starting blog performance analysis");

    let config = Config::load(args.config.as_deref())?;
    let source = DataSource {
        keywords: args.keywords.clone().unwrap_or_else(|| config.data.keywords.clone()),
        blog_urls: args.blog_urls.clone().unwrap_or_else(|| config.data.blog_urls.clone()),
        columns: config.columns.clone(),
        strict: args.strict,
    };
    let dataset = source.load()?;

    if args.interactive {
        let mut session = Session::new(source, dataset)?;
        if let Some(domain) = &args.domain {
            session.select_domain(domain)?;
        }
        session.select_year(args.year);
        return interactive::run_session(session, &config.display, args.redact);
    }

    if args.list_domains {
        let domains: Vec<String> = analysis::domains(&dataset.keywords)
            .iter()
            .map(|d| display_domain(d, args.redact))
            .collect();
        match args.format {
            OutputFormat::Json => println!("{}", report::render_json(&domains)?),
            OutputFormat::Text => domains.iter().for_each(|d| println!("{}", d)),
        }
        return Ok(());
    }

    if args.all {
        let results = analysis::analyze_all(&dataset, args.year, args.workers)?;
        match args.format {
            OutputFormat::Json => {
                let reports: Vec<Report<'_>> = results
                    .iter()
                    .map(|r| Report::new(r, &dataset.blog_urls, args.redact))
                    .collect();
                println!("{}", report::render_json(&reports)?);
            }
            OutputFormat::Text => print!(
                "{}",
                report::render_summary(&results, &config.display, args.redact)
            ),
        }
        log_completion(total_start_time);
        return Ok(());
    }

    let domain = resolve_domain(&dataset, args.domain.as_deref())?;

    if args.list_years {
        if !dataset.blog_urls.has_last_modified {
            warn!(action = "list", component = "publication_years", "Blog URL table has no last-modified dates");
        }
        let years = analysis::publication_years(&domain, &dataset.blog_urls);
        match args.format {
            OutputFormat::Json => println!("{}", report::render_json(&years)?),
            OutputFormat::Text => years.iter().for_each(|y| println!("{}", y)),
        }
        return Ok(());
    }

    if let Some(year) = args.year {
        if dataset.blog_urls.has_last_modified
            && !analysis::publication_years(&domain, &dataset.blog_urls).contains(&year)
        {
            warn!(action = "filter", component = "publication_years", domain = %domain, year, "No blog URLs published in the requested year");
        }
    }

    let result = analysis::analyze(&domain, &dataset.keywords, &dataset.blog_urls, args.year);
    let report = Report::new(&result, &dataset.blog_urls, args.redact);
    match args.format {
        OutputFormat::Json => println!("{}", report::render_json(&report)?),
        OutputFormat::Text => print!("{}", report::render_text(&report, &config.display)),
    }

    if args.format == OutputFormat::Text {
        if dataset.skipped_keyword_rows > 0 {
            println!(
                "\nNote: {} keyword rows skipped (missing domain/URL or non-numeric position/volume)",
                dataset.skipped_keyword_rows
            );
        }
        if dataset.skipped_blog_url_rows > 0 {
            println!(
                "Note: {} blog URL rows skipped (missing domain/URL)",
                dataset.skipped_blog_url_rows
            );
        }
    }

    log_completion(total_start_time);
    Ok(())
}

/// The requested domain if the keyword table has it, else the first domain.
pub fn resolve_domain(dataset: &Dataset, requested: Option<&str>) -> Result<String> {
    match requested {
        Some(domain) => {
            if !dataset.keywords.iter().any(|row| row.domain == domain) {
                anyhow::bail!("Domain '{}' not found in keyword rankings", domain);
            }
            Ok(domain.to_string())
        }
        None => interactive::first_domain(dataset),
    }
}

fn log_completion(start_time: Instant) {
    let total_time = start_time.elapsed();
    info!(
        action = "complete",
        component = "blogrank",
        duration_ms = total_time.as_millis(),
        "Analysis completed successfully"
    );
}
