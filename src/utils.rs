use std::io;
use time::macros::format_description;
use tracing_subscriber::fmt::time::LocalTime;
use tracing_subscriber::EnvFilter;

use crate::args::{Args, OutputFormat};

/// Install the stderr tracing subscriber. `RUST_LOG` wins over `--verbose`.
pub fn setup_logging(verbose: bool) {
    let default_level = if verbose { "info" } else { "error" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let timer = LocalTime::new(format_description!(
        "[hour]:[minute]:[second].[subsecond digits:3]"
    ));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(timer)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

pub fn format_number(num: u64, separator: &str) -> String {
    let digits = num.to_string();
    let mut groups: Vec<&str> = Vec::new();
    let mut end = digits.len();
    while end > 3 {
        groups.push(&digits[end - 3..end]);
        end -= 3;
    }
    groups.push(&digits[..end]);
    groups.reverse();
    groups.join(separator)
}

pub fn format_percent(pct: f64) -> String {
    format!("{:.2}%", pct)
}

pub fn redact_domain(domain: &str) -> String {
    let parts: Vec<&str> = domain.split('.').collect();
    if parts.len() <= 1 {
        return domain.to_string();
    }

    if parts[parts.len() - 2].len() <= 3 {
        return format!("???.{}", parts[parts.len() - 1]);
    }

    let redacted_parts: Vec<String> = parts[..parts.len() - 1]
        .iter()
        .map(|part| "*".repeat(part.len()))
        .collect();

    let mut result = redacted_parts.join(".");
    result.push('.');
    result.push_str(parts[parts.len() - 1]);
    result
}

pub fn validate_args(args: &Args) -> anyhow::Result<()> {
    if let Some(workers) = args.workers {
        if workers == 0 {
            anyhow::bail!("--workers must be greater than 0");
        }
    }

    if args.interactive {
        if args.format == OutputFormat::Json {
            anyhow::bail!("--interactive cannot be combined with --format json");
        }
        if args.all {
            anyhow::bail!("--interactive cannot be combined with --all");
        }
    }

    if args.all && args.domain.is_some() {
        anyhow::bail!("--all cannot be combined with --domain");
    }

    Ok(())
}
