use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;

// Include the default config at compile time
const DEFAULT_CONFIG: &str = include_str!("../default_config.toml");

pub const DEFAULT_CONFIG_FILE: &str = "blogrank.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub columns: ColumnsConfig,

    #[serde(default)]
    pub display: DisplayConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_keywords_path")]
    pub keywords: PathBuf,

    #[serde(default = "default_blog_urls_path")]
    pub blog_urls: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            keywords: default_keywords_path(),
            blog_urls: default_blog_urls_path(),
        }
    }
}

fn default_keywords_path() -> PathBuf {
    PathBuf::from("data/keywords.csv")
}

fn default_blog_urls_path() -> PathBuf {
    PathBuf::from("data/urls_domains.csv")
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColumnsConfig {
    #[serde(default)]
    pub keywords: KeywordColumns,

    #[serde(default)]
    pub blog_urls: BlogUrlColumns,
}

/// Header names in the keyword rankings file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeywordColumns {
    pub domain: String,
    pub url: String,
    pub position: String,
    pub search_volume: String,
}

impl Default for KeywordColumns {
    fn default() -> Self {
        Self {
            domain: "domain".to_string(),
            url: "URL".to_string(),
            position: "Position".to_string(),
            search_volume: "Search Volume".to_string(),
        }
    }
}

/// Header names in the blog URL inventory file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlogUrlColumns {
    pub domain: String,
    pub url: String,
    pub last_modified: String,
}

impl Default for BlogUrlColumns {
    fn default() -> Self {
        Self {
            domain: "DOMAIN".to_string(),
            url: "URL".to_string(),
            last_modified: "LastModified".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub thousands_separator: String,
    pub bar_width: usize,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            thousands_separator: ".".to_string(),
            bar_width: 40,
        }
    }
}

impl Config {
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        if config.display.bar_width == 0 {
            anyhow::bail!("display.bar_width must be greater than 0");
        }
        Ok(config)
    }

    /// Resolve configuration: explicit file, then `blogrank.toml` in the
    /// working directory, then the embedded defaults.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let start_time = Instant::now();
        info!(
            action = "start",
            component = "config_loading",
            "Starting configuration loading"
        );

        let config = if let Some(path) = config_path {
            info!(action = "load", component = "config_file", file_path = ?path, "Loading config from specified file");
            if !path.exists() {
                anyhow::bail!("Config file not found: {:?}", path);
            }
            let content = fs::read_to_string(path)?;
            Self::from_toml(&content)
                .with_context(|| format!("Invalid config file {:?}", path))?
        } else {
            let default_file = Path::new(DEFAULT_CONFIG_FILE);
            if default_file.exists() {
                info!(action = "load", component = "default_config_file", file_path = ?default_file, "Loading config from default file");
                let content = fs::read_to_string(default_file)?;
                Self::from_toml(&content)
                    .with_context(|| format!("Invalid config file {:?}", default_file))?
            } else {
                info!(
                    action = "load",
                    component = "embedded_config",
                    "Using embedded default config"
                );
                Self::from_toml(DEFAULT_CONFIG).context("Failed to parse embedded default config")?
            }
        };

        let load_time = start_time.elapsed();
        info!(
            action = "complete",
            component = "config_loading",
            keywords = ?config.data.keywords,
            blog_urls = ?config.data.blog_urls,
            duration_ms = load_time.as_millis(),
            "Configuration resolved"
        );
        Ok(config)
    }
}

pub fn init_default_config() -> Result<()> {
    let default_file = Path::new(DEFAULT_CONFIG_FILE);

    if default_file.exists() {
        anyhow::bail!(
            "{} already exists. Remove it first if you want to reinitialize.",
            DEFAULT_CONFIG_FILE
        );
    }

    fs::write(default_file, DEFAULT_CONFIG)?;
    println!("Created {} with default settings", DEFAULT_CONFIG_FILE);

    Ok(())
}
