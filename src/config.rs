//! Run configuration: timeouts, artifact paths, and per-site scrape targets.
//!
//! Loaded once from TOML, validated, and immutable for the run.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Placeholder inside `category_link` replaced with the category name.
pub const CATEGORY_NAME_PLACEHOLDER: &str = "CATEGORY_NAME";

/// Top-level configuration with layered loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// User agent presented by the browser session
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    #[serde(default)]
    pub viewport: Viewport,

    /// Extra HTTP headers sent with every request
    #[serde(default)]
    pub extra_headers: BTreeMap<String, String>,

    /// Default timeout for element lookups in milliseconds
    #[serde(default = "default_global_timeout_ms")]
    pub global_timeout_ms: u64,

    /// Window granted to the network-idle wait after entering a category
    #[serde(default = "default_network_idle_timeout_ms")]
    pub network_idle_timeout_ms: u64,

    /// Per-field timeout for item card reads
    #[serde(default = "default_item_timeout_ms")]
    pub item_timeout_ms: u64,

    /// Fixed politeness delay between page navigations
    #[serde(default = "default_page_delay_ms")]
    pub page_delay_ms: u64,

    /// Attempts per category job before giving up on it
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Optional safety cap on pages walked per category. Off by default to
    /// match the unbounded pagination loop this engine preserves.
    #[serde(default)]
    pub max_pages: Option<u32>,

    #[serde(default = "default_products_path")]
    pub products_path: PathBuf,

    #[serde(default = "default_cookies_path")]
    pub cookies_path: PathBuf,

    /// Prefix for screenshot files, suffixed with `_<site>_<page>.jpg`
    #[serde(default = "default_screenshot_prefix")]
    pub screenshot_prefix: String,

    #[serde(default = "default_trace_path")]
    pub trace_path: PathBuf,

    #[serde(default)]
    pub enable_tracing: bool,

    #[serde(default)]
    pub websites: Vec<SiteConfig>,
}

/// Browser viewport dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self { width: 1280, height: 800 }
    }
}

/// One scrape target: a site root, its selector set, and its categories.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    pub name: String,
    pub url: String,
    pub selectors: SelectorSet,
    #[serde(default)]
    pub categories: Vec<Category>,
}

/// CSS selectors describing how to read one site's category listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectorSet {
    /// Category link pattern containing `CATEGORY_NAME`
    pub category_link: String,
    pub item_cards: String,
    pub item_title: String,
    pub item_price: String,
    pub next_page: String,
}

/// One category to walk on a site.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    /// Category-type tag stamped on every record
    #[serde(rename = "type")]
    pub kind: String,
    /// Link text matched against category-link candidates
    pub name: String,
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/131.0.0.0 Safari/537.36"
        .to_string()
}

fn default_global_timeout_ms() -> u64 {
    30_000
}

fn default_network_idle_timeout_ms() -> u64 {
    10_000
}

fn default_item_timeout_ms() -> u64 {
    5_000
}

fn default_page_delay_ms() -> u64 {
    2_000
}

fn default_max_attempts() -> u32 {
    3
}

fn default_products_path() -> PathBuf {
    PathBuf::from("products.json")
}

fn default_cookies_path() -> PathBuf {
    PathBuf::from("cookies.json")
}

fn default_screenshot_prefix() -> String {
    "screenshots/page".to_string()
}

fn default_trace_path() -> PathBuf {
    PathBuf::from("trace.zip")
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            viewport: Viewport::default(),
            extra_headers: BTreeMap::new(),
            global_timeout_ms: default_global_timeout_ms(),
            network_idle_timeout_ms: default_network_idle_timeout_ms(),
            item_timeout_ms: default_item_timeout_ms(),
            page_delay_ms: default_page_delay_ms(),
            max_attempts: default_max_attempts(),
            max_pages: None,
            products_path: default_products_path(),
            cookies_path: default_cookies_path(),
            screenshot_prefix: default_screenshot_prefix(),
            trace_path: default_trace_path(),
            enable_tracing: false,
            websites: Vec::new(),
        }
    }
}

impl RunConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading config from: {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Loads configuration with fallback to default locations.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        // 1. Explicit path takes precedence
        if let Some(path) = explicit_path {
            return Self::from_file(path);
        }

        // 2. Try current directory
        let local_config = Path::new("pricetrail.toml");
        if local_config.exists() {
            debug!("Found pricetrail.toml in current directory");
            return Self::from_file(local_config);
        }

        // 3. Try XDG config directory
        if let Some(config_dir) = dirs::config_dir() {
            let xdg_config = config_dir.join("pricetrail").join("config.toml");
            if xdg_config.exists() {
                debug!("Found config in XDG config directory");
                return Self::from_file(xdg_config);
            }
        }

        // 4. Return default config
        debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Applies environment variable overrides.
    pub fn with_env(mut self) -> Self {
        if let Ok(delay) = std::env::var("PRICETRAIL_DELAY") {
            if let Ok(d) = delay.parse() {
                self.page_delay_ms = d;
            }
        }

        if let Ok(attempts) = std::env::var("PRICETRAIL_MAX_ATTEMPTS") {
            if let Ok(a) = attempts.parse() {
                self.max_attempts = a;
            }
        }

        self
    }

    /// Checks the shape a run depends on: at least one site, complete selector
    /// sets, and a substitutable category-link pattern.
    pub fn validate(&self) -> Result<()> {
        if self.websites.is_empty() {
            bail!("No websites configured");
        }
        if self.max_attempts == 0 {
            bail!("max_attempts must be at least 1");
        }

        for site in &self.websites {
            if site.name.is_empty() {
                bail!("Site with url `{}` has an empty name", site.url);
            }
            if site.url.is_empty() {
                bail!("Site `{}` has an empty url", site.name);
            }
            if !site.selectors.category_link.contains(CATEGORY_NAME_PLACEHOLDER) {
                bail!(
                    "Site `{}`: category_link selector must contain the `{}` placeholder",
                    site.name,
                    CATEGORY_NAME_PLACEHOLDER
                );
            }
            for selector in [
                &site.selectors.item_cards,
                &site.selectors.item_title,
                &site.selectors.item_price,
                &site.selectors.next_page,
            ] {
                if selector.is_empty() {
                    bail!("Site `{}` has an empty selector", site.name);
                }
            }
            for category in &site.categories {
                if category.name.is_empty() || category.kind.is_empty() {
                    bail!("Site `{}` has a category with an empty name or type", site.name);
                }
            }
        }

        Ok(())
    }
}
