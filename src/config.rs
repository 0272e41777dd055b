use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::Duration;

use crate::error::{ConfigError, ValidationError};
use crate::extractors::{ExtractorKind, SelectorSpec, SelectorType};
use crate::metrics::Metric;
use crate::tokenizer::TokenizerConfig;
use crate::urls;

/// Desktop browser agent sent when the caller does not override it
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_10_1) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/39.0.2171.95 Safari/537.36";

/// Cache expiry applied when caching is enabled without an explicit TTL (7 days)
pub const DEFAULT_EXPIRE_SECS: u64 = 604_800;

/// Settings for the page cache
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Time to live of a cached page in seconds
    #[serde(default = "default_expire_secs")]
    pub expire_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            expire_secs: default_expire_secs(),
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.expire_secs)
    }
}

/// Configuration for the HTTP crawler
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlConfig {
    /// `User-Agent` header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Per-URL fetch timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub fetch_timeout_secs: u64,

    /// Up to this many uncached URLs are fetched one after another
    #[serde(default = "default_sequential_limit")]
    pub sequential_limit: usize,

    /// Page cache settings; `None` disables caching
    #[serde(default)]
    pub cache: Option<CacheConfig>,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            fetch_timeout_secs: default_timeout_secs(),
            sequential_limit: default_sequential_limit(),
            cache: None,
        }
    }
}

impl CrawlConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

/// Configuration for content extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractConfig {
    /// Per-page extraction timeout in milliseconds
    #[serde(default = "default_extract_timeout_ms")]
    pub timeout_ms: u64,

    /// Batches larger than this are extracted on a worker pool
    #[serde(default = "default_parallel_threshold")]
    pub parallel_threshold: usize,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_extract_timeout_ms(),
            parallel_threshold: default_parallel_threshold(),
        }
    }
}

impl ExtractConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Selectors of the selective extractor, one per audience
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selectors {
    #[serde(default)]
    pub main_page: Option<String>,
    #[serde(default)]
    pub sub_page: Option<String>,
    #[serde(default)]
    pub url_1: Option<String>,
    #[serde(default)]
    pub url_2: Option<String>,
    #[serde(default)]
    pub url_3: Option<String>,
}

/// Immutable settings of one similarity request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckConfig {
    #[serde(default)]
    pub metric: Metric,

    #[serde(default)]
    pub tokenizer: TokenizerConfig,

    #[serde(default)]
    pub extractor: ExtractorKind,

    #[serde(default)]
    pub selectors: Selectors,

    #[serde(default)]
    pub crawl: CrawlConfig,

    #[serde(default)]
    pub extract: ExtractConfig,
}

impl CheckConfig {
    /// Effective extractor for one audience.
    ///
    /// Only a selective extractor is affected: it takes `selector` when one
    /// is given and keeps its own otherwise.
    pub fn extractor_for(&self, selector: Option<&str>) -> ExtractorKind {
        match (&self.extractor, selector) {
            (ExtractorKind::Selective(spec), Some(selector)) => ExtractorKind::Selective(SelectorSpec {
                selector: selector.trim().to_string(),
                selector_type: spec.selector_type,
            }),
            (kind, _) => kind.clone(),
        }
    }

    /// True when main and sub pages are extracted with their own selectors
    pub fn has_page_selectors(&self) -> bool {
        self.extractor.is_selective()
            && self.selectors.main_page.is_some()
            && self.selectors.sub_page.is_some()
    }

    /// True when each cross-check URL is extracted with its own selector
    pub fn has_url_selectors(&self) -> bool {
        self.extractor.is_selective()
            && self.selectors.url_1.is_some()
            && self.selectors.url_2.is_some()
            && self.selectors.url_3.is_some()
    }
}

/// Which request surface the parameters belong to; decides which selectors
/// a selective extraction requires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Check,
    CrossCheck,
    Extract,
}

impl RequestKind {
    fn required_selectors(&self) -> &'static [&'static str] {
        match self {
            RequestKind::Check => &["main_page_selector", "sub_page_selector"],
            RequestKind::CrossCheck => &["url_1_selector", "url_2_selector", "url_3_selector"],
            RequestKind::Extract => &["selector"],
        }
    }
}

/// Raw request parameters, as received from a form or the command line
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestParams {
    #[serde(default)]
    pub distance_metric: Option<String>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub min_ngram: Option<usize>,
    #[serde(default)]
    pub max_ngram: Option<usize>,
    #[serde(default)]
    pub extractor: Option<String>,
    #[serde(default)]
    pub selector: Option<String>,
    #[serde(default)]
    pub selector_type: Option<String>,
    #[serde(default)]
    pub main_page_selector: Option<String>,
    #[serde(default)]
    pub sub_page_selector: Option<String>,
    #[serde(default)]
    pub url_1_selector: Option<String>,
    #[serde(default)]
    pub url_2_selector: Option<String>,
    #[serde(default)]
    pub url_3_selector: Option<String>,
    #[serde(default)]
    pub user_agent: Option<String>,
    #[serde(default)]
    pub cache: bool,
    #[serde(default)]
    pub expire_time: Option<u64>,
}

impl RequestParams {
    /// Validates the parameters and layers them over `base`.
    ///
    /// Reports the first failure found; nothing is fetched before this
    /// succeeds.
    pub fn into_check_config(
        self,
        kind: RequestKind,
        base: &CheckConfig,
    ) -> Result<CheckConfig, ValidationError> {
        let mut config = base.clone();

        if let Some(name) = non_blank(&self.distance_metric) {
            config.metric = name.parse()?;
        }

        let unit = match non_blank(&self.unit) {
            Some(unit) => unit.parse()?,
            None => config.tokenizer.unit,
        };
        config.tokenizer = TokenizerConfig::new(
            unit,
            self.min_ngram.unwrap_or(config.tokenizer.min_ngram),
            self.max_ngram.unwrap_or(config.tokenizer.max_ngram),
        );

        if let Some(name) = non_blank(&self.extractor) {
            config.extractor = name.parse()?;
        }

        if config.extractor.is_selective() {
            let selector_type = match non_blank(&self.selector_type) {
                Some(selector_type) => selector_type.parse()?,
                None => SelectorType::Css,
            };

            for &field in kind.required_selectors() {
                if non_blank(self.selector_field(field)).is_none() {
                    return Err(ValidationError::MissingSelector(field));
                }
            }

            config.extractor = ExtractorKind::Selective(SelectorSpec {
                selector: non_blank(&self.selector).unwrap_or_default().to_string(),
                selector_type,
            });
            config.selectors = Selectors {
                main_page: owned(&self.main_page_selector),
                sub_page: owned(&self.sub_page_selector),
                url_1: owned(&self.url_1_selector),
                url_2: owned(&self.url_2_selector),
                url_3: owned(&self.url_3_selector),
            };
        }

        if let Some(user_agent) = non_blank(&self.user_agent) {
            config.crawl.user_agent = user_agent.to_string();
        }

        if self.cache {
            config.crawl.cache = Some(CacheConfig {
                expire_secs: self.expire_time.unwrap_or(DEFAULT_EXPIRE_SECS),
            });
        }

        Ok(config)
    }

    fn selector_field(&self, field: &str) -> &Option<String> {
        match field {
            "main_page_selector" => &self.main_page_selector,
            "sub_page_selector" => &self.sub_page_selector,
            "url_1_selector" => &self.url_1_selector,
            "url_2_selector" => &self.url_2_selector,
            "url_3_selector" => &self.url_3_selector,
            _ => &self.selector,
        }
    }
}

/// Validates the main/sub URL pair of a check request
pub fn check_urls(main_url: &str, sub_urls: &str) -> Result<(String, Vec<String>), ValidationError> {
    let main_url = main_url.trim();
    if main_url.is_empty() {
        return Err(ValidationError::BlankUrl("main_url"));
    }
    let sub_urls = urls::split_list(sub_urls);
    if sub_urls.is_empty() {
        return Err(ValidationError::BlankUrl("sub_urls"));
    }
    Ok((main_url.to_string(), sub_urls))
}

/// Validates the three URLs of a cross-check request
pub fn cross_check_urls(urls: [&str; 3]) -> Result<[String; 3], ValidationError> {
    const NAMES: [&str; 3] = ["url_1", "url_2", "url_3"];
    for (url, name) in urls.iter().zip(NAMES) {
        if url.trim().is_empty() {
            return Err(ValidationError::BlankUrl(name));
        }
    }
    Ok(urls.map(|url| url.trim().to_string()))
}

/// Logging settings applied once at startup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter, e.g. `info` or `page_similarity=debug`
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Prefix every record with a timestamp
    #[serde(default = "default_timestamps")]
    pub timestamps: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            timestamps: default_timestamps(),
        }
    }
}

/// Top-level configuration file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub check: CheckConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        let config: Self = serde_json::from_str(&contents)?;
        Ok(config)
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn owned(value: &Option<String>) -> Option<String> {
    non_blank(value).map(str::to_string)
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_timeout_secs() -> u64 {
    5
}

fn default_extract_timeout_ms() -> u64 {
    5_000
}

fn default_sequential_limit() -> usize {
    2
}

fn default_expire_secs() -> u64 {
    DEFAULT_EXPIRE_SECS
}

fn default_parallel_threshold() -> usize {
    10
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_timestamps() -> bool {
    true
}
