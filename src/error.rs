use thiserror::Error;

/// Request-level validation failures, detected before any network activity
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("distance_metric must be in {0}")]
    UnknownMetric(String),

    #[error("unit must be in word, character")]
    UnknownUnit,

    #[error("The extractor name '{0}' does not support yet")]
    UnknownExtractor(String),

    #[error("selector_type must be in css, xpath")]
    UnknownSelectorType,

    /// A selective extraction was requested without the named selector field
    #[error("You must specify the '{0}' element when the 'extractor' is 'selective'")]
    MissingSelector(&'static str),

    /// A required URL parameter was absent or blank
    #[error("{0} must not blank")]
    BlankUrl(&'static str),

    #[error("urls must not be empty")]
    NoUrls,

    #[error("File must contain at least {0} fields")]
    TooFewColumns(usize),

    #[error("Row {row} has {found} fields, expected {expected}")]
    RowWidth {
        row: usize,
        found: usize,
        expected: usize,
    },
}

/// Failures of a batch cross check
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BatchError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Batch cancelled")]
    Cancelled,
}

/// Failures of the external page cache
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache backend unavailable: {0}")]
    Backend(String),

    #[error("cached page is not valid JSON: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors while loading configuration files
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config: {0}")]
    Json(#[from] serde_json::Error),
}

/// Request-level failures of the similarity pipeline.
///
/// Per-page failures never end up here; they are recorded on the page.
#[derive(Debug, Error)]
pub enum CheckError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}
