//! Web page similarity: crawl pages, extract their main content, tokenize
//! it into n-grams and score the pages against each other.

pub mod batch;
pub mod checker;
pub mod config;
pub mod content;
pub mod crawlers;
pub mod error;
pub mod extractors;
pub mod metrics;
pub mod pool;
pub mod results;
pub mod tokenizer;
pub mod urls;
pub mod utils;

// Re-export commonly used types for convenience
pub use checker::{SimilarityChecker, compare_contents, cross_compare_contents};
pub use config::{AppConfig, CheckConfig, RequestKind, RequestParams};
pub use content::ContentGetter;
pub use crawlers::{Crawler, MemoryCache, PageCache};
pub use error::{BatchError, CheckError, ValidationError};
pub use extractors::{Extractor, ExtractorKind};
pub use metrics::Metric;
pub use results::{CheckOutcome, CrossSimilarity, MetricDistance, Page, Score, SimilarityEntry};
pub use tokenizer::{TokenizerConfig, Unit};
