use clap::{Parser, Subcommand};
use page_similarity::RequestParams;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "page-similarity")]
#[command(about = "Scores how similar web pages are to each other")]
#[command(version)]
pub struct Args {
    /// JSON configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compare a main page against a list of sub pages
    Check {
        #[arg(long)]
        main_url: String,

        /// Comma-separated sub page URLs
        #[arg(long)]
        sub_urls: String,

        #[command(flatten)]
        options: RequestOptions,
    },

    /// Pairwise comparison of three pages
    CrossCheck {
        #[arg(long)]
        url_1: String,

        #[arg(long)]
        url_2: String,

        #[arg(long)]
        url_3: String,

        #[command(flatten)]
        options: RequestOptions,
    },

    /// Fetch, extract and tokenize pages
    Extract {
        /// Comma-separated URLs
        #[arg(long)]
        urls: String,

        #[command(flatten)]
        options: RequestOptions,
    },

    /// Compare two or three raw texts
    Compare {
        #[arg(long)]
        content_1: String,

        #[arg(long)]
        content_2: String,

        #[arg(long)]
        content_3: Option<String>,

        /// Comma-separated metric names; every metric when empty
        #[arg(long, default_value = "")]
        distance_metrics: String,

        /// word or character
        #[arg(long)]
        unit: Option<String>,

        #[arg(long)]
        min_ngram: Option<usize>,

        #[arg(long)]
        max_ngram: Option<usize>,
    },
}

/// Request parameters shared by the page commands
#[derive(clap::Args, Debug, Clone, Default)]
pub struct RequestOptions {
    /// jaccard, cosine, fuzzy or simhash
    #[arg(long)]
    pub distance_metric: Option<String>,

    /// word or character
    #[arg(long)]
    pub unit: Option<String>,

    #[arg(long)]
    pub min_ngram: Option<usize>,

    #[arg(long)]
    pub max_ngram: Option<usize>,

    /// dragnet, readability, goose, goose_dragnet, selective or all_text
    #[arg(long)]
    pub extractor: Option<String>,

    #[arg(long)]
    pub selector: Option<String>,

    /// css or xpath
    #[arg(long)]
    pub selector_type: Option<String>,

    #[arg(long)]
    pub main_page_selector: Option<String>,

    #[arg(long)]
    pub sub_page_selector: Option<String>,

    #[arg(long)]
    pub url_1_selector: Option<String>,

    #[arg(long)]
    pub url_2_selector: Option<String>,

    #[arg(long)]
    pub url_3_selector: Option<String>,

    #[arg(long)]
    pub user_agent: Option<String>,

    /// Reuse fetched pages until they expire
    #[arg(long)]
    pub cache: bool,

    /// Cache expiry in seconds
    #[arg(long)]
    pub expire_time: Option<u64>,
}

impl From<RequestOptions> for RequestParams {
    fn from(options: RequestOptions) -> Self {
        Self {
            distance_metric: options.distance_metric,
            unit: options.unit,
            min_ngram: options.min_ngram,
            max_ngram: options.max_ngram,
            extractor: options.extractor,
            selector: options.selector,
            selector_type: options.selector_type,
            main_page_selector: options.main_page_selector,
            sub_page_selector: options.sub_page_selector,
            url_1_selector: options.url_1_selector,
            url_2_selector: options.url_2_selector,
            url_3_selector: options.url_3_selector,
            user_agent: options.user_agent,
            cache: options.cache,
            expire_time: options.expire_time,
        }
    }
}
