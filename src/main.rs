use clap::Parser;
use serde_json::{Value, json};
use std::error::Error;
use std::sync::Arc;

use page_similarity::config::{self, AppConfig, LoggingConfig, RequestKind, RequestParams};
use page_similarity::tokenizer::TokenizerConfig;
use page_similarity::{
    CheckOutcome, MemoryCache, SimilarityChecker, Unit, compare_contents, cross_compare_contents,
    urls,
};

mod args;
use args::{Args, Command};

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let app_config = match &args.config {
        Some(path) => match AppConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Failed to load {}: {}", path.display(), e);
                std::process::exit(2);
            }
        },
        None => AppConfig::default(),
    };
    init_logging(&app_config.logging);

    let start_time = std::time::Instant::now();
    let (response, failed) = match run(args.command, &app_config).await {
        Ok(response) => (response, false),
        Err(e) => {
            ::log::error!("Request failed: {}", e);
            (json!({ "error": e.to_string() }), true)
        }
    };
    ::log::info!(
        "Request complete in {:.2} seconds",
        start_time.elapsed().as_secs_f64()
    );

    match serde_json::to_string_pretty(&response) {
        Ok(output) => println!("{}", output),
        Err(e) => ::log::error!("Failed to serialize response: {}", e),
    }
    if failed {
        std::process::exit(1);
    }
}

/// Configures `env_logger` from the config file; `RUST_LOG` takes precedence
fn init_logging(config: &LoggingConfig) {
    let env = env_logger::Env::default().default_filter_or(config.level.as_str());
    let mut builder = env_logger::Builder::from_env(env);
    if !config.timestamps {
        builder.format_timestamp(None);
    }
    builder.init();
}

async fn run(command: Command, app_config: &AppConfig) -> Result<Value, Box<dyn Error>> {
    let checker = SimilarityChecker::new().with_cache(Arc::new(MemoryCache::new()));

    match command {
        Command::Check {
            main_url,
            sub_urls,
            options,
        } => {
            let (main_url, sub_urls) = config::check_urls(&main_url, &sub_urls)?;
            let config = RequestParams::from(options)
                .into_check_config(RequestKind::Check, &app_config.check)?;

            match checker.process(&config, &main_url, &sub_urls).await? {
                CheckOutcome::MainPageEmpty => Ok(json!({ "error": "Main page is empty" })),
                CheckOutcome::Ranked(entries) => Ok(json!({ "error": false, "similarity": entries })),
            }
        }
        Command::CrossCheck {
            url_1,
            url_2,
            url_3,
            options,
        } => {
            let [url_1, url_2, url_3] =
                config::cross_check_urls([url_1.as_str(), url_2.as_str(), url_3.as_str()])?;
            let config = RequestParams::from(options)
                .into_check_config(RequestKind::CrossCheck, &app_config.check)?;

            let similarity = checker.cross_process(&config, &url_1, &url_2, &url_3).await?;
            Ok(json!({ "error": false, "similarity": similarity }))
        }
        Command::Extract { urls, options } => {
            let urls = urls::split_list(&urls);
            let config = RequestParams::from(options)
                .into_check_config(RequestKind::Extract, &app_config.check)?;

            let pages = checker.extract_pages(&config, &urls).await?;
            Ok(json!({ "error": false, "pages": pages }))
        }
        Command::Compare {
            content_1,
            content_2,
            content_3,
            distance_metrics,
            unit,
            min_ngram,
            max_ngram,
        } => {
            let base = app_config.check.tokenizer;
            let unit = match unit.as_deref().map(str::trim).filter(|u| !u.is_empty()) {
                Some(unit) => unit.parse::<Unit>()?,
                None => base.unit,
            };
            let tokenizer = TokenizerConfig::new(
                unit,
                min_ngram.unwrap_or(base.min_ngram),
                max_ngram.unwrap_or(base.max_ngram),
            );
            let metrics = urls::split_list(&distance_metrics);

            let result = match content_3 {
                Some(content_3) => serde_json::to_value(cross_compare_contents(
                    &tokenizer, &content_1, &content_2, &content_3, &metrics,
                ))?,
                None => serde_json::to_value(compare_contents(
                    &tokenizer, &content_1, &content_2, &metrics,
                ))?,
            };
            Ok(json!({ "error": false, "result": result }))
        }
    }
}
