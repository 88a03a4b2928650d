use std::path::PathBuf;

use thiserror::Error;

/// Failure to retrieve a document from the catalog.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Load(#[from] config::ConfigError),
    #[error("no page patterns configured")]
    NoPatterns,
    #[error("{0} must be greater than zero")]
    Zero(&'static str),
    #[error("delimiter {0:?} must be a single ASCII character other than ','")]
    Delimiter(String),
    #[error("invalid selector {selector:?}: {reason}")]
    Selector { selector: String, reason: String },
    #[error("invalid base url {url:?}: {reason}")]
    BaseUrl { url: String, reason: String },
    #[error("invalid page template {template:?}: {reason}")]
    Template { template: String, reason: String },
    #[error("pacing delay {0} must be a number of seconds between 0 and {max}", max = MAX_PACING_SECS)]
    PacingDelay(f64),
    #[error("pattern {template:?} starting at page {start} with {count} pages runs past the largest page number")]
    PageRange {
        template: String,
        start: usize,
        count: usize,
    },
}

/// Longest accepted pause between index pages, one day.
pub const MAX_PACING_SECS: f64 = 86_400.0;

#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("index page {url} could not be fetched")]
    IndexPage {
        url: String,
        #[source]
        source: FetchError,
    },
    #[error("failed to write dataset: {0}")]
    Output(#[from] csv::Error),
    #[error("failed to create {path:?}")]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
