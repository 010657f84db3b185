use reqwest::StatusCode;
use thiserror::Error;

/// Failure to obtain a listing page. Always recoverable: the page is skipped.
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("request for page {page} failed: {source}")]
    Transport {
        page: u32,
        #[source]
        source: reqwest::Error,
    },
    #[error("page {page} returned HTTP {status}")]
    Status { page: u32, status: StatusCode },
    #[error("could not read body of page {page}: {source}")]
    Body {
        page: u32,
        #[source]
        source: reqwest::Error,
    },
}

/// A single work node that could not be turned into a record.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("word count {raw:?} is not a number")]
    WordCount { raw: String },
}

/// Persisting a page failed. Never caught by the harvester.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("output file {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error("could not encode tags: {0}")]
    Tags(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("invalid selector {selector:?}: {reason}")]
    Selector { selector: String, reason: String },
    #[error("invalid base url: {0}")]
    BaseUrl(#[from] url::ParseError),
    #[error("could not build http client: {0}")]
    ClientBuild(#[source] reqwest::Error),
    #[error(transparent)]
    Sink(#[from] SinkError),
}
