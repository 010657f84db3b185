use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE, USER_AGENT};
use std::time::Duration;
use log::debug;
use url::Url;

use crate::error::{HarvestError, NetworkError};

pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

const SORT_COLUMN: &str = "revised_at";

/// Source of listing pages. The harvester only talks to this.
pub trait Fetch {
    fn fetch_page(&self, page: u32) -> Result<String, NetworkError>;
}

/// Blocking HTTP client for one fandom's works listing. Built once per run; the
/// same headers and cookie jar go out with every request.
pub struct ListingClient {
    client: Client,
    listing: Url,
}

impl ListingClient {
    pub fn new(
        base_url: &Url,
        fandom: &str,
        user_agent: &str,
        timeout: Duration,
    ) -> Result<Self, HarvestError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(user_agent)
                .map_err(|e| HarvestError::Config(format!("user agent: {}", e)))?,
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));

        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .cookie_store(true)
            .build()
            .map_err(HarvestError::ClientBuild)?;

        Ok(ListingClient {
            client,
            listing: listing_url(base_url, fandom)?,
        })
    }

    pub fn page_url(&self, page: u32) -> Url {
        page_url(&self.listing, page)
    }
}

impl Fetch for ListingClient {
    fn fetch_page(&self, page: u32) -> Result<String, NetworkError> {
        let url = self.page_url(page);
        debug!("GET {}", url);

        let resp = self
            .client
            .get(url)
            .send()
            .map_err(|source| NetworkError::Transport { page, source })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(NetworkError::Status { page, status });
        }
        resp.text().map_err(|source| NetworkError::Body { page, source })
    }
}

/// `{base}/tags/{fandom}/works`. The fandom may arrive raw or already
/// percent-encoded; both address the same tag.
pub fn listing_url(base_url: &Url, fandom: &str) -> Result<Url, HarvestError> {
    let fandom = fandom.trim();
    if fandom.is_empty() {
        return Err(HarvestError::Config("fandom tag is empty".to_string()));
    }
    let decoded = urlencoding::decode(fandom)
        .map(|d| d.into_owned())
        .unwrap_or_else(|_| fandom.to_string());
    let encoded = urlencoding::encode(&decoded);

    let mut base = base_url.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    Ok(base.join(&format!("tags/{}/works", encoded))?)
}

pub fn page_url(listing: &Url, page: u32) -> Url {
    let mut url = listing.clone();
    url.query_pairs_mut()
        .append_pair("page", &page.to_string())
        .append_pair("work_search[sort_column]", SORT_COLUMN);
    url
}
