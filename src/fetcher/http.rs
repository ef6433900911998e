//! HTTP fetch with retry, shared by every adapter.
//!
//! Requests carry a browser-like header set. The user-agent version is
//! re-rolled per request, since some bank sites answer a static signature
//! with 403.

use rand::Rng;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL, REFERER, RETRY_AFTER, USER_AGENT};
use reqwest::{Client, Response, StatusCode};
use scraper::Html;
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

pub const BASE_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

pub const PAGE_TIMEOUT: Duration = Duration::from_secs(25);
pub const REFERENCE_TIMEOUT: Duration = Duration::from_secs(20);

const MAX_BACKOFF: Duration = Duration::from_secs(120);
// statuses whose Retry-After header is honoured
const RETRY_AFTER_STATUSES: [u16; 3] = [413, 429, 503];

#[derive(Error, Debug)]
pub enum FetchError {
    /// Connection failure, timeout or other transport problem.
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The final response (after retries) was not a success.
    #[error("{url} answered HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("could not read body of {url}: {source}")]
    Body {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Body was not the expected JSON document.
    #[error("invalid JSON from {url}: {source}")]
    Json {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// First backoff delay; each further retry doubles it.
    pub backoff_factor: Duration,
    pub statuses: Vec<u16>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_factor: Duration::from_millis(800),
            statuses: vec![403, 429, 500, 502, 503, 504],
        }
    }
}

impl RetryPolicy {
    /// Never retry. Used by tests that want a single request per fetch.
    pub fn none() -> Self {
        Self { max_retries: 0, ..Self::default() }
    }

    /// Delay before retry number `retry` (1-based).
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry.saturating_sub(1));
        self.backoff_factor.saturating_mul(factor).min(MAX_BACKOFF)
    }

    fn should_retry(&self, status: StatusCode) -> bool {
        self.statuses.contains(&status.as_u16())
    }
}

/// A fetched page: the raw body plus where it ended up after redirects.
#[derive(Debug, Clone)]
pub struct Page {
    pub final_url: String,
    pub body: String,
}

impl Page {
    pub fn document(&self) -> Html {
        Html::parse_document(&self.body)
    }
}

#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
    retry: RetryPolicy,
    page_timeout: Duration,
}

impl HttpFetcher {
    pub fn new(retry: RetryPolicy) -> Self {
        Self {
            client: Client::builder()
                .redirect(reqwest::redirect::Policy::limited(10))
                .cookie_store(true)
                .build()
                .unwrap_or_else(|_| Client::new()),
            retry,
            page_timeout: PAGE_TIMEOUT,
        }
    }

    /// GET an HTML page with browser headers.
    pub async fn get_page(&self, url: &str) -> Result<Page, FetchError> {
        let resp = self.send_with_retry(url, self.page_timeout, true).await?;
        let final_url = resp.url().to_string();
        let body = resp.text().await.map_err(|source| FetchError::Body {
            url: url.to_string(),
            source,
        })?;

        Ok(Page { final_url, body })
    }

    /// GET a JSON document with plain client headers.
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str, timeout: Duration) -> Result<T, FetchError> {
        let resp = self.send_with_retry(url, timeout, false).await?;
        resp.json::<T>().await.map_err(|source| FetchError::Json {
            url: url.to_string(),
            source,
        })
    }

    async fn send_with_retry(&self, url: &str, timeout: Duration, browser: bool) -> Result<Response, FetchError> {
        let mut retries = 0u32;

        loop {
            let mut req = self.client.get(url).timeout(timeout);
            if browser {
                req = req.headers(browser_headers());
            }

            match req.send().await {
                Ok(resp) => {
                    let status = resp.status();

                    if self.retry.should_retry(status) && retries < self.retry.max_retries {
                        retries += 1;
                        let delay = retry_after(&resp).unwrap_or_else(|| self.retry.backoff(retries));
                        warn!(url, status = status.as_u16(), retry = retries, ?delay, "retrying");
                        tokio::time::sleep(delay).await;
                        continue;
                    }

                    if !status.is_success() {
                        return Err(FetchError::Status {
                            url: url.to_string(),
                            status: status.as_u16(),
                        });
                    }

                    debug!(url, status = status.as_u16(), "fetched");
                    return Ok(resp);
                }
                Err(source) => {
                    let transient = source.is_connect() || source.is_timeout();
                    if transient && retries < self.retry.max_retries {
                        retries += 1;
                        let delay = self.retry.backoff(retries);
                        warn!(url, error = %source, retry = retries, ?delay, "retrying");
                        tokio::time::sleep(delay).await;
                        continue;
                    }

                    return Err(FetchError::Transport {
                        url: url.to_string(),
                        source,
                    });
                }
            }
        }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new(RetryPolicy::default())
    }
}

/// Chrome user-agent with a random build number, e.g. `Chrome/124817.0.0`.
pub fn randomized_user_agent() -> String {
    let tail: u32 = rand::thread_rng().gen_range(1000..10000);
    BASE_USER_AGENT.replace("120.0.0.0", &format!("12{}.0.0", tail))
}

fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    if let Ok(ua) = HeaderValue::from_str(&randomized_user_agent()) {
        headers.insert(USER_AGENT, ua);
    }
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
    );
    headers.insert(
        ACCEPT_LANGUAGE,
        HeaderValue::from_static("ru-RU,ru;q=0.9,en-US;q=0.8,en;q=0.7"),
    );
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(REFERER, HeaderValue::from_static("https://www.google.com/"));
    headers
}

fn retry_after(resp: &Response) -> Option<Duration> {
    if !RETRY_AFTER_STATUSES.contains(&resp.status().as_u16()) {
        return None;
    }
    let header = resp.headers().get(RETRY_AFTER)?;
    parse_retry_after(header.to_str().ok()?)
}

fn parse_retry_after(value: &str) -> Option<Duration> {
    let secs = value.trim().parse::<u64>().ok()?;
    Some(Duration::from_secs(secs).min(MAX_BACKOFF))
}
