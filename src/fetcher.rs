//! Page retrieval from the portal
//!
//! [`PageSource`] is the seam between the worker pipeline and the network.
//! [`HttpFetcher`] is the production implementation: a GET with the bounded
//! retry policy from [`crate::retry`], followed by ISO-8859-1 decoding of the
//! body. Exhausting the retry budget yields [`Error::TransportExhausted`],
//! which ends the whole run.

use crate::config::{HarvestConfig, RetryConfig};
use crate::error::{Error, Result};
use crate::retry::{IsRetryable, fetch_with_retry};
use crate::types::ZoneCode;
use crate::utils::decode_latin1;

/// The two pages published for every zone
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ZonePage {
    /// Location and sample point coordinates
    Location,
    /// Sampling history of every sample point
    Samples,
}

/// Build the URL of one zone page
///
/// Appends `codZona=<code>` (and `pestanya=3` for the samples page) to the
/// base URL, keeping any query the base already carries.
pub fn zone_url(base: &url::Url, code: ZoneCode, page: ZonePage) -> String {
    let mut url = base.clone();
    {
        let mut query = url.query_pairs_mut();
        query.append_pair("codZona", &code.to_string());
        if page == ZonePage::Samples {
            query.append_pair("pestanya", "3");
        }
    }
    url.to_string()
}

/// Source of decoded page text
#[async_trait::async_trait]
pub trait PageSource: Send + Sync {
    /// Fetch `url` and return its text
    ///
    /// An `Err` is fatal to the run; implementations retry internally.
    async fn fetch(&self, url: &str) -> Result<String>;
}

/// Fetches portal pages over HTTP with bounded retry
pub struct HttpFetcher {
    client: reqwest::Client,
    retry: RetryConfig,
}

impl HttpFetcher {
    /// Create a fetcher from the run configuration
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created
    pub fn new(config: &HarvestConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| Error::config(format!("failed to create HTTP client: {}", e), "user_agent"))?;

        Ok(Self {
            client,
            retry: config.retry.clone(),
        })
    }

    async fn get_once(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send().await?;
        let status = response.status();

        // The portal is down: retry
        if status.is_server_error() {
            return Err(Error::Http {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        // Any other answer is a page; one without the expected labels is
        // skipped by the extractor like any unknown zone
        if !status.is_success() {
            tracing::debug!(url, status = status.as_u16(), "Portal answered with a client error");
        }

        let body = response.bytes().await?;
        Ok(decode_latin1(&body))
    }
}

#[async_trait::async_trait]
impl PageSource for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        tracing::trace!(url, "Fetching page");
        fetch_with_retry(&self.retry, || self.get_once(url))
            .await
            .map_err(|e| {
                if e.is_retryable() {
                    Error::TransportExhausted {
                        url: url.to_string(),
                        attempts: self.retry.max_attempts.max(1),
                        last_error: e.to_string(),
                    }
                } else {
                    e
                }
            })
    }
}
