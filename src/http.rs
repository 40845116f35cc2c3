//! HTTP transport seam: the `HttpClient` trait and its reqwest implementation.

use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use crate::error::Error;

/// Default bound on a single page fetch.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(8);

/// Desktop browser user agent. The documentation host rejects unidentified clients.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Request headers sent with every fetch, user agent included.
#[derive(Debug, Clone)]
pub struct RequestHeaders {
    /// Name/value pairs in send order.
    pairs: Vec<(String, String)>,
}

impl RequestHeaders {
    /// Browser-like headers with the given user agent.
    pub fn browser(user_agent: &str) -> Self {
        let pairs = [
            ("User-Agent", user_agent),
            ("Accept", "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
            ("Accept-Language", "en-US,en;q=0.9"),
            ("Cache-Control", "no-cache"),
            ("Pragma", "no-cache"),
        ];
        return Self {
            pairs: pairs
                .iter()
                .map(|(k, v)| return ((*k).to_string(), (*v).to_string()))
                .collect(),
        };
    }

    /// Iterate name/value pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        return self.pairs.iter().map(|(k, v)| return (k.as_str(), v.as_str()));
    }

    /// Value of a header, matched case-insensitively.
    pub fn get(&self, name: &str) -> Option<&str> {
        return self
            .iter()
            .find(|(k, _)| return k.eq_ignore_ascii_case(name))
            .map(|(_, v)| return v);
    }
}

impl Default for RequestHeaders {
    fn default() -> Self {
        return Self::browser(BROWSER_USER_AGENT);
    }
}

/// A fetched page.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// Response body decoded as text.
    pub body: String,
    /// HTTP status code.
    pub status: u16,
}

impl HttpResponse {
    /// Whether the status is 2xx.
    pub const fn is_success(&self) -> bool {
        return self.status >= 200 && self.status < 300;
    }
}

/// Raw network transport. Implementations report transport failures as
/// `Error::Network`; HTTP error statuses are returned as responses.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Issue a GET request.
    ///
    /// # Errors
    ///
    /// Returns `Error::Network` on transport failure.
    async fn get(&self, url: &Url, headers: &RequestHeaders) -> Result<HttpResponse, Error>;
}

/// `HttpClient` backed by a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    /// Connection-pooling client.
    client: reqwest::Client,
}

impl ReqwestClient {
    /// Build a client with a request timeout.
    ///
    /// # Errors
    ///
    /// Returns `Error::Network` if the TLS backend cannot be initialized.
    pub fn new(timeout: Duration) -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                return Error::Network {
                    reason: format!("client setup failed: {e}"),
                    url: local_placeholder_url(),
                };
            })?;
        return Ok(Self { client });
    }
}

#[async_trait]
impl HttpClient for ReqwestClient {
    async fn get(&self, url: &Url, headers: &RequestHeaders) -> Result<HttpResponse, Error> {
        let mut request = self.client.get(url.clone());
        for (name, value) in headers.iter() {
            request = request.header(name, value);
        }

        let response = request.send().await.map_err(|e| {
            return Error::Network { reason: e.to_string(), url: url.clone() };
        })?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| {
            return Error::Network { reason: format!("reading body: {e}"), url: url.clone() };
        })?;

        return Ok(HttpResponse { body, status });
    }
}

/// Fetch a page body, bounded by `timeout`. Non-2xx statuses are errors.
///
/// # Errors
///
/// Returns `Error::Timeout` when the bound elapses, `Error::Network` on
/// transport failure or an error status.
pub async fn fetch_text(
    client: &dyn HttpClient,
    url: &Url,
    headers: &RequestHeaders,
    timeout: Duration,
) -> Result<String, Error> {
    tracing::debug!(%url, "fetching");
    let Ok(result) = tokio::time::timeout(timeout, client.get(url, headers)).await else {
        return Err(Error::Timeout { seconds: timeout.as_secs(), url: url.clone() });
    };
    let response = result?;
    if !response.is_success() {
        return Err(Error::Network {
            reason: format!("HTTP {}", response.status),
            url: url.clone(),
        });
    }
    return Ok(response.body);
}

/// Stand-in url for errors raised before any request exists.
#[allow(clippy::expect_used, reason = "literal url")]
fn local_placeholder_url() -> Url {
    return Url::parse("http://localhost/").expect("literal url");
}
