use std::time::Duration;

use anyhow::Context as _;
use reqwest::header::{ACCEPT, USER_AGENT};
use url::Url;

const USER_AGENT_VALUE: &str = concat!("ao3-tables/", env!("CARGO_PKG_VERSION"));
const BASE_BACKOFF: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    pub status: u16,
    pub body: String,
}

impl FetchResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Black-box GET. Implementations return whatever status the server sent;
/// `Err` is reserved for requests that produced no response at all.
#[async_trait::async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> anyhow::Result<FetchResponse>;
}

#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    retries: u32,
}

impl HttpFetcher {
    pub fn new(timeout: Duration, retries: u32) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .context("build listing http client")?;
        Ok(Self { client, retries })
    }

    async fn fetch_once(&self, url: &Url) -> Result<FetchResponse, reqwest::Error> {
        let response = self
            .client
            .get(url.clone())
            .header(USER_AGENT, USER_AGENT_VALUE)
            .header(ACCEPT, "text/html,application/xhtml+xml;q=0.9,*/*;q=0.8")
            .send()
            .await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(FetchResponse { status, body })
    }
}

#[async_trait::async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> anyhow::Result<FetchResponse> {
        let mut attempt = 0_u32;
        loop {
            match self.fetch_once(url).await {
                Ok(response) => return Ok(response),
                Err(err) if attempt < self.retries => {
                    let backoff = backoff_delay(attempt);
                    attempt += 1;
                    tracing::warn!(
                        %url,
                        %err,
                        attempt,
                        retries = self.retries,
                        backoff_ms = backoff.as_millis() as u64,
                        "request failed; retrying"
                    );
                    tokio::time::sleep(backoff).await;
                }
                Err(err) => {
                    return Err(err).with_context(|| {
                        format!("GET {url} (gave up after {} attempts)", attempt + 1)
                    });
                }
            }
        }
    }
}

fn backoff_delay(attempt: u32) -> Duration {
    BASE_BACKOFF.saturating_mul(2_u32.saturating_pow(attempt))
}
