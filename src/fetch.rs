use std::future::Future;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::error::FetchError;

/// Where catalog documents come from.
pub trait Source: Send + Sync + 'static {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<String, FetchError>> + Send;
}

/// Plain HTTP(S) GET with a per-request deadline.
#[derive(Clone)]
pub struct HttpSource {
    client: reqwest::Client,
}

impl HttpSource {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;
        Ok(HttpSource { client })
    }
}

impl Source for HttpSource {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let transport = |source| FetchError::Transport {
            url: url.to_string(),
            source,
        };

        let start = Instant::now();
        let response = self.client.get(url).send().await.map_err(transport)?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        let body = response.text().await.map_err(transport)?;
        debug!(
            url,
            bytes = body.len(),
            latency_ms = start.elapsed().as_millis() as u64,
            "fetched"
        );
        Ok(body)
    }
}
