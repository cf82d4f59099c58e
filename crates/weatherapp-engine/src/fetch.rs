//! Network retrieval of raw pages.

use reqwest::blocking::Client;
use std::time::Duration;
use weatherapp_core::error::ReqwestErrorExt;
use weatherapp_core::NetworkError;

/// Browser-like identification sent with every request; some sites reject
/// unknown clients outright.
pub const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:63.0) Gecko/20100101 Firefox/63.0";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Something that can retrieve the body behind a URL.
///
/// No retries happen at this layer.
pub trait Fetcher: Send + Sync {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, NetworkError>;
}

/// Blocking HTTP fetcher.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self, NetworkError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| NetworkError::Client(e.to_string()))?;

        Ok(Self { client })
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, NetworkError> {
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| e.into_network_error(url))?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!("GET {} returned status {}", url, status);
            return Err(NetworkError::ServerError {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().map_err(|e| e.into_network_error(url))?;
        tracing::debug!("GET {} returned {} bytes", url, body.len());
        Ok(body.to_vec())
    }
}
