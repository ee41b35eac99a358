//! Pluggable image fetching.

use std::time::Duration;

use reqwest::Client;

use crate::error::ImageError;

/// Fetches raw image bytes for one URL. The pipeline's tests run against
/// in-memory fakes of this trait; production uses [`HttpImageFetcher`].
#[allow(async_fn_in_trait)]
pub trait ImageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, ImageError>;
}

/// HTTP implementation with a fixed request timeout.
pub struct HttpImageFetcher {
    client: Client,
}

impl HttpImageFetcher {
    /// # Errors
    ///
    /// Returns [`ImageError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(timeout_secs: u64, user_agent: &str) -> Result<Self, ImageError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self { client })
    }
}

impl ImageFetcher for HttpImageFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, ImageError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ImageError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response.bytes().await?.to_vec())
    }
}
