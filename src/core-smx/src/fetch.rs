//! HTTP fetching of sitemap documents.

use std::time::Duration;

use async_trait::async_trait;

use crate::config::TraversalOptions;
use crate::errors::{FetchCause, FetchError};

/// Source of raw sitemap bytes.
///
/// The traversal only ever talks to this trait, so it can be driven by the real
/// HTTP client or by an in-memory document tree.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Retrieves the body at `url`. One attempt, no retries.
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// [`Fetcher`] backed by a `reqwest` client with a fixed per-request timeout.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpFetcher {
    /// Builds a client using the timeout and user agent from `options`.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend or the client cannot be initialized.
    pub fn new(options: &TraversalOptions) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(options.user_agent.as_str())
            .timeout(options.request_timeout)
            .build()?;
        Ok(Self {
            client,
            timeout: options.request_timeout,
        })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::new(url, e.into()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::new(url, FetchCause::Status(status.as_u16())));
        }

        let body = response.bytes().await.map_err(|e| FetchError::new(url, e.into()))?;
        tracing::trace!("Fetched {} bytes from {}", body.len(), url);
        Ok(body.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher(timeout: Duration) -> HttpFetcher {
        let options = TraversalOptions::builder().request_timeout(timeout).build();
        HttpFetcher::new(&options).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_ok() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/sitemap.xml"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<urlset/>"))
            .mount(&server)
            .await;

        let body = fetcher(Duration::from_secs(5))
            .fetch(&format!("{}/sitemap.xml", server.uri()))
            .await
            .unwrap();
        assert_eq!(body, b"<urlset/>");
    }

    #[tokio::test]
    async fn test_fetch_not_found_is_permanent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let url = format!("{}/missing.xml", server.uri());
        let error = fetcher(Duration::from_secs(5)).fetch(&url).await.unwrap_err();
        assert_eq!(error.url, url);
        assert_eq!(error.cause, FetchCause::Status(404));
        assert!(!error.is_transient());
    }

    #[tokio::test]
    async fn test_fetch_server_error_is_transient() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let error = fetcher(Duration::from_secs(5))
            .fetch(&format!("{}/busy.xml", server.uri()))
            .await
            .unwrap_err();
        assert_eq!(error.cause, FetchCause::Status(503));
        assert!(error.is_transient());
    }

    #[tokio::test]
    async fn test_fetch_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
            .mount(&server)
            .await;

        let error = fetcher(Duration::from_millis(200))
            .fetch(&format!("{}/slow.xml", server.uri()))
            .await
            .unwrap_err();
        assert_eq!(error.cause, FetchCause::Timeout);
        assert!(error.is_transient());
    }
}
