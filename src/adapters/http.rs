use crate::config::LookupSettings;
use crate::domain::ports::Fetcher;
use crate::utils::error::{LookupError, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use reqwest::Client;

/// reqwest 實作的 `Fetcher`。Client 在啟動時建立一次，所有查詢共用
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(settings: &LookupSettings) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml;q=0.9,*/*;q=0.8"),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.8"));

        let client = Client::builder()
            .user_agent(settings.user_agent.as_str())
            .default_headers(headers)
            .timeout(settings.request_timeout)
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str, query: &[(&str, &str)]) -> Result<String> {
        let mut request = self.client.get(url);
        if !query.is_empty() {
            request = request.query(query);
        }

        tracing::debug!("GET {} ({} query params)", url, query.len());

        let response = request.send().await.map_err(|e| classify(e, url))?;
        let status = response.status();
        tracing::debug!("Response status from {}: {}", url, status);

        if !status.is_success() {
            return Err(LookupError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        response.text().await.map_err(|e| classify(e, url))
    }
}

fn classify(error: reqwest::Error, url: &str) -> LookupError {
    if error.is_timeout() {
        LookupError::Timeout {
            url: url.to_string(),
        }
    } else {
        LookupError::Http(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use std::time::Duration;

    fn settings(timeout: Duration) -> LookupSettings {
        LookupSettings {
            request_timeout: timeout,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_fetch_sends_query_and_user_agent() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/html/")
                .query_param("q", "\"919876543210\"")
                .header_exists("user-agent");
            then.status(200).body("<html>ok</html>");
        });

        let fetcher = HttpFetcher::new(&settings(Duration::from_secs(5))).unwrap();
        let body = fetcher
            .fetch(&server.url("/html/"), &[("q", "\"919876543210\"")])
            .await
            .unwrap();

        mock.assert();
        assert_eq!(body, "<html>ok</html>");
    }

    #[tokio::test]
    async fn test_non_success_status_is_error() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/blocked");
            then.status(403);
        });

        let fetcher = HttpFetcher::new(&settings(Duration::from_secs(5))).unwrap();
        let err = fetcher.fetch(&server.url("/blocked"), &[]).await.unwrap_err();

        mock.assert();
        assert!(matches!(err, LookupError::Status { status: 403, .. }));
    }

    #[tokio::test]
    async fn test_slow_response_times_out() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/slow");
            then.status(200).delay(Duration::from_millis(1500)).body("late");
        });

        let fetcher = HttpFetcher::new(&settings(Duration::from_millis(200))).unwrap();
        let err = fetcher.fetch(&server.url("/slow"), &[]).await.unwrap_err();

        assert!(matches!(err, LookupError::Timeout { .. }));
    }
}
