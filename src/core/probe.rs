use crate::config::LookupSettings;
use crate::core::extract::{
    self, find_name_in_hits, page_signal, parse_page_meta, parse_search_results,
};
use crate::domain::model::{ExtractedSignal, ParseStrategy, PhoneNumber, ProbeResult, SourceProbe};
use crate::domain::ports::Fetcher;
use crate::utils::error::{LookupError, Result};
use std::sync::Arc;
use std::time::Instant;

/// 執行單一來源：組 URL、抓取、依策略解析。任何錯誤都收斂成該來源的 `ProbeResult`
pub struct ProbeRunner {
    fetcher: Arc<dyn Fetcher>,
    settings: LookupSettings,
}

impl ProbeRunner {
    pub fn new(fetcher: Arc<dyn Fetcher>, settings: LookupSettings) -> Self {
        Self { fetcher, settings }
    }

    /// Never fails: fetch and parse errors end up in `ProbeResult::error`.
    pub async fn run(&self, probe: &SourceProbe, number: &PhoneNumber) -> ProbeResult {
        let started = Instant::now();

        let outcome = match probe.strategy {
            ParseStrategy::SearchSnippet => self.run_search(probe, number).await,
            ParseStrategy::PageMeta => self.run_page(probe, number).await,
        };

        match outcome {
            Ok(signal) => {
                let result = ProbeResult::from_signal(&probe.platform, signal);
                tracing::debug!(
                    "🔎 {} ({}): found={} in {:?}",
                    probe.platform,
                    probe.strategy,
                    result.found,
                    started.elapsed()
                );
                result
            }
            Err(e) => {
                tracing::warn!(
                    "⚠️ {} ({}) failed after {:?}: {}",
                    probe.platform,
                    probe.strategy,
                    started.elapsed(),
                    e
                );
                ProbeResult::failed(&probe.platform, e.user_friendly_message())
            }
        }
    }

    async fn run_search(
        &self,
        probe: &SourceProbe,
        number: &PhoneNumber,
    ) -> Result<ExtractedSignal> {
        let query = probe.render(number);
        let endpoint = &self.settings.search_endpoint;

        let body = self.fetcher.fetch(endpoint, &[("q", query.as_str())]).await?;
        ensure_body(&body, endpoint)?;

        let hits = parse_search_results(&body, endpoint, self.settings.max_search_results);
        tracing::debug!("{}: {} search hits for {:?}", probe.platform, hits.len(), query);

        let Some(first) = hits.first() else {
            return Ok(ExtractedSignal::default());
        };

        match find_name_in_hits(&hits) {
            Some(found) => {
                let hit = &hits[found.hit_index];
                let photo_url = if self.settings.follow_result_links {
                    self.photo_from_page(&hit.href).await
                } else {
                    None
                };

                Ok(ExtractedSignal {
                    name: Some(found.name),
                    photo_url,
                    raw_snippet: non_empty(&hit.snippet),
                    source_url: Some(hit.href.clone()),
                })
            }
            // 沒找到名字時仍回報第一筆結果的來源
            None => Ok(ExtractedSignal {
                raw_snippet: non_empty(&first.snippet),
                source_url: Some(first.href.clone()),
                ..Default::default()
            }),
        }
    }

    async fn run_page(&self, probe: &SourceProbe, number: &PhoneNumber) -> Result<ExtractedSignal> {
        let url = probe.render(number);

        let body = self.fetcher.fetch(&url, &[]).await?;
        ensure_body(&body, &url)?;

        Ok(page_signal(parse_page_meta(&body, &url), &url))
    }

    /// 跟進搜尋結果頁面找照片；失敗不影響名字結果
    async fn photo_from_page(&self, url: &str) -> Option<String> {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return None;
        }

        match self.fetcher.fetch(url, &[]).await {
            Ok(body) => parse_page_meta(&body, url).image,
            Err(e) => {
                tracing::debug!("Could not fetch result page {} for photo: {}", url, e);
                None
            }
        }
    }
}

fn ensure_body(body: &str, url: &str) -> Result<()> {
    if body.trim().is_empty() {
        return Err(LookupError::Parse {
            message: format!("empty response body from {}", url),
        });
    }
    Ok(())
}

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    if s.is_empty() {
        None
    } else {
        Some(extract::normalize_ws(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::normalize::normalize_number;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    const SEARCH_ENDPOINT: &str = "https://search.test/html/";

    /// 以 URL 對應固定回應的假 Fetcher
    #[derive(Default)]
    struct MockFetcher {
        pages: HashMap<String, std::result::Result<String, u16>>,
        calls: Mutex<Vec<String>>,
    }

    impl MockFetcher {
        fn page(mut self, url: &str, body: &str) -> Self {
            self.pages.insert(url.to_string(), Ok(body.to_string()));
            self
        }

        fn status(mut self, url: &str, status: u16) -> Self {
            self.pages.insert(url.to_string(), Err(status));
            self
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Fetcher for MockFetcher {
        async fn fetch(&self, url: &str, _query: &[(&str, &str)]) -> Result<String> {
            self.calls.lock().unwrap().push(url.to_string());
            match self.pages.get(url) {
                Some(Ok(body)) => Ok(body.clone()),
                Some(Err(status)) => Err(LookupError::Status {
                    status: *status,
                    url: url.to_string(),
                }),
                None => Err(LookupError::Timeout {
                    url: url.to_string(),
                }),
            }
        }
    }

    fn settings(follow_result_links: bool) -> LookupSettings {
        LookupSettings {
            search_endpoint: SEARCH_ENDPOINT.to_string(),
            follow_result_links,
            polite_delay: Duration::ZERO,
            ..Default::default()
        }
    }

    fn number() -> PhoneNumber {
        normalize_number("919876543210", 7, Some("91")).unwrap()
    }

    #[tokio::test]
    async fn test_search_probe_finds_name_and_follows_link_for_photo() {
        let results = include_str!("../../tests/fixtures/ddg_results.html");
        let fetcher = MockFetcher::default()
            .page(SEARCH_ENDPOINT, results)
            .page(
                "https://whocallsme.example/number/919876543210",
                r#"<html><head><meta property="og:image" content="https://whocallsme.example/a.png"></head></html>"#,
            );
        let fetcher = Arc::new(fetcher);
        let runner = ProbeRunner::new(fetcher.clone(), settings(true));

        let result = runner
            .run(&SourceProbe::search("Exact", "\"{number}\""), &number())
            .await;

        assert!(result.found);
        assert_eq!(result.name.as_deref(), Some("John Doe"));
        assert_eq!(
            result.photo_url.as_deref(),
            Some("https://whocallsme.example/a.png")
        );
        assert_eq!(
            result.source_url.as_deref(),
            Some("https://whocallsme.example/number/919876543210")
        );
        assert!(result.error.is_none());
        assert_eq!(fetcher.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_failed_photo_follow_up_keeps_name() {
        let results = include_str!("../../tests/fixtures/ddg_results.html");
        let fetcher = MockFetcher::default()
            .page(SEARCH_ENDPOINT, results)
            .status("https://whocallsme.example/number/919876543210", 403);
        let runner = ProbeRunner::new(Arc::new(fetcher), settings(true));

        let result = runner
            .run(&SourceProbe::search("Exact", "\"{number}\""), &number())
            .await;

        assert!(result.found);
        assert_eq!(result.name.as_deref(), Some("John Doe"));
        assert!(result.photo_url.is_none());
        assert!(result.error.is_none());
    }

    #[tokio::test]
    async fn test_search_without_names_reports_first_hit() {
        let results = include_str!("../../tests/fixtures/ddg_no_names.html");
        let fetcher = Arc::new(MockFetcher::default().page(SEARCH_ENDPOINT, results));
        let runner = ProbeRunner::new(fetcher.clone(), settings(true));

        let result = runner
            .run(&SourceProbe::search("Exact", "\"{number}\""), &number())
            .await;

        assert!(!result.found);
        assert!(result.error.is_none());
        assert_eq!(
            result.source_url.as_deref(),
            Some("https://numbers.example/919876543210")
        );
        // 沒有名字就不跟進連結
        assert_eq!(fetcher.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_page_probe_reads_meta() {
        let page_url = "https://directory.example/in/919876543210";
        let fetcher = MockFetcher::default()
            .page(page_url, include_str!("../../tests/fixtures/profile_og.html"));
        let runner = ProbeRunner::new(Arc::new(fetcher), settings(false));

        let result = runner
            .run(
                &SourceProbe::page("Directory", "https://directory.example/in/{number}"),
                &number(),
            )
            .await;

        assert!(result.found);
        assert_eq!(result.name.as_deref(), Some("Rahul Sharma"));
        assert_eq!(
            result.photo_url.as_deref(),
            Some("https://directory.example/avatars/rahul.jpg")
        );
        assert_eq!(result.source_url.as_deref(), Some(page_url));
    }

    #[tokio::test]
    async fn test_fetch_errors_become_failed_results() {
        let fetcher = MockFetcher::default().status("https://blocked.example/919876543210", 429);
        let runner = ProbeRunner::new(Arc::new(fetcher), settings(false));

        let blocked = runner
            .run(
                &SourceProbe::page("Blocked", "https://blocked.example/{number}"),
                &number(),
            )
            .await;
        assert!(!blocked.found);
        assert_eq!(blocked.platform, "Blocked");
        assert!(blocked.error.as_deref().unwrap().contains("HTTP 429"));

        let timed_out = runner
            .run(&SourceProbe::search("Exact", "\"{number}\""), &number())
            .await;
        assert!(!timed_out.found);
        assert!(timed_out.error.as_deref().unwrap().contains("timed out"));
    }

    #[tokio::test]
    async fn test_empty_body_is_a_parse_failure() {
        let fetcher = MockFetcher::default().page("https://empty.example/919876543210", "  \n");
        let runner = ProbeRunner::new(Arc::new(fetcher), settings(false));

        let result = runner
            .run(
                &SourceProbe::page("Empty", "https://empty.example/{number}"),
                &number(),
            )
            .await;

        assert!(!result.found);
        assert!(result.error.as_deref().unwrap().starts_with("parse failed"));
    }
}
