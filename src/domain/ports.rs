use crate::config::LookupSettings;
use crate::domain::model::SourceProbe;
use crate::utils::error::Result;
use async_trait::async_trait;

/// 對外 HTTP 抓取的介面，測試時可換成假的實作
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// GET `url` with the given query pairs and return the body of a 2xx response.
    async fn fetch(&self, url: &str, query: &[(&str, &str)]) -> Result<String>;
}

pub trait ConfigProvider: Send + Sync {
    fn probes(&self) -> &[SourceProbe];
    fn lookup_settings(&self) -> LookupSettings;
}
