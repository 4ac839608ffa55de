#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

use std::time::Duration;

pub use toml_config::LookupConfig;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/115.0 Safari/537.36";
pub const DEFAULT_SEARCH_ENDPOINT: &str = "https://html.duckduckgo.com/html/";

/// 查詢流程在執行期使用的設定，由設定檔或 CLI 組出來
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupSettings {
    pub request_timeout: Duration,
    pub user_agent: String,
    pub min_digits: usize,
    /// Prefixed to bare 10-digit national numbers. `None` disables the rewrite.
    pub default_country_code: Option<String>,
    pub max_concurrent_probes: usize,
    /// 依序執行時，兩個來源之間的等待時間
    pub polite_delay: Duration,
    pub search_endpoint: String,
    pub max_search_results: usize,
    pub follow_result_links: bool,
}

impl Default for LookupSettings {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(10),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            min_digits: 7,
            default_country_code: Some("91".to_string()),
            max_concurrent_probes: 1,
            polite_delay: Duration::from_millis(600),
            search_endpoint: DEFAULT_SEARCH_ENDPOINT.to_string(),
            max_search_results: 8,
            follow_result_links: true,
        }
    }
}
