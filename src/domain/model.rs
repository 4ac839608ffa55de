use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const NUMBER_PLACEHOLDER: &str = "{number}";
pub const E164_PLACEHOLDER: &str = "{e164}";

/// 正規化後的電話號碼，只存在於單次查詢期間
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PhoneNumber {
    digits: String,
    international: bool,
}

impl PhoneNumber {
    pub(crate) fn new(digits: String, international: bool) -> Self {
        Self {
            digits,
            international,
        }
    }

    /// Digits only, no leading `+`.
    pub fn digits(&self) -> &str {
        &self.digits
    }

    pub fn e164(&self) -> String {
        format!("+{}", self.digits)
    }

    /// 回應中回報的號碼：輸入帶 `+` 時保留
    pub fn canonical(&self) -> String {
        if self.international {
            self.e164()
        } else {
            self.digits.clone()
        }
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseStrategy {
    /// 透過搜尋引擎 HTML 結果頁，從摘要猜名字
    SearchSnippet,
    /// 直接抓平台頁面，讀 og:title / og:image
    PageMeta,
}

impl fmt::Display for ParseStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseStrategy::SearchSnippet => f.write_str("search_snippet"),
            ParseStrategy::PageMeta => f.write_str("page_meta"),
        }
    }
}

/// One configured source. For `SearchSnippet` the template is the search query,
/// for `PageMeta` it is the full page URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceProbe {
    pub platform: String,
    pub template: String,
    pub strategy: ParseStrategy,
}

impl SourceProbe {
    pub fn search(platform: &str, query: &str) -> Self {
        Self {
            platform: platform.to_string(),
            template: query.to_string(),
            strategy: ParseStrategy::SearchSnippet,
        }
    }

    pub fn page(platform: &str, url: &str) -> Self {
        Self {
            platform: platform.to_string(),
            template: url.to_string(),
            strategy: ParseStrategy::PageMeta,
        }
    }

    pub fn render(&self, number: &PhoneNumber) -> String {
        self.template
            .replace(NUMBER_PLACEHOLDER, number.digits())
            .replace(E164_PLACEHOLDER, &number.e164())
    }

    pub fn default_set() -> Vec<SourceProbe> {
        vec![
            SourceProbe::search("DuckDuckGo (exact)", "\"{number}\""),
            SourceProbe::search("PhonePe (DDG)", "\"{number}\" PhonePe"),
            SourceProbe::search(
                "WhoCallsMe (site search)",
                "site:whocallsme.com \"{number}\"",
            ),
            SourceProbe::search("SpamCalls (site search)", "site:spamcalls.net \"{number}\""),
            SourceProbe::page(
                "Truecaller (direct)",
                "https://www.truecaller.com/search/in/{number}",
            ),
            SourceProbe::search("Google (DDG fallback)", "\"{number}\" Google"),
        ]
    }
}

/// 單一搜尋結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub title: String,
    pub href: String,
    pub snippet: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageMeta {
    pub title: Option<String>,
    pub image: Option<String>,
    pub text: String,
}

/// What a parse strategy pulled out of one response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedSignal {
    pub name: Option<String>,
    pub photo_url: Option<String>,
    pub raw_snippet: Option<String>,
    pub source_url: Option<String>,
}

impl ExtractedSignal {
    pub fn has_identity(&self) -> bool {
        self.name.is_some() || self.photo_url.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeResult {
    pub platform: String,
    pub found: bool,
    pub name: Option<String>,
    pub photo_url: Option<String>,
    pub raw_snippet: Option<String>,
    pub source_url: Option<String>,
    pub error: Option<String>,
}

impl ProbeResult {
    pub fn from_signal(platform: &str, signal: ExtractedSignal) -> Self {
        Self {
            platform: platform.to_string(),
            found: signal.has_identity(),
            name: signal.name,
            photo_url: signal.photo_url,
            raw_snippet: signal.raw_snippet,
            source_url: signal.source_url,
            error: None,
        }
    }

    pub fn failed(platform: &str, error: impl Into<String>) -> Self {
        Self {
            platform: platform.to_string(),
            found: false,
            error: Some(error.into()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupResponse {
    pub queried: String,
    pub number: String,
    pub platforms: Vec<ProbeResult>,
    pub best_name: Option<String>,
    pub best_photo: Option<String>,
    pub timestamp: DateTime<Utc>,
}
