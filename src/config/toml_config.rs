use crate::config::{LookupSettings, DEFAULT_SEARCH_ENDPOINT, DEFAULT_USER_AGENT};
use crate::domain::model::{ParseStrategy, SourceProbe, E164_PLACEHOLDER, NUMBER_PLACEHOLDER};
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{LookupError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub lookup: LookupSection,
    #[serde(default = "SourceProbe::default_set")]
    pub probes: Vec<SourceProbe>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_cors")]
    pub cors: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LookupSection {
    pub timeout_seconds: Option<u64>,
    pub user_agent: Option<String>,
    pub min_digits: Option<usize>,
    pub default_country_code: Option<String>,
    pub max_concurrent_probes: Option<usize>,
    pub polite_delay_ms: Option<u64>,
    pub search_endpoint: Option<String>,
    pub max_search_results: Option<usize>,
    pub follow_result_links: Option<bool>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_cors() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors: default_cors(),
        }
    }
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            lookup: LookupSection::default(),
            probes: SourceProbe::default_set(),
        }
    }
}

impl LookupConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(LookupError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| LookupError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${SEARCH_ENDPOINT})，找不到的變數保持原樣
    fn substitute_env_vars(content: &str) -> String {
        use regex::{Captures, Regex};
        use std::sync::OnceLock;

        static ENV_RE: OnceLock<Regex> = OnceLock::new();
        let re = ENV_RE.get_or_init(|| {
            Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("env var pattern is valid")
        });

        re.replace_all(content, |caps: &Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .into_owned()
    }

    pub fn timeout_seconds(&self) -> u64 {
        self.lookup.timeout_seconds.unwrap_or(10)
    }

    pub fn min_digits(&self) -> usize {
        self.lookup.min_digits.unwrap_or(7)
    }

    pub fn max_concurrent_probes(&self) -> usize {
        self.lookup.max_concurrent_probes.unwrap_or(1)
    }

    pub fn search_endpoint(&self) -> &str {
        self.lookup
            .search_endpoint
            .as_deref()
            .unwrap_or(DEFAULT_SEARCH_ENDPOINT)
    }

    /// 空字串代表不自動補國碼
    pub fn default_country_code(&self) -> Option<String> {
        match &self.lookup.default_country_code {
            Some(code) if code.trim().is_empty() => None,
            Some(code) => Some(code.trim().to_string()),
            None => Some("91".to_string()),
        }
    }

    pub fn settings(&self) -> LookupSettings {
        LookupSettings {
            request_timeout: Duration::from_secs(self.timeout_seconds()),
            user_agent: self
                .lookup
                .user_agent
                .clone()
                .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
            min_digits: self.min_digits(),
            default_country_code: self.default_country_code(),
            max_concurrent_probes: self.max_concurrent_probes(),
            polite_delay: Duration::from_millis(self.lookup.polite_delay_ms.unwrap_or(600)),
            search_endpoint: self.search_endpoint().to_string(),
            max_search_results: self.lookup.max_search_results.unwrap_or(8),
            follow_result_links: self.lookup.follow_result_links.unwrap_or(true),
        }
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validation::validate_url("lookup.search_endpoint", self.search_endpoint())?;
        validation::validate_range("lookup.timeout_seconds", self.timeout_seconds(), 1, 60)?;
        validation::validate_range("lookup.min_digits", self.min_digits(), 1, 15)?;
        validation::validate_positive_number(
            "lookup.max_concurrent_probes",
            self.max_concurrent_probes(),
            1,
        )?;
        validation::validate_non_empty_string("server.host", &self.server.host)?;

        if let Some(code) = self.default_country_code() {
            if !code.chars().all(|c| c.is_ascii_digit()) {
                return Err(LookupError::InvalidConfigValueError {
                    field: "lookup.default_country_code".to_string(),
                    value: code,
                    reason: "Country code must contain digits only".to_string(),
                });
            }
        }

        if self.probes.is_empty() {
            return Err(LookupError::MissingConfigError {
                field: "probes".to_string(),
            });
        }

        let placeholders = [NUMBER_PLACEHOLDER, E164_PLACEHOLDER];
        for (i, probe) in self.probes.iter().enumerate() {
            validation::validate_non_empty_string(
                &format!("probes[{}].platform", i),
                &probe.platform,
            )?;
            let field = format!("probes[{}].template", i);
            validation::validate_template(&field, &probe.template, &placeholders)?;
            if probe.strategy == ParseStrategy::PageMeta {
                // 用假號碼代入後檢查 URL 格式
                let sample = probe
                    .template
                    .replace(NUMBER_PLACEHOLDER, "10000000")
                    .replace(E164_PLACEHOLDER, "+10000000");
                validation::validate_url(&field, &sample)?;
            }
        }

        Ok(())
    }
}

impl ConfigProvider for LookupConfig {
    fn probes(&self) -> &[SourceProbe] {
        &self.probes
    }

    fn lookup_settings(&self) -> LookupSettings {
        self.settings()
    }
}

impl Validate for LookupConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
