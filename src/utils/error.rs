use thiserror::Error;

#[derive(Error, Debug)]
pub enum LookupError {
    #[error("invalid number: {input:?} has {digits} digits, at least {min} required")]
    InvalidNumber {
        input: String,
        digits: usize,
        min: usize,
    },

    #[error("missing required parameter: {name}")]
    MissingParameter { name: String },

    #[error("invalid query string: {message}")]
    InvalidQuery { message: String },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    #[error("request to {url} timed out")]
    Timeout { url: String },

    #[error("HTML parsing error: {message}")]
    Parse { message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error in {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value {value:?} for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// 使用者輸入錯誤 (400)
    Input,
    /// 單一來源的網路或解析失敗，只會出現在該來源的結果中
    Probe,
    Configuration,
    /// 不應該發生的錯誤 (500)
    Internal,
}

impl LookupError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            LookupError::InvalidNumber { .. }
            | LookupError::MissingParameter { .. }
            | LookupError::InvalidQuery { .. } => ErrorCategory::Input,
            LookupError::Http(_)
            | LookupError::Status { .. }
            | LookupError::Timeout { .. }
            | LookupError::Parse { .. } => ErrorCategory::Probe,
            LookupError::ConfigValidationError { .. }
            | LookupError::InvalidConfigValueError { .. }
            | LookupError::MissingConfigError { .. } => ErrorCategory::Configuration,
            LookupError::IoError(_) | LookupError::Internal { .. } => ErrorCategory::Internal,
        }
    }

    /// 轉成放進 `ProbeResult.error` 的簡短訊息
    pub fn user_friendly_message(&self) -> String {
        match self {
            LookupError::InvalidNumber { .. } => "invalid number".to_string(),
            LookupError::MissingParameter { name } => format!(
                "missing {} parameter, e.g. /search?{}=919876543210",
                name, name
            ),
            LookupError::InvalidQuery { message } => format!("invalid query string: {}", message),
            LookupError::Http(e) if e.is_timeout() => {
                "fetch failed: request timed out".to_string()
            }
            LookupError::Http(e) if e.is_connect() => {
                format!("fetch failed: could not connect ({})", e)
            }
            LookupError::Http(e) => format!("fetch failed: {}", e),
            LookupError::Status { status, url } => {
                format!("fetch failed: HTTP {} from {}", status, url)
            }
            LookupError::Timeout { url } => format!("fetch failed: {} timed out", url),
            LookupError::Parse { message } => format!("parse failed: {}", message),
            LookupError::ConfigValidationError { .. }
            | LookupError::InvalidConfigValueError { .. }
            | LookupError::MissingConfigError { .. } => format!("configuration error: {}", self),
            _ => "internal error".to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, LookupError>;
