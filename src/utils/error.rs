use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Category catalog unavailable: {reason}")]
    CatalogUnavailable { reason: String },

    #[error("Category catalog contains no subcategories, nothing to process")]
    EmptyCatalog,

    #[error("Listing page {page} for category code {code} failed: {reason}")]
    PageFetchFailed { code: i64, page: usize, reason: String },

    #[error("Listing pagination for category code {code} exceeded {max_pages} pages")]
    PageLimitExceeded { code: i64, max_pages: usize },

    #[error("Publishing average price for '{subcategory}' failed: {reason}")]
    PublishFailed { subcategory: String, reason: String },

    #[error("An aggregation run is already in progress")]
    RunInProgress,

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid configuration value for '{field}' ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },
}

/// 錯誤分類，用於日誌與退出碼
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Upstream,
    Configuration,
    Data,
    Concurrency,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl EtlError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            EtlError::ApiError(_) | EtlError::PageFetchFailed { .. } => ErrorCategory::Network,
            EtlError::CatalogUnavailable { .. }
            | EtlError::EmptyCatalog
            | EtlError::PageLimitExceeded { .. }
            | EtlError::PublishFailed { .. } => ErrorCategory::Upstream,
            EtlError::ConfigError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::ConfigValidationError { .. } => ErrorCategory::Configuration,
            EtlError::CsvError(_)
            | EtlError::SerializationError(_)
            | EtlError::ProcessingError { .. } => ErrorCategory::Data,
            EtlError::RunInProgress => ErrorCategory::Concurrency,
            EtlError::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            EtlError::RunInProgress => ErrorSeverity::Low,
            EtlError::PageFetchFailed { .. }
            | EtlError::PageLimitExceeded { .. }
            | EtlError::PublishFailed { .. } => ErrorSeverity::Medium,
            EtlError::ApiError(_)
            | EtlError::EmptyCatalog
            | EtlError::CsvError(_)
            | EtlError::SerializationError(_)
            | EtlError::ProcessingError { .. } => ErrorSeverity::High,
            EtlError::CatalogUnavailable { .. }
            | EtlError::ConfigError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::ConfigValidationError { .. }
            | EtlError::IoError(_) => ErrorSeverity::Critical,
        }
    }

    /// 整個執行是否必須中止（相對於只影響單一子類別）
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            EtlError::CatalogUnavailable { .. } | EtlError::EmptyCatalog | EtlError::RunInProgress
        ) || self.category() == ErrorCategory::Configuration
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Network => "Check network connectivity and the upstream base URL",
            ErrorCategory::Upstream => match self {
                EtlError::EmptyCatalog => "Verify the upstream service has categories configured",
                EtlError::PageLimitExceeded { .. } => {
                    "Raise max_pages or check that the search endpoint returns an empty final page"
                }
                _ => "Check the upstream service status and retry the run",
            },
            ErrorCategory::Configuration => "Review the command line flags or TOML configuration",
            ErrorCategory::Data => "Inspect the upstream response format",
            ErrorCategory::Concurrency => "Wait for the current run to finish before starting another",
            ErrorCategory::System => "Check file permissions and available disk space",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            EtlError::CatalogUnavailable { .. } => {
                "Could not load the category list from the upstream service".to_string()
            }
            EtlError::EmptyCatalog => "The upstream service returned no subcategories".to_string(),
            EtlError::RunInProgress => "An aggregation run is already in progress".to_string(),
            EtlError::ApiError(e) if e.is_timeout() => "The upstream request timed out".to_string(),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;
