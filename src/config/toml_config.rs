use crate::core::orchestrator::{DEFAULT_MAX_CONCURRENT_PIPELINES, MAX_CONCURRENT_PIPELINES_LIMIT};
use crate::core::pager::{DEFAULT_MAX_PAGES, DEFAULT_PAGE_SIZE};
use crate::core::ConfigProvider;
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub pipeline: Option<PipelineInfo>,
    pub upstream: UpstreamSection,
    #[serde(default)]
    pub aggregation: AggregationSection,
    pub output: OutputSection,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineInfo {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamSection {
    pub base_url: String,
    pub language: Option<String>,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AggregationSection {
    pub page_size: Option<usize>,
    pub max_pages: Option<usize>,
    pub max_concurrent_pipelines: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputSection {
    pub output_path: String,
    #[serde(default)]
    pub output_formats: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
    /// "compact" 或 "json"
    pub log_format: Option<String>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| EtlError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${UPSTREAM_URL})，未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| EtlError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validation::validate_url("upstream.base_url", &self.upstream.base_url)?;

        if let Some(language) = &self.upstream.language {
            validation::validate_non_empty_string("upstream.language", language)?;
        }
        if let Some(timeout) = self.upstream.timeout_seconds {
            validation::validate_range("upstream.timeout_seconds", timeout, 1, 3600)?;
        }

        validation::validate_positive_number("aggregation.page_size", self.page_size(), 1)?;
        validation::validate_positive_number("aggregation.max_pages", self.max_pages(), 1)?;
        validation::validate_range(
            "aggregation.max_concurrent_pipelines",
            self.max_concurrent_pipelines(),
            1,
            MAX_CONCURRENT_PIPELINES_LIMIT,
        )?;

        validation::validate_path("output.output_path", &self.output.output_path)?;
        validation::validate_output_formats("output.output_formats", &self.output.output_formats)?;

        if let Some(format) = self.monitoring.as_ref().and_then(|m| m.log_format.as_deref()) {
            if !["compact", "json"].contains(&format) {
                return Err(EtlError::InvalidConfigValueError {
                    field: "monitoring.log_format".to_string(),
                    value: format.to_string(),
                    reason: "Valid formats: compact, json".to_string(),
                });
            }
        }

        Ok(())
    }

    pub fn json_logs(&self) -> bool {
        self.monitoring
            .as_ref()
            .and_then(|m| m.log_format.as_deref())
            == Some("json")
    }

    pub fn name(&self) -> &str {
        self.pipeline
            .as_ref()
            .map(|p| p.name.as_str())
            .unwrap_or("avg-price-etl")
    }
}

impl ConfigProvider for TomlConfig {
    fn base_url(&self) -> &str {
        &self.upstream.base_url
    }

    fn language(&self) -> &str {
        self.upstream.language.as_deref().unwrap_or("en")
    }

    fn request_timeout_seconds(&self) -> Option<u64> {
        self.upstream.timeout_seconds
    }

    fn page_size(&self) -> usize {
        self.aggregation.page_size.unwrap_or(DEFAULT_PAGE_SIZE)
    }

    fn max_pages(&self) -> usize {
        self.aggregation.max_pages.unwrap_or(DEFAULT_MAX_PAGES)
    }

    fn max_concurrent_pipelines(&self) -> usize {
        self.aggregation
            .max_concurrent_pipelines
            .unwrap_or(DEFAULT_MAX_CONCURRENT_PIPELINES)
    }

    fn output_path(&self) -> &str {
        &self.output.output_path
    }

    fn output_formats(&self) -> &[String] {
        &self.output.output_formats
    }

    fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
