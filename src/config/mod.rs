pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
use crate::core::orchestrator::MAX_CONCURRENT_PIPELINES_LIMIT;
#[cfg(feature = "cli")]
use crate::core::ConfigProvider;
#[cfg(feature = "cli")]
use crate::utils::error::Result;
#[cfg(feature = "cli")]
use crate::utils::validation::{self, Validate};
#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use serde::{Deserialize, Serialize};

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "avg-price-etl")]
#[command(about = "Compute and publish average teacher prices per subcategory")]
pub struct CliConfig {
    #[arg(long, default_value = "http://localhost:3000/api")]
    pub base_url: String,

    #[arg(long, default_value = "en", help = "Value sent in the Accept-Language header")]
    pub language: String,

    #[arg(long, default_value = "30")]
    pub timeout_seconds: u64,

    #[arg(long, default_value = "10")]
    pub page_size: usize,

    #[arg(long, default_value = "1000", help = "Safety cap on listing pages per subcategory")]
    pub max_pages: usize,

    #[arg(long, default_value = "8")]
    pub max_concurrent_pipelines: usize,

    #[arg(long, default_value = "./output")]
    pub output_path: String,

    #[arg(long, value_delimiter = ',', default_values = ["csv", "json"])]
    pub output_formats: Vec<String>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit JSON structured logs")]
    pub json_logs: bool,

    #[arg(long, help = "Log process CPU and memory usage")]
    pub monitor: bool,

    #[arg(long, help = "List subcategories without paging or publishing")]
    pub dry_run: bool,
}

#[cfg(feature = "cli")]
impl ConfigProvider for CliConfig {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn language(&self) -> &str {
        &self.language
    }

    fn request_timeout_seconds(&self) -> Option<u64> {
        Some(self.timeout_seconds)
    }

    fn page_size(&self) -> usize {
        self.page_size
    }

    fn max_pages(&self) -> usize {
        self.max_pages
    }

    fn max_concurrent_pipelines(&self) -> usize {
        self.max_concurrent_pipelines
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn output_formats(&self) -> &[String] {
        &self.output_formats
    }

    fn monitoring_enabled(&self) -> bool {
        self.monitor
    }
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_url("base_url", &self.base_url)?;
        validation::validate_non_empty_string("language", &self.language)?;
        validation::validate_range("timeout_seconds", self.timeout_seconds, 1, 3600)?;
        validation::validate_positive_number("page_size", self.page_size, 1)?;
        validation::validate_positive_number("max_pages", self.max_pages, 1)?;
        validation::validate_range(
            "max_concurrent_pipelines",
            self.max_concurrent_pipelines,
            1,
            MAX_CONCURRENT_PIPELINES_LIMIT,
        )?;
        validation::validate_path("output_path", &self.output_path)?;
        validation::validate_output_formats("output_formats", &self.output_formats)
    }
}
