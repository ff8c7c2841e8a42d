pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::{UpstreamClient, UpstreamConfig};
pub use config::{cli::LocalStorage, toml_config::TomlConfig};
pub use core::orchestrator::{AggregationOrchestrator, PipelineSettings, RunState};
pub use core::pager::ListingPager;
pub use domain::model::{AggregationOutcome, OutcomeStatus, Report};
pub use utils::error::{EtlError, Result};
