use avg_price_etl::app::runner;
use avg_price_etl::core::ConfigProvider;
use avg_price_etl::utils::{logger, validation::Validate};
use avg_price_etl::TomlConfig;
use clap::Parser;

#[derive(Parser)]
#[command(name = "toml-avg-price")]
#[command(about = "Average price aggregation with TOML configuration support")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "avg-price.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Override monitoring setting from config
    #[arg(long)]
    monitor: Option<bool>,

    /// Dry run - list subcategories without paging or publishing
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // 配置需先載入才能決定日誌格式
    let mut config = match TomlConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    if config.json_logs() {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(args.verbose);
    }

    tracing::info!("🚀 Starting TOML-based average price tool");
    tracing::info!("📁 Loaded configuration from: {}", args.config);

    // 應用命令列覆蓋設定
    if let Some(enabled) = args.monitor {
        let monitoring = config
            .monitoring
            .get_or_insert(avg_price_etl::config::toml_config::MonitoringConfig {
                enabled,
                log_format: None,
            });
        monitoring.enabled = enabled;
        tracing::info!("🔧 Monitoring overridden to: {}", enabled);
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    display_config_summary(&config);

    if args.dry_run {
        if let Err(e) = runner::dry_run(&config).await {
            std::process::exit(runner::report_error(&e));
        }
        return;
    }

    match runner::run_with_config(&config).await {
        Ok(summary) => {
            runner::print_report(&summary.report);
            if let Some(error) = &summary.export_error {
                eprintln!("❌ Report export failed: {}", error);
            }
            let exit_code = runner::exit_code_for_summary(&summary);
            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
        Err(e) => {
            let exit_code = runner::report_error(&e);
            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }
}

fn display_config_summary(config: &TomlConfig) {
    tracing::info!("📋 Configuration Summary:");
    tracing::info!("   Name: {}", config.name());
    tracing::info!("   Upstream: {} ({})", config.base_url(), config.language());
    tracing::info!(
        "   Paging: {} per page, at most {} pages",
        config.page_size(),
        config.max_pages()
    );
    tracing::info!(
        "   Concurrency: {} pipelines",
        config.max_concurrent_pipelines()
    );
    tracing::info!(
        "   Output: {} [{}]",
        config.output_path(),
        config.output_formats().join(", ")
    );
}
