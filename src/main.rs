use avg_price_etl::app::runner;
use avg_price_etl::utils::{logger, validation::Validate};
use avg_price_etl::CliConfig;
use clap::Parser;

#[tokio::main]
async fn main() {
    let config = CliConfig::parse();

    // 初始化日誌
    if config.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(config.verbose);
    }

    tracing::info!("Starting avg-price-etl CLI");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    if config.dry_run {
        if let Err(e) = runner::dry_run(&config).await {
            std::process::exit(runner::report_error(&e));
        }
        return;
    }

    if config.monitor {
        tracing::info!("🔍 System monitoring enabled");
    }

    match runner::run_with_config(&config).await {
        Ok(summary) => {
            runner::print_report(&summary.report);
            for file in &summary.written_files {
                println!("📁 {}/{}", config.output_path, file);
            }

            if let Some(error) = &summary.export_error {
                eprintln!("❌ Report export failed: {}", error);
            }

            let exit_code = runner::exit_code_for_summary(&summary);
            if exit_code > 0 {
                tracing::warn!(
                    "⚠️ {} subcategories failed, export {}",
                    summary.report.failure_count(),
                    if summary.export_error.is_some() { "failed" } else { "ok" }
                );
                std::process::exit(exit_code);
            }
            tracing::info!("✅ All subcategory averages published");
        }
        Err(e) => {
            let exit_code = runner::report_error(&e);
            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }
}
