use crate::adapters::http::{UpstreamClient, UpstreamConfig};
use crate::app::report_writer::ReportWriter;
use crate::config::cli::LocalStorage;
use crate::core::orchestrator::{AggregationOrchestrator, PipelineSettings};
use crate::domain::model::{OutcomeStatus, Report};
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{ErrorSeverity, EtlError, Result};
use crate::utils::monitor::SystemMonitor;
use std::sync::Arc;

pub type UpstreamOrchestrator = AggregationOrchestrator<UpstreamClient, UpstreamClient, UpstreamClient>;

/// 以單一上游客戶端同時擔任目錄、搜尋與回報三個角色
pub fn build_orchestrator<C: ConfigProvider + ?Sized>(config: &C) -> Result<UpstreamOrchestrator> {
    let client = Arc::new(UpstreamClient::new(UpstreamConfig::from_config(config))?);
    Ok(AggregationOrchestrator::new(
        Arc::clone(&client),
        Arc::clone(&client),
        client,
        PipelineSettings::from_config(config),
    ))
}

#[derive(Debug)]
pub struct RunSummary {
    pub report: Report,
    pub written_files: Vec<String>,
    /// 報表匯出失敗時的訊息；此時各平均已回報上游，報表仍保留
    pub export_error: Option<String>,
}

/// 執行一次完整流程並依設定輸出報表檔
///
/// 只有目錄層級的致命錯誤會回傳 `Err`；匯出失敗記錄在 `RunSummary::export_error`。
pub async fn run_with_config<C: ConfigProvider + ?Sized>(config: &C) -> Result<RunSummary> {
    let monitor = SystemMonitor::new(config.monitoring_enabled());
    monitor.log_stats("Run started");

    let orchestrator = build_orchestrator(config)?;
    let report = orchestrator.run().await;
    monitor.log_stats("Aggregation completed");

    let report = match report {
        Ok(report) => report,
        Err(e) => {
            monitor.log_final_stats();
            return Err(e);
        }
    };

    let (written_files, export_error) = if config.output_formats().is_empty() {
        (Vec::new(), None)
    } else {
        let writer = ReportWriter::new(LocalStorage::new(config.output_path()));
        match writer.write(&report, config.output_formats()).await {
            Ok(files) => {
                tracing::info!("📁 Report written to {}: {}", config.output_path(), files.join(", "));
                (files, None)
            }
            Err(e) => {
                tracing::error!("❌ Failed to write report to {}: {}", config.output_path(), e);
                tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
                (Vec::new(), Some(e.to_string()))
            }
        }
    };

    monitor.log_final_stats();
    Ok(RunSummary {
        report,
        written_files,
        export_error,
    })
}

/// 只列出子類別，不分頁也不回報
pub async fn dry_run<C: ConfigProvider + ?Sized>(config: &C) -> Result<()> {
    tracing::info!("🔍 DRY RUN MODE - catalog only, nothing will be published");
    let orchestrator = build_orchestrator(config)?;
    let subcategories = orchestrator.preview().await?;

    println!("{} subcategories would be processed:", subcategories.len());
    for subcategory in &subcategories {
        match subcategory.code {
            Some(code) => println!("  - {} (code {})", subcategory.name, code),
            None => println!("  - {} (no code, will average 0)", subcategory.name),
        }
    }
    Ok(())
}

pub fn print_report(report: &Report) {
    println!(
        "{:<32} {:>10} {:>8}  {:<8} message",
        "subcategory", "average", "count", "status"
    );
    for outcome in report.iter() {
        let status = match outcome.status {
            OutcomeStatus::Success => "✅ ok",
            OutcomeStatus::Failure => "❌ failed",
        };
        println!(
            "{:<32} {:>10.2} {:>8}  {:<8} {}",
            outcome.subcategory_name,
            outcome.average_price,
            outcome.contributing_count,
            status,
            outcome.message
        );
    }
    println!(
        "{} subcategories: {} succeeded, {} failed",
        report.len(),
        report.success_count(),
        report.failure_count()
    );
}

/// 全部成功為 0；完成但有失敗項目為 2
pub fn exit_code_for_report(report: &Report) -> i32 {
    if report.failure_count() == 0 {
        0
    } else {
        2
    }
}

/// 報表匯出失敗視同完成但有失敗項目
pub fn exit_code_for_summary(summary: &RunSummary) -> i32 {
    if summary.export_error.is_some() {
        2
    } else {
        exit_code_for_report(&summary.report)
    }
}

pub fn exit_code_for_error(error: &EtlError) -> i32 {
    match error.severity() {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    }
}

/// 記錄詳細錯誤並輸出使用者訊息，回傳退出碼
pub fn report_error(error: &EtlError) -> i32 {
    tracing::error!(
        "❌ Aggregation failed: {} (Category: {:?}, Severity: {:?})",
        error,
        error.category(),
        error.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", error.recovery_suggestion());

    eprintln!("❌ {}", error.user_friendly_message());
    eprintln!("💡 {}", error.recovery_suggestion());

    exit_code_for_error(error)
}
