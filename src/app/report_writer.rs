use crate::domain::model::{AggregationOutcome, OutcomeStatus, Report};
use crate::domain::ports::Storage;
use crate::utils::error::{EtlError, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;

pub const CSV_REPORT_FILE: &str = "report.csv";
pub const JSON_REPORT_FILE: &str = "report.json";

#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    subcategory: &'a str,
    average_price: String,
    contributing_count: usize,
    status: OutcomeStatus,
    partial: bool,
    message: &'a str,
}

#[derive(Debug, Serialize)]
struct JsonReport<'a> {
    generated_at: DateTime<Utc>,
    total: usize,
    succeeded: usize,
    failed: usize,
    partial: usize,
    outcomes: &'a [AggregationOutcome],
}

/// 將報表以 CSV / JSON 寫入儲存
pub struct ReportWriter<S: Storage> {
    storage: S,
}

impl<S: Storage> ReportWriter<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// 依格式寫出檔案，回傳寫入的檔名
    pub async fn write(&self, report: &Report, formats: &[String]) -> Result<Vec<String>> {
        let mut written = Vec::new();

        for format in formats {
            let (file_name, data) = match format.as_str() {
                "csv" => (CSV_REPORT_FILE, render_csv(report)?),
                "json" => (JSON_REPORT_FILE, render_json(report, Utc::now())?),
                other => {
                    return Err(EtlError::ProcessingError {
                        message: format!("Unsupported report format: {}", other),
                    })
                }
            };

            tracing::debug!("💾 Writing {} ({} bytes)", file_name, data.len());
            self.storage.write_file(file_name, &data).await?;
            written.push(file_name.to_string());
        }

        Ok(written)
    }
}

pub fn render_csv(report: &Report) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    for outcome in report.iter() {
        writer.serialize(CsvRow {
            subcategory: &outcome.subcategory_name,
            average_price: format!("{:.2}", outcome.average_price),
            contributing_count: outcome.contributing_count,
            status: outcome.status,
            partial: outcome.partial,
            message: &outcome.message,
        })?;
    }

    writer
        .into_inner()
        .map_err(|e| EtlError::IoError(e.into_error()))
}

pub fn render_json(report: &Report, generated_at: DateTime<Utc>) -> Result<Vec<u8>> {
    let body = JsonReport {
        generated_at,
        total: report.len(),
        succeeded: report.success_count(),
        failed: report.failure_count(),
        partial: report.partial_count(),
        outcomes: &report.outcomes,
    };
    Ok(serde_json::to_vec_pretty(&body)?)
}
