use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// 未設定 RUST_LOG 時使用的篩選；上游 HTTP 堆疊一律壓到 warn
fn default_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = if verbose { "debug" } else { "info" };
        EnvFilter::new(format!("avg_price_etl={level},hyper=warn,reqwest=warn,info"))
    })
}

pub fn init_cli_logger(verbose: bool) {
    let layer = fmt::layer()
        .with_target(verbose)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact();

    if tracing_subscriber::registry()
        .with(default_filter(verbose))
        .with(layer)
        .try_init()
        .is_err()
    {
        tracing::debug!("Logger already installed, keeping existing subscriber");
    }
}

/// 結構化 JSON 日誌，供收集系統使用
pub fn init_json_logger() {
    let layer = fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(false);

    if tracing_subscriber::registry()
        .with(default_filter(false))
        .with(layer)
        .try_init()
        .is_err()
    {
        tracing::debug!("Logger already installed, keeping existing subscriber");
    }
}
