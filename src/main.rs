// src/main.rs
use signal_monitor::advisor::{DeepSeekClient, TextGenerator};
use signal_monitor::config::{Config, MonitorMode};
use signal_monitor::domain::errors::AppResult;
use signal_monitor::exchange::{EastMoneyClient, HistorySource};
use signal_monitor::http::HttpClient;
use signal_monitor::market_data::JsonHistoryStore;
use signal_monitor::monitor::Monitor;
use signal_monitor::notify::{Dispatcher, LarkWebhook, LogSink, NotificationSink};

use std::sync::Arc;
use tokio::signal::ctrl_c;
use tokio::time::Duration;

#[tokio::main(flavor = "current_thread")]
async fn main() -> AppResult<()> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    config.init_logging()?;

    log::info!("Starting signal_monitor v{}", env!("CARGO_PKG_VERSION"));

    let http = HttpClient::new();

    let quotes = Arc::new(EastMoneyClient::new(
        http.clone(),
        Duration::from_secs(config.data.quote_timeout_secs),
    ));

    let history: Arc<dyn HistorySource> = match &config.data.history_dir {
        Some(dir) => {
            log::info!("Reading daily history from {}", dir);
            Arc::new(JsonHistoryStore::new(dir))
        }
        None => {
            log::info!("Reading daily history from provider klines");
            quotes.clone()
        }
    };

    let advisor = create_advisor(&config, &http);

    let notifier: Arc<dyn NotificationSink> = match &config.notify.webhook_url {
        Some(url) => {
            log::info!("Lark notifications enabled");
            Arc::new(Dispatcher::new(
                LarkWebhook::new(
                    http.clone(),
                    url,
                    Duration::from_secs(config.notify.timeout_secs),
                ),
                &config.notify.prefix,
                config.notify.max_retries,
                Duration::from_secs(config.notify.retry_delay_secs),
            ))
        }
        None => {
            log::warn!("LARK_WEBHOOK_URL not set, notifications are only logged");
            Arc::new(LogSink)
        }
    };

    let mut monitor = Monitor::new(config.monitor.clone(), quotes, history, advisor, notifier);
    match monitor.mode() {
        MonitorMode::Rule => log::info!("Mode: moving-average rule signals"),
        MonitorMode::AiIntraday => log::info!("Mode: AI intraday swing actions"),
    }

    // Run until the loop ends (single tick) or the operator interrupts
    log::info!("Monitor is running. Press Ctrl+C to stop.");
    tokio::select! {
        _ = monitor.run() => {}
        result = ctrl_c() => {
            result?;
            log::info!("Shutting down...");
        }
    }

    log::info!("Shutdown complete. Goodbye!");
    Ok(())
}

/// DeepSeek advisor, only when a credential is configured
fn create_advisor(config: &Config, http: &HttpClient) -> Option<Arc<dyn TextGenerator>> {
    let client = DeepSeekClient::new(http.clone(), &config.advisor);
    if client.has_credential() {
        log::info!("DeepSeek advisor enabled ({})", config.advisor.model);
        Some(Arc::new(client))
    } else {
        if config.monitor.mode == MonitorMode::AiIntraday || config.monitor.ai_corroboration {
            log::warn!("DEEPSEEK_API_KEY not set, AI requests will be reported as failures");
        }
        None
    }
}
