// src/notify/mod.rs
pub mod lark;

use crate::domain::errors::{NotifyError, NotifyResult};
use crate::http::HttpResponse;
use async_trait::async_trait;
use std::fmt;
use std::time::Duration;

pub use lark::LarkWebhook;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageClass {
    /// A surfaced signal change
    Info,
    /// An adapter or engine failure
    Error,
}

impl fmt::Display for MessageClass {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            MessageClass::Info => write!(f, "info"),
            MessageClass::Error => write!(f, "error"),
        }
    }
}

/// Raw webhook call; judging the response is the dispatcher's job
#[async_trait]
pub trait WebhookTransport: Send + Sync {
    async fn post(&self, text: &str) -> NotifyResult<HttpResponse>;
}

/// Message sink exposed to the monitor
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Returns true once the sink confirmed delivery
    async fn deliver(&self, message: &str, class: MessageClass) -> bool;
}

/// Delivery policy over a webhook transport.
///
/// Error-class messages get up to `max_retries` extra attempts with a fixed
/// delay. Informational messages get one attempt; on failure a single
/// one-shot error-class notice is sent and nothing further is escalated.
pub struct Dispatcher<T: WebhookTransport> {
    transport: T,
    prefix: String,
    max_retries: u32,
    retry_delay: Duration,
}

impl<T: WebhookTransport> Dispatcher<T> {
    pub fn new(transport: T, prefix: &str, max_retries: u32, retry_delay: Duration) -> Self {
        Self {
            transport,
            prefix: prefix.to_string(),
            max_retries,
            retry_delay,
        }
    }

    fn format(&self, message: &str) -> String {
        if self.prefix.is_empty() {
            message.to_string()
        } else {
            format!("{}\n{}", self.prefix, message)
        }
    }

    async fn attempt(&self, text: &str) -> bool {
        let outcome = self
            .transport
            .post(text)
            .await
            .and_then(|response| lark::check_delivery(&response));
        match outcome {
            Ok(()) => true,
            Err(e @ NotifyError::Rejected(_)) => {
                log::warn!("{}", e);
                false
            }
            Err(e) => {
                log::error!("Notification delivery failed: {}", e);
                false
            }
        }
    }

    async fn send(&self, message: &str, attempts: u32) -> bool {
        let text = self.format(message);
        for attempt in 1..=attempts {
            if self.attempt(&text).await {
                return true;
            }
            if attempt < attempts {
                log::info!(
                    "Retrying notification in {}s (attempt {} of {})",
                    self.retry_delay.as_secs(),
                    attempt + 1,
                    attempts
                );
                tokio::time::sleep(self.retry_delay).await;
            }
        }
        false
    }
}

#[async_trait]
impl<T: WebhookTransport> NotificationSink for Dispatcher<T> {
    async fn deliver(&self, message: &str, class: MessageClass) -> bool {
        log::debug!("Delivering {} notification", class);
        match class {
            MessageClass::Error => {
                let delivered = self.send(message, self.max_retries.saturating_add(1)).await;
                if !delivered {
                    log::error!("Error notification undeliverable, giving up without escalation");
                }
                delivered
            }
            MessageClass::Info => {
                if self.send(message, 1).await {
                    return true;
                }
                let notice = format!("delivery failed for: {}", message);
                if !self.send(&notice, 1).await {
                    log::error!("Delivery-failure notice also failed, not retried");
                }
                false
            }
        }
    }
}

/// Sink used when no webhook is configured: messages only reach the log
#[derive(Debug, Default)]
pub struct LogSink;

#[async_trait]
impl NotificationSink for LogSink {
    async fn deliver(&self, message: &str, class: MessageClass) -> bool {
        match class {
            MessageClass::Info => log::info!("{}", message),
            MessageClass::Error => log::error!("{}", message),
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Replays scripted responses and records every posted text
    struct ScriptedTransport {
        outcomes: Mutex<Vec<NotifyResult<HttpResponse>>>,
        posted: Mutex<Vec<String>>,
    }

    impl ScriptedTransport {
        fn new(outcomes: Vec<NotifyResult<HttpResponse>>) -> Self {
            Self {
                outcomes: Mutex::new(outcomes),
                posted: Mutex::new(Vec::new()),
            }
        }

        fn posted(&self) -> Vec<String> {
            self.posted.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl WebhookTransport for ScriptedTransport {
        async fn post(&self, text: &str) -> NotifyResult<HttpResponse> {
            self.posted.lock().unwrap().push(text.to_string());
            let mut outcomes = self.outcomes.lock().unwrap();
            if outcomes.is_empty() {
                return Ok(app_failure());
            }
            outcomes.remove(0)
        }
    }

    fn ok() -> HttpResponse {
        HttpResponse {
            status: 200,
            body: r#"{"StatusCode":0}"#.to_string(),
        }
    }

    fn app_failure() -> HttpResponse {
        HttpResponse {
            status: 200,
            body: r#"{"code":9499,"msg":"Bad Request"}"#.to_string(),
        }
    }

    fn dispatcher(outcomes: Vec<NotifyResult<HttpResponse>>) -> Dispatcher<ScriptedTransport> {
        Dispatcher::new(ScriptedTransport::new(outcomes), "[monitor]", 3, Duration::ZERO)
    }

    #[tokio::test]
    async fn info_delivered_on_first_attempt() {
        let dispatcher = dispatcher(vec![Ok(ok())]);
        assert!(dispatcher.deliver("159218 buy", MessageClass::Info).await);
        assert_eq!(dispatcher.transport.posted(), vec!["[monitor]\n159218 buy"]);
    }

    #[tokio::test]
    async fn error_class_exhausts_retries_without_self_notification() {
        let dispatcher = dispatcher(Vec::new());
        assert!(!dispatcher.deliver("fetch failed", MessageClass::Error).await);

        let posted = dispatcher.transport.posted();
        assert_eq!(posted.len(), 4);
        assert!(posted.iter().all(|p| p == "[monitor]\nfetch failed"));
    }

    #[tokio::test]
    async fn error_class_stops_retrying_after_success() {
        let dispatcher = dispatcher(vec![
            Err(NotifyError::Timeout(3)),
            Ok(app_failure()),
            Ok(ok()),
        ]);
        assert!(dispatcher.deliver("fetch failed", MessageClass::Error).await);
        assert_eq!(dispatcher.transport.posted().len(), 3);
    }

    #[tokio::test]
    async fn unbounded_retry_setting_still_sends() {
        let dispatcher = Dispatcher::new(
            ScriptedTransport::new(vec![Err(NotifyError::Timeout(3)), Ok(ok())]),
            "",
            u32::MAX,
            Duration::ZERO,
        );
        assert!(dispatcher.deliver("fetch failed", MessageClass::Error).await);
        assert_eq!(dispatcher.transport.posted(), vec!["fetch failed", "fetch failed"]);
    }

    #[tokio::test]
    async fn failed_info_sends_one_shot_notice() {
        let dispatcher = dispatcher(Vec::new());
        assert!(!dispatcher.deliver("159840 sell", MessageClass::Info).await);

        let posted = dispatcher.transport.posted();
        assert_eq!(
            posted,
            vec![
                "[monitor]\n159840 sell".to_string(),
                "[monitor]\ndelivery failed for: 159840 sell".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn transport_error_counts_as_failed_attempt() {
        let dispatcher = dispatcher(vec![
            Err(NotifyError::Transport("connection reset".to_string())),
            Ok(ok()),
        ]);
        assert!(!dispatcher.deliver("159840 sell", MessageClass::Info).await);
        assert_eq!(dispatcher.transport.posted().len(), 2);
    }

    #[tokio::test]
    async fn log_sink_always_accepts() {
        assert!(LogSink.deliver("hello", MessageClass::Error).await);
    }
}
