// tests/notification_dispatch.rs
use async_trait::async_trait;
use signal_monitor::domain::errors::NotifyResult;
use signal_monitor::http::HttpResponse;
use signal_monitor::notify::{Dispatcher, MessageClass, NotificationSink, WebhookTransport};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Webhook that answers HTTP 200 with an application-level failure code
struct RejectingWebhook {
    posted: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl WebhookTransport for RejectingWebhook {
    async fn post(&self, text: &str) -> NotifyResult<HttpResponse> {
        self.posted.lock().unwrap().push(text.to_string());
        Ok(HttpResponse {
            status: 200,
            body: r#"{"code":19001,"msg":"param invalid: incoming webhook access token invalid"}"#
                .to_string(),
        })
    }
}

fn dispatcher(max_retries: u32) -> (Dispatcher<RejectingWebhook>, Arc<Mutex<Vec<String>>>) {
    let posted = Arc::new(Mutex::new(Vec::new()));
    let webhook = RejectingWebhook {
        posted: posted.clone(),
    };
    (
        Dispatcher::new(webhook, "", max_retries, Duration::ZERO),
        posted,
    )
}

#[tokio::test]
async fn error_messages_exhaust_retries_then_stop() {
    let (dispatcher, posted) = dispatcher(2);

    assert!(!dispatcher.deliver("159218 signal fetch failed", MessageClass::Error).await);

    let posted = posted.lock().unwrap();
    assert_eq!(posted.len(), 3);
    assert!(posted.iter().all(|p| p == "159218 signal fetch failed"));
}

#[tokio::test]
async fn info_messages_are_not_retried() {
    let (dispatcher, posted) = dispatcher(5);

    assert!(!dispatcher.deliver("159218 sell", MessageClass::Info).await);

    let posted = posted.lock().unwrap();
    assert_eq!(
        *posted,
        vec![
            "159218 sell".to_string(),
            "delivery failed for: 159218 sell".to_string(),
        ]
    );
}
