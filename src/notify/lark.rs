// src/notify/lark.rs
use crate::domain::errors::{NotifyError, NotifyResult};
use crate::http::{HttpClient, HttpError, HttpResponse};
use crate::notify::WebhookTransport;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

#[derive(Debug, Serialize)]
struct TextContent<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct TextMessage<'a> {
    msg_type: &'static str,
    content: TextContent<'a>,
}

/// JSON body for a plain-text bot message
pub fn text_payload(text: &str) -> NotifyResult<String> {
    serde_json::to_string(&TextMessage {
        msg_type: "text",
        content: TextContent { text },
    })
    .map_err(|e| NotifyError::Transport(format!("failed to encode payload: {}", e)))
}

/// Delivered only on HTTP 200 plus an application code of 0.
///
/// Older bot endpoints report `StatusCode`, newer ones `code`.
pub fn is_accepted(response: &HttpResponse) -> bool {
    if response.status != 200 {
        return false;
    }
    let body: Value = match serde_json::from_str(&response.body) {
        Ok(body) => body,
        Err(_) => return false,
    };
    body.get("StatusCode")
        .or_else(|| body.get("code"))
        .and_then(Value::as_i64)
        == Some(0)
}

/// `Rejected` unless the response is accepted
pub fn check_delivery(response: &HttpResponse) -> NotifyResult<()> {
    if is_accepted(response) {
        Ok(())
    } else {
        Err(NotifyError::Rejected(format!(
            "status {}: {}",
            response.status, response.body
        )))
    }
}

/// Lark/Feishu custom-bot webhook
pub struct LarkWebhook {
    http: HttpClient,
    url: String,
    timeout: Duration,
}

impl LarkWebhook {
    pub fn new(http: HttpClient, url: &str, timeout: Duration) -> Self {
        Self {
            http,
            url: url.to_string(),
            timeout,
        }
    }
}

#[async_trait]
impl WebhookTransport for LarkWebhook {
    async fn post(&self, text: &str) -> NotifyResult<HttpResponse> {
        let payload = text_payload(text)?;
        self.http
            .post_json(&self.url, &[], payload, self.timeout)
            .await
            .map_err(|e| match e {
                HttpError::Timeout(secs) => NotifyError::Timeout(secs),
                other => NotifyError::Transport(other.to_string()),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            body: body.to_string(),
        }
    }

    #[test]
    fn payload_wraps_text_message() {
        let payload = text_payload("hello").unwrap();
        let value: Value = serde_json::from_str(&payload).unwrap();
        assert_eq!(value["msg_type"], "text");
        assert_eq!(value["content"]["text"], "hello");
    }

    #[test]
    fn acceptance_needs_status_and_app_code() {
        assert!(is_accepted(&response(200, r#"{"StatusCode":0,"StatusMessage":"success"}"#)));
        assert!(is_accepted(&response(200, r#"{"code":0,"msg":"success"}"#)));
        assert!(!is_accepted(&response(200, r#"{"code":19021,"msg":"sign match fail"}"#)));
        assert!(!is_accepted(&response(500, r#"{"code":0}"#)));
        assert!(!is_accepted(&response(200, "<html>gateway</html>")));
    }

    #[test]
    fn rejection_carries_status_and_body() {
        let err = check_delivery(&response(200, r#"{"code":9499}"#)).unwrap_err();
        assert_eq!(
            err.to_string(),
            r#"Sink rejected message: status 200: {"code":9499}"#
        );
    }
}
