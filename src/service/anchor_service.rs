// service/anchor_service.rs
//
// Completion anchoring. After a job closes we tell an external receipt
// service about it. The close is already committed by then, so anchoring is
// strictly best-effort: failures are logged and absorbed, never surfaced to
// the caller's phone.
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

#[async_trait]
pub trait AnchorNotifier: Send + Sync {
    /// Returns whether the external service acknowledged the completion.
    async fn job_completed(&self, request_id: i64, provider_phone: &str) -> bool;
}

/// Used when no anchor endpoint is configured.
#[derive(Debug, Default, Clone)]
pub struct NoopAnchor;

#[async_trait]
impl AnchorNotifier for NoopAnchor {
    async fn job_completed(&self, request_id: i64, _provider_phone: &str) -> bool {
        tracing::debug!("anchoring disabled; request {} not anchored", request_id);
        false
    }
}

pub struct HttpAnchor {
    client: reqwest::Client,
    base_url: String,
}

impl HttpAnchor {
    pub fn new(base_url: impl Into<String>) -> Self {
        // The caller is a live USSD session; a slow anchor must not stall it.
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(2))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl AnchorNotifier for HttpAnchor {
    async fn job_completed(&self, request_id: i64, provider_phone: &str) -> bool {
        let payload = json!({
            "kind": "job_completed",
            "internal_id": format!("req_{}", request_id),
            "provider_phone": provider_phone,
            "source": "villagelink-ussd",
        });

        let url = format!("{}/transition", self.base_url.trim_end_matches('/'));
        match self.client.post(&url).json(&payload).send().await {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                tracing::warn!(
                    "anchor rejected completion of request {}: {}",
                    request_id,
                    response.status()
                );
                false
            }
            Err(e) => {
                tracing::warn!("anchor unreachable for request {}: {}", request_id, e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn noop_anchor_never_acknowledges() {
        let anchor = NoopAnchor;
        assert!(!anchor.job_completed(1, "+254700000001").await);
    }
}
