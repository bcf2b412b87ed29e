//! HTTP planner service client implementation

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

use crate::dispatch::TierOutcome;

use super::{PlanReply, PlanRequest, PlannerError, PlannerService};

/// Client for the network-reachable planner service.
///
/// Issues exactly one `POST /plan` per call. The per-call timeout is chosen
/// by the dispatcher (configured request timeout clipped to the remaining
/// budget); there are no retries at this layer.
pub struct HttpPlannerClient {
    base_url: String,
    http: Client,
}

impl HttpPlannerClient {
    /// Create a client for the given service base URL
    pub fn new(base_url: impl Into<String>) -> Result<Self, PlannerError> {
        let base_url = base_url.into();
        debug!(%base_url, "HttpPlannerClient::new: called");

        let http = Client::builder().build().map_err(PlannerError::Unreachable)?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    async fn post_plan(&self, req: &PlanRequest, timeout: Duration) -> Result<String, PlannerError> {
        let url = format!("{}/plan", self.base_url);
        debug!(%url, ?timeout, "post_plan: sending request");

        let response = self
            .http
            .post(&url)
            .timeout(timeout)
            .json(req)
            .send()
            .await
            .map_err(PlannerError::from_transport)?;

        let status = response.status();
        if !status.is_success() {
            debug!(status = status.as_u16(), "post_plan: non-success status");
            return Err(PlannerError::Http {
                status: status.as_u16(),
            });
        }

        let reply: PlanReply = response.json().await.map_err(|e| {
            debug!(error = %e, "post_plan: body did not parse");
            PlannerError::InvalidReply
        })?;

        // Success requires non-empty content, not merely a 2xx status.
        match reply.markdown {
            Some(md) if !md.trim().is_empty() => Ok(md),
            _ => {
                debug!("post_plan: success status but empty payload");
                Err(PlannerError::EmptyReply)
            }
        }
    }
}

#[async_trait]
impl PlannerService for HttpPlannerClient {
    async fn call(&self, req: &PlanRequest, timeout: Duration) -> TierOutcome {
        debug!(query_len = req.query.len(), ?timeout, "HttpPlannerClient::call: called");
        match self.post_plan(req, timeout).await {
            Ok(markdown) => {
                debug!(markdown_len = markdown.len(), "HttpPlannerClient::call: success");
                TierOutcome::Success(markdown)
            }
            Err(e) => {
                debug!(error = %e, "HttpPlannerClient::call: soft failure");
                TierOutcome::SoftFailure(e.reason())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let client = HttpPlannerClient::new("http://127.0.0.1:8000/").unwrap();

        assert_eq!(client.base_url, "http://127.0.0.1:8000");
    }

    #[tokio::test]
    async fn test_unreachable_service_is_soft_failure() {
        // Port 9 (discard) is never serving HTTP in the test environment
        let client = HttpPlannerClient::new("http://127.0.0.1:9").unwrap();
        let req = PlanRequest::new("goa, 3 days");

        let outcome = client.call(&req, Duration::from_millis(500)).await;

        assert!(matches!(outcome, TierOutcome::SoftFailure(_)));
    }
}
