use serde::Serialize;

use crate::interpret::{ExecuteResult, WebhookResponse};

/// Notice text the bridge posts to the room when a delivery's
/// transformation fails. The payload itself is not discarded; retry and
/// dead-lettering are the caller's policy.
pub const TRANSFORMATION_FAILED_NOTICE: &str =
    "Webhook received but failed to process via transformation function";

/// Outcome of a single webhook delivery, as reported back to the HTTP
/// layer that will answer the inbound request.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum WebhookEventResult {
    #[serde(rename_all = "camelCase")]
    Success {
        successful: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        response: Option<WebhookResponse>,
    },
    #[serde(rename_all = "camelCase")]
    Failure {
        successful: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        status_code: Option<u16>,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
}

impl WebhookEventResult {
    /// Success envelope for a completed transformation, carrying the
    /// script-requested HTTP response if there was one.
    pub fn success(result: &ExecuteResult) -> Self {
        Self::Success {
            successful: true,
            response: result.webhook_response.clone(),
        }
    }

    /// Failure envelope for a delivery whose transformation errored.
    pub fn failure(error: impl Into<String>) -> Self {
        Self::Failure {
            successful: false,
            status_code: Some(500),
            error: Some(error.into()),
        }
    }
}
