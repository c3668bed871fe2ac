//! REST client for the RunPod serverless API.
//!
//! Wraps the endpoints this backend uses: synchronous workflow execution
//! (`/runsync`, blocking until the job completes or times out) and job
//! status polling, using [`reqwest`].

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Default RunPod API base URL.
const DEFAULT_BASE_URL: &str = "https://api.runpod.ai";

// ---------------------------------------------------------------------------
// Payload and response types
// ---------------------------------------------------------------------------

/// Job envelope submitted to a RunPod endpoint.
///
/// The serverless worker expects the resolved workflow document wrapped as
/// `{ "input": { "workflow": ... } }`.
#[derive(Debug, Serialize)]
pub struct JobPayload {
    input: JobInput,
}

#[derive(Debug, Serialize)]
struct JobInput {
    workflow: Value,
}

impl JobPayload {
    /// Wrap a resolved workflow document in the job envelope.
    pub fn from_workflow(workflow: Value) -> Self {
        Self {
            input: JobInput { workflow },
        }
    }
}

/// Response from a synchronous run.
///
/// The worker reports `status: "success"` and puts the generated image URL
/// in `message`; any other status means the job failed on the worker side.
#[derive(Debug, Deserialize)]
pub struct JobOutcome {
    /// Worker-reported status string.
    pub status: String,
    /// Result payload: the generated image URL on success, or an error
    /// description on failure.
    #[serde(default)]
    pub message: Option<String>,
    /// Server-assigned job id, when present.
    #[serde(default)]
    pub id: Option<String>,
}

impl JobOutcome {
    /// Whether the worker reported success.
    pub fn is_success(&self) -> bool {
        self.status == "success" || self.status == "COMPLETED"
    }
}

/// Errors from the RunPod REST layer.
#[derive(Debug, thiserror::Error)]
pub enum RunPodError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// RunPod returned a non-2xx status code.
    #[error("RunPod API error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The job ran but the worker reported a non-success status.
    #[error("Job failed: {0}")]
    JobFailed(String),

    /// The job did not complete within the allotted time.
    #[error("Job timed out after {0}s")]
    Timeout(u64),
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// HTTP client for a single RunPod serverless endpoint.
pub struct RunPodClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    endpoint_id: String,
}

impl RunPodClient {
    /// Create a client for the given endpoint.
    pub fn new(api_key: impl Into<String>, endpoint_id: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            endpoint_id: endpoint_id.into(),
        }
    }

    /// Override the API base URL (used against a local mock in tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Submit a job and block until it completes or `timeout` elapses.
    ///
    /// Sends `POST /v2/{endpoint_id}/runsync`. A transport-level timeout is
    /// mapped to [`RunPodError::Timeout`]; a completed job with a
    /// non-success worker status is [`RunPodError::JobFailed`].
    pub async fn run_sync(
        &self,
        payload: &JobPayload,
        timeout: Duration,
    ) -> Result<JobOutcome, RunPodError> {
        tracing::info!(
            endpoint = %self.endpoint_id,
            timeout_secs = timeout.as_secs(),
            "Submitting job to RunPod"
        );

        let response = self
            .client
            .post(format!("{}/v2/{}/runsync", self.base_url, self.endpoint_id))
            .bearer_auth(&self.api_key)
            .timeout(timeout)
            .json(payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    RunPodError::Timeout(timeout.as_secs())
                } else {
                    RunPodError::Request(e)
                }
            })?;

        let outcome: JobOutcome = Self::parse_response(response).await?;

        if outcome.is_success() {
            tracing::info!(job_id = ?outcome.id, "RunPod job completed");
            Ok(outcome)
        } else {
            Err(RunPodError::JobFailed(format!(
                "status '{}': {}",
                outcome.status,
                outcome.message.as_deref().unwrap_or("<no message>")
            )))
        }
    }

    /// Poll the status of a previously submitted job.
    ///
    /// Sends `GET /v2/{endpoint_id}/status/{job_id}`.
    pub async fn status(&self, job_id: &str) -> Result<JobOutcome, RunPodError> {
        let response = self
            .client
            .get(format!(
                "{}/v2/{}/status/{}",
                self.base_url, self.endpoint_id, job_id
            ))
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    // ---- private helpers ----

    /// Ensure a success status code, then parse the JSON body.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, RunPodError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(RunPodError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json::<T>().await?)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn payload_wraps_workflow_in_input_envelope() {
        let workflow = json!({ "3": { "inputs": { "steps": 30 } } });
        let payload = JobPayload::from_workflow(workflow.clone());
        let serialized = serde_json::to_value(&payload).unwrap();
        assert_eq!(serialized, json!({ "input": { "workflow": workflow } }));
    }

    #[test]
    fn success_outcome_is_recognized() {
        let outcome: JobOutcome = serde_json::from_value(json!({
            "status": "success",
            "message": "https://example.com/out.png"
        }))
        .unwrap();
        assert!(outcome.is_success());
        assert_eq!(outcome.message.as_deref(), Some("https://example.com/out.png"));
    }

    #[test]
    fn completed_status_is_also_success() {
        let outcome: JobOutcome =
            serde_json::from_value(json!({ "status": "COMPLETED", "id": "abc" })).unwrap();
        assert!(outcome.is_success());
    }

    #[test]
    fn failed_outcome_is_not_success() {
        let outcome: JobOutcome = serde_json::from_value(json!({
            "status": "FAILED",
            "message": "CUDA out of memory"
        }))
        .unwrap();
        assert!(!outcome.is_success());
    }

    #[test]
    fn outcome_without_message_deserializes() {
        let outcome: JobOutcome = serde_json::from_value(json!({ "status": "IN_QUEUE" })).unwrap();
        assert!(outcome.message.is_none());
        assert!(!outcome.is_success());
    }
}
