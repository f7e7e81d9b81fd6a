//! Status Reporter — consumes call-lifecycle webhooks and forwards finished
//! interviews to the applicant-tracking system.
//!
//! Any status string is accepted; no transition validation is done.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use thiserror::Error;
use tracing::{error, info};

use crate::interview::session::SessionStore;
use crate::models::interview::{CompletedInterview, InterviewResult, StatusMessage};
use crate::telephony::CallSid;

pub const COMPLETED: &str = "completed";

/// Statuses after which the provider sends no further webhooks for the call.
const TERMINAL_STATUSES: &[&str] = &[COMPLETED, "busy", "failed", "no-answer", "canceled"];

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("ATS rejected result (status {0})")]
    Rejected(u16),
}

/// Applicant-tracking integration point: accepts a result keyed by call identifier.
#[async_trait]
pub trait ResultSink: Send + Sync {
    async fn submit(&self, completed: &CompletedInterview) -> Result<(), SinkError>;
}

/// Used when no ATS endpoint is configured. Logs and drops the result.
pub struct NoopResultSink;

#[async_trait]
impl ResultSink for NoopResultSink {
    async fn submit(&self, completed: &CompletedInterview) -> Result<(), SinkError> {
        info!(
            "No ATS configured; dropping result for call {}",
            completed.call_sid
        );
        Ok(())
    }
}

/// POSTs the result as JSON to a configured ATS webhook.
pub struct WebhookResultSink {
    client: Client,
    url: String,
}

impl WebhookResultSink {
    pub fn new(client: Client, url: String) -> Self {
        Self { client, url }
    }
}

#[async_trait]
impl ResultSink for WebhookResultSink {
    async fn submit(&self, completed: &CompletedInterview) -> Result<(), SinkError> {
        let response = self.client.post(&self.url).json(completed).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SinkError::Rejected(status.as_u16()));
        }
        info!("Posted interview result for call {}", completed.call_sid);
        Ok(())
    }
}

/// Handles one lifecycle webhook and returns the message echoed to the provider.
pub async fn report_status(
    status: &str,
    call_sid: &CallSid,
    sessions: &dyn SessionStore,
    sink: &dyn ResultSink,
) -> StatusMessage {
    info!("Call {call_sid} status: {status}");

    if TERMINAL_STATUSES.contains(&status) {
        if let Some(session) = sessions.end(call_sid) {
            info!(
                "Session for call {call_sid} closed after {} answered turns ({}s)",
                session.turns.len(),
                (Utc::now() - session.created_at).num_seconds()
            );
        }
    }

    if status != COMPLETED {
        return StatusMessage {
            message: format!("Call status: {status}"),
        };
    }

    let completed = CompletedInterview {
        call_sid: call_sid.clone(),
        result: InterviewResult::placeholder(),
        completed_at: Utc::now(),
    };

    if let Err(e) = sink.submit(&completed).await {
        error!("Failed to forward result for call {call_sid}: {e}");
    }

    StatusMessage {
        message: "Interview completed and results posted".to_string(),
    }
}
