use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::telephony::CallSid;

/// Request body for `POST /initiate-interview`.
#[derive(Debug, Clone, Deserialize)]
pub struct InterviewRequest {
    pub job_description: String,
    pub resume: String,
    pub phone_number: String,
}

impl InterviewRequest {
    /// Rejects blank fields before any provider is called.
    pub fn validate(&self) -> Result<(), AppError> {
        for (field, value) in [
            ("job_description", &self.job_description),
            ("resume", &self.resume),
            ("phone_number", &self.phone_number),
        ] {
            if value.trim().is_empty() {
                return Err(AppError::Validation(format!("{field} cannot be empty")));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitiateInterviewResponse {
    pub message: String,
    pub call_sid: CallSid,
}

/// Opaque model output from the job/resume match analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub analysis: String,
}

/// What the interviewer knows about the role and candidate for one call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterviewContext {
    pub job_description: String,
    pub resume: String,
    pub analysis: AnalysisResult,
}

/// Outcome reported to the applicant-tracking system when a call completes.
/// No scoring exists yet, so every field carries a placeholder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterviewResult {
    pub candidate_score: f64,
    pub interview_summary: String,
    pub recommended_action: String,
}

impl InterviewResult {
    pub fn placeholder() -> Self {
        Self {
            candidate_score: 0.0,
            interview_summary: String::new(),
            recommended_action: String::new(),
        }
    }
}

/// Payload forwarded to the applicant-tracking system, keyed by call identifier.
#[derive(Debug, Clone, Serialize)]
pub struct CompletedInterview {
    pub call_sid: CallSid,
    pub result: InterviewResult,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusMessage {
    pub message: String,
}
