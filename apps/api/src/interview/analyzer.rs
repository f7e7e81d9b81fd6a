//! Match Analyzer — asks the model how well a resume fits a job description.

use tracing::info;

use crate::errors::AppError;
use crate::interview::prompts::{MATCH_ANALYSIS_PROMPT_TEMPLATE, MATCH_ANALYSIS_SYSTEM};
use crate::llm_client::{ChatMessage, ChatModel};
use crate::models::interview::AnalysisResult;

/// Issues one chat call and wraps the raw model text. Never cached or retried.
pub async fn analyze_match(
    job_description: &str,
    resume: &str,
    llm: &dyn ChatModel,
) -> Result<AnalysisResult, AppError> {
    let prompt = MATCH_ANALYSIS_PROMPT_TEMPLATE
        .replace("{job_description}", job_description)
        .replace("{resume}", resume);

    let messages = [
        ChatMessage::system(MATCH_ANALYSIS_SYSTEM),
        ChatMessage::user(prompt),
    ];

    let analysis = llm
        .complete(&messages)
        .await
        .map_err(|e| AppError::Llm(format!("Error analyzing job-resume match: {e}")))?;

    info!("Job/resume match analysis complete ({} chars)", analysis.len());
    Ok(AnalysisResult { analysis })
}
