//! Axum route handlers for the interview API and the telephony webhooks.

use axum::{
    extract::{Query, State},
    http::HeaderMap,
    Form, Json,
};
use serde::Deserialize;
use tracing::info;

use crate::errors::AppError;
use crate::interview::analyzer::analyze_match;
use crate::interview::dialogue::{greeting_turn, response_turn, TurnInput};
use crate::interview::initiator::initiate_call;
use crate::interview::status::report_status;
use crate::models::interview::{
    InitiateInterviewResponse, InterviewContext, InterviewRequest, StatusMessage,
};
use crate::state::AppState;
use crate::telephony::twiml::VoiceResponse;
use crate::telephony::CallSid;

const IDEMPOTENCY_HEADER: &str = "idempotency-key";

// ────────────────────────────────────────────────────────────────────────────
// Webhook payloads
//
// Accepted form-encoded (as Twilio posts them) or as query parameters, under
// the provider's names or snake_case aliases. Form values win field by field.
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct CallWebhook {
    #[serde(rename = "CallSid", alias = "call_sid", default)]
    pub call_sid: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SpeechWebhook {
    #[serde(rename = "SpeechResult", alias = "speech_result", default)]
    pub speech_result: Option<String>,
    #[serde(rename = "CallSid", alias = "call_sid", default)]
    pub call_sid: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct StatusWebhook {
    #[serde(rename = "CallStatus", alias = "status", default)]
    pub status: Option<String>,
    #[serde(rename = "CallSid", alias = "call_sid", default)]
    pub call_sid: Option<String>,
}

/// First non-blank of the two values.
fn pick(form: Option<String>, query: Option<String>) -> Option<String> {
    form.into_iter()
        .chain(query)
        .find(|v| !v.trim().is_empty())
}

fn unwrap_query<T: Default>(query: Option<Query<T>>) -> T {
    query.map(|Query(q)| q).unwrap_or_default()
}

fn unwrap_form<T: Default>(form: Option<Form<T>>) -> T {
    form.map(|Form(f)| f).unwrap_or_default()
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /initiate-interview
///
/// Analyzes the job/resume match, then places the outbound call.
/// With an `Idempotency-Key` header, requests sharing the key place at most one
/// call: concurrent duplicates wait for the first and return its id.
pub async fn handle_initiate_interview(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<InterviewRequest>,
) -> Result<Json<InitiateInterviewResponse>, AppError> {
    request.validate()?;

    let idempotency_key = headers
        .get(IDEMPOTENCY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|k| !k.is_empty());

    let call_sid = match idempotency_key {
        Some(key) => {
            state
                .idempotency
                .place_once(key, || place_interview_call(&state, &request))
                .await?
        }
        None => place_interview_call(&state, &request).await?,
    };

    Ok(Json(InitiateInterviewResponse {
        message: "Interview call initiated".to_string(),
        call_sid,
    }))
}

/// Match analysis, origination, then session creation. Analysis is discarded on failure.
async fn place_interview_call(
    state: &AppState,
    request: &InterviewRequest,
) -> Result<CallSid, AppError> {
    let analysis =
        analyze_match(&request.job_description, &request.resume, state.llm.as_ref()).await?;

    let call_sid =
        initiate_call(&request.phone_number, &state.config, state.telephony.as_ref()).await?;

    state.sessions.start(
        &call_sid,
        InterviewContext {
            job_description: request.job_description.clone(),
            resume: request.resume.clone(),
            analysis,
        },
    );

    info!("Interview session opened for call {call_sid}");
    Ok(call_sid)
}

/// POST /handle-interview-call
///
/// First webhook after the callee answers. No input is required.
pub async fn handle_interview_call(
    State(state): State<AppState>,
    query: Option<Query<CallWebhook>>,
    form: Option<Form<CallWebhook>>,
) -> VoiceResponse {
    let call_sid = pick(unwrap_form(form).call_sid, unwrap_query(query).call_sid).map(CallSid);
    greeting_turn(call_sid.as_ref(), state.sessions.as_ref())
}

/// POST /process-response
///
/// Always answers with markup; provider failures end the call instead of erroring.
pub async fn handle_process_response(
    State(state): State<AppState>,
    query: Option<Query<SpeechWebhook>>,
    form: Option<Form<SpeechWebhook>>,
) -> VoiceResponse {
    let form = unwrap_form(form);
    let query = unwrap_query(query);
    let input = TurnInput {
        call_sid: pick(form.call_sid, query.call_sid).map(CallSid),
        transcript: pick(form.speech_result, query.speech_result),
    };

    response_turn(
        input,
        state.llm.as_ref(),
        state.sessions.as_ref(),
        state.config.max_interview_turns,
    )
    .await
}

/// POST /call-status
pub async fn handle_call_status(
    State(state): State<AppState>,
    query: Option<Query<StatusWebhook>>,
    form: Option<Form<StatusWebhook>>,
) -> Result<Json<StatusMessage>, AppError> {
    let form = unwrap_form(form);
    let query = unwrap_query(query);

    let status = pick(form.status, query.status)
        .ok_or_else(|| AppError::Validation("status is required".to_string()))?;
    let call_sid = pick(form.call_sid, query.call_sid)
        .map(CallSid)
        .ok_or_else(|| AppError::Validation("call_sid is required".to_string()))?;

    Ok(Json(
        report_status(
            &status,
            &call_sid,
            state.sessions.as_ref(),
            state.result_sink.as_ref(),
        )
        .await,
    ))
}
