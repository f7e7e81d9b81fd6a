//! Interview Dialogue Controller — builds the TwiML for every conversational turn.
//!
//! Per-call flow (never materialized as a stored state):
//!   Connected → Greeting → { AwaitingSpeech ⇄ Responding } → Ended
//!
//! The loop ends when the model signals completion, when the answered-turn
//! limit is reached, when the model call fails (apology + hangup), or when the
//! provider hangs up on its own.

use tracing::{info, warn};

use crate::interview::prompts::{
    CANDIDATE_RESPONSE_TEMPLATE, COMPLETION_MARKER, INTERVIEWER_SYSTEM, INTERVIEW_CONTEXT_TEMPLATE,
};
use crate::interview::session::{InterviewSession, SessionStore};
use crate::llm_client::{ChatMessage, ChatModel};
use crate::telephony::twiml::{Gather, VoiceResponse};
use crate::telephony::CallSid;

pub const PROCESS_RESPONSE_PATH: &str = "/process-response";

pub const GREETING: &str = "Hello! I'm an AI interviewer. This call will be recorded for evaluation purposes. \
    I'll be asking you several questions about your experience and skills. \
    Please speak naturally and take your time with your responses.";

pub const FIRST_QUESTION: &str =
    "Let's begin. Could you tell me about your relevant experience for this position?";

pub const APOLOGY: &str = "I apologize, but I'm having trouble processing your response. \
    Let me transfer you to a human recruiter.";

pub const CLOSING: &str = "Thank you for your time. That concludes our interview. \
    A recruiter will be in touch with you about next steps. Goodbye!";

pub const DID_NOT_HEAR: &str = "Sorry, I didn't catch that.";

const REPROMPT_FALLBACK: &str = "Could you please repeat your answer?";

/// Inputs of one subsequent turn, as posted by the provider.
#[derive(Debug, Clone, Default)]
pub struct TurnInput {
    pub call_sid: Option<CallSid>,
    pub transcript: Option<String>,
}

/// Greeting turn: disclosure, then exactly one speech gather with the first question.
pub fn greeting_turn(call_sid: Option<&CallSid>, sessions: &dyn SessionStore) -> VoiceResponse {
    if let Some(sid) = call_sid {
        sessions.ask(sid, FIRST_QUESTION);
        info!("Interview call {sid} connected");
    }

    VoiceResponse::new()
        .say(GREETING)
        .gather(Gather::speech(PROCESS_RESPONSE_PATH).say(FIRST_QUESTION))
}

/// Subsequent turn: hand the transcript to the model and speak back its next question.
pub async fn response_turn(
    input: TurnInput,
    llm: &dyn ChatModel,
    sessions: &dyn SessionStore,
    max_turns: usize,
) -> VoiceResponse {
    let session = input.call_sid.as_ref().and_then(|sid| sessions.get(sid));

    let transcript = match input.transcript.as_deref().map(str::trim) {
        Some(t) if !t.is_empty() => t.to_string(),
        _ => {
            warn!(
                "No speech transcript for call {}",
                input.call_sid.as_ref().map(CallSid::as_str).unwrap_or("<unknown>")
            );
            let pending = session
                .as_ref()
                .and_then(|s| s.pending_question.clone())
                .unwrap_or_else(|| REPROMPT_FALLBACK.to_string());
            return VoiceResponse::new()
                .say(DID_NOT_HEAR)
                .gather(Gather::speech(PROCESS_RESPONSE_PATH).say(pending));
        }
    };

    let messages = build_turn_messages(session.as_ref(), &transcript);

    let answered = input
        .call_sid
        .as_ref()
        .and_then(|sid| sessions.answer(sid, &transcript));

    // 0 disables the limit.
    if let Some(count) = answered {
        if max_turns > 0 && count >= max_turns {
            info!("Interview reached {count} answered turns, closing");
            return VoiceResponse::new().say(CLOSING).hangup();
        }
    }

    match llm.complete(&messages).await {
        Ok(reply) if reply.contains(COMPLETION_MARKER) => {
            info!("Model signalled interview completion");
            VoiceResponse::new().say(CLOSING).hangup()
        }
        Ok(next_question) => {
            let next_question = next_question.trim().to_string();
            if let Some(sid) = &input.call_sid {
                sessions.ask(sid, &next_question);
            }
            VoiceResponse::new().gather(Gather::speech(PROCESS_RESPONSE_PATH).say(next_question))
        }
        Err(e) => {
            warn!("Dialogue turn failed, ending call: {e}");
            VoiceResponse::new().say(APOLOGY).hangup()
        }
    }
}

/// System instruction, optional role context, prior turns, then the latest transcript.
fn build_turn_messages(session: Option<&InterviewSession>, transcript: &str) -> Vec<ChatMessage> {
    let mut messages = vec![ChatMessage::system(INTERVIEWER_SYSTEM)];

    if let Some(session) = session {
        if let Some(context) = &session.context {
            messages.push(ChatMessage::system(
                INTERVIEW_CONTEXT_TEMPLATE
                    .replace("{job_description}", &context.job_description)
                    .replace("{resume}", &context.resume)
                    .replace("{analysis}", &context.analysis.analysis),
            ));
        }
        for turn in &session.turns {
            if !turn.question.is_empty() {
                messages.push(ChatMessage::assistant(turn.question.clone()));
            }
            messages.push(ChatMessage::user(
                CANDIDATE_RESPONSE_TEMPLATE.replace("{transcript}", &turn.answer),
            ));
        }
        if let Some(question) = &session.pending_question {
            messages.push(ChatMessage::assistant(question.clone()));
        }
    }

    messages.push(ChatMessage::user(
        CANDIDATE_RESPONSE_TEMPLATE.replace("{transcript}", transcript),
    ));
    messages
}
