//! Interview sessions — process-local conversation memory keyed by call identifier.
//!
//! Lifecycle: created when the call is originated (with the job/resume
//! context) or on the first webhook turn if missing, deleted when the call
//! reaches a terminal status. Sessions whose terminal status never arrives
//! are swept once older than the store's TTL. Nothing survives a restart.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::models::interview::InterviewContext;
use crate::telephony::CallSid;

/// One answered question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InterviewSession {
    pub context: Option<InterviewContext>,
    pub turns: Vec<Turn>,
    /// The question most recently spoken and not yet answered.
    pub pending_question: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl InterviewSession {
    fn new(context: Option<InterviewContext>) -> Self {
        Self {
            context,
            turns: Vec::new(),
            pending_question: None,
            created_at: Utc::now(),
        }
    }
}

/// Keyed session storage. Implementations must never hold a lock across an `.await`.
pub trait SessionStore: Send + Sync {
    /// Creates (or replaces the context of) the session for a freshly placed call.
    fn start(&self, call_sid: &CallSid, context: InterviewContext);

    /// Records the question just spoken, creating the session if absent.
    fn ask(&self, call_sid: &CallSid, question: &str);

    /// Pairs `answer` with the pending question and returns the number of answered turns.
    /// Returns `None` when no session exists for the call.
    fn answer(&self, call_sid: &CallSid, answer: &str) -> Option<usize>;

    fn get(&self, call_sid: &CallSid) -> Option<InterviewSession>;

    fn end(&self, call_sid: &CallSid) -> Option<InterviewSession>;
}

const DEFAULT_TTL_SECS: i64 = 2 * 60 * 60;

#[derive(Clone)]
pub struct InMemorySessionStore {
    sessions: Arc<Mutex<HashMap<CallSid, InterviewSession>>>,
    ttl: Duration,
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::with_ttl(Duration::seconds(DEFAULT_TTL_SECS))
    }
}

impl InMemorySessionStore {
    #[cfg(test)]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
            ttl,
        }
    }

    /// Drops sessions older than the TTL. Runs on every insert path.
    fn sweep(&self, sessions: &mut HashMap<CallSid, InterviewSession>) {
        let now = Utc::now();
        let before = sessions.len();
        sessions.retain(|_, s| now - s.created_at < self.ttl);
        let swept = before - sessions.len();
        if swept > 0 {
            debug!("Swept {swept} expired interview sessions");
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<CallSid, InterviewSession>> {
        // A panic while holding the lock cannot leave a map entry half-written.
        self.sessions.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.lock().len()
    }
}

impl SessionStore for InMemorySessionStore {
    fn start(&self, call_sid: &CallSid, context: InterviewContext) {
        let mut guard = self.lock();
        self.sweep(&mut guard);
        guard
            .entry(call_sid.clone())
            .and_modify(|s| s.context = Some(context.clone()))
            .or_insert_with(|| InterviewSession::new(Some(context)));
    }

    fn ask(&self, call_sid: &CallSid, question: &str) {
        let mut guard = self.lock();
        self.sweep(&mut guard);
        let session = guard
            .entry(call_sid.clone())
            .or_insert_with(|| InterviewSession::new(None));
        session.pending_question = Some(question.to_string());
    }

    fn answer(&self, call_sid: &CallSid, answer: &str) -> Option<usize> {
        let mut guard = self.lock();
        let session = guard.get_mut(call_sid)?;
        let question = session.pending_question.take().unwrap_or_default();
        session.turns.push(Turn {
            question,
            answer: answer.to_string(),
        });
        Some(session.turns.len())
    }

    fn get(&self, call_sid: &CallSid) -> Option<InterviewSession> {
        self.lock().get(call_sid).cloned()
    }

    fn end(&self, call_sid: &CallSid) -> Option<InterviewSession> {
        self.lock().remove(call_sid)
    }
}
